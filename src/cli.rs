//! File-level commands behind the `huffpack` binary.
//!
//! `compress` lays its output out the way the decompressor expects to find it:
//! `<out>/Compressed/<stem>.bin`, `<out>/Trees/<stem>.tree` and `<out>/JSON/<stem>.json`.
//! Without an explicit output path `decompress` writes
//! `<out>/Decompressed/decompressed_<stem>.txt`.

use crate::{Codec, CompressionStats, PackedPayload};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const COMPRESSED_DIR: &str = "Compressed";
pub const TREES_DIR: &str = "Trees";
pub const JSON_DIR: &str = "JSON";
pub const DECOMPRESSED_DIR: &str = "Decompressed";

/// Files written by [`compress_file`].
#[derive(Debug, Clone)]
pub struct CompressOutput {
    pub payload: PathBuf,
    pub table: PathBuf,
    pub json: PathBuf,
    pub stats: CompressionStats,
}

fn read_input(path: &Path) -> Result<String> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if text.is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(text)
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

fn create_dir(dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

pub fn compress_file(codec: &Codec, input: &Path, out_dir: &Path) -> Result<CompressOutput> {
    let text = read_input(input)?;
    let stem = file_stem(input)?;

    let compressed_dir = create_dir(out_dir.join(COMPRESSED_DIR))?;
    let trees_dir = create_dir(out_dir.join(TREES_DIR))?;
    let json_dir = create_dir(out_dir.join(JSON_DIR))?;

    let compressed = codec.compress(&text)?;
    let payload = compressed_dir.join(format!("{}.bin", stem));
    let table = trees_dir.join(format!("{}.tree", stem));
    let json = json_dir.join(format!("{}.json", stem));

    fs::write(&payload, compressed.payload.to_bytes())
        .with_context(|| format!("writing {}", payload.display()))?;
    fs::write(&table, codec.serialize_table(&compressed.table)?)
        .with_context(|| format!("writing {}", table.display()))?;
    fs::write(&json, compressed.table.to_json_pretty()?)
        .with_context(|| format!("writing {}", json.display()))?;

    info!(payload = %payload.display(), table = %table.display(), "wrote output");
    Ok(CompressOutput {
        payload,
        table,
        json,
        stats: compressed.stats,
    })
}

/// Decode `payload_path` with `table_path`; returns the path written.
pub fn decompress_file(
    codec: &Codec,
    payload_path: &Path,
    table_path: &Path,
    output: Option<PathBuf>,
    out_dir: &Path,
) -> Result<PathBuf> {
    let payload = fs::read(payload_path)
        .with_context(|| format!("reading {}", payload_path.display()))?;
    let payload = PackedPayload::from_bytes(&payload)
        .with_context(|| format!("parsing {}", payload_path.display()))?;
    let table = fs::read(table_path).with_context(|| format!("reading {}", table_path.display()))?;
    let table = codec
        .deserialize_table(&table)
        .with_context(|| format!("parsing {}", table_path.display()))?;

    let text = codec.decompress(&payload, &table)?;

    let output = match output {
        Some(path) => path,
        None => create_dir(out_dir.join(DECOMPRESSED_DIR))?
            .join(format!("decompressed_{}.txt", file_stem(payload_path)?)),
    };
    fs::write(&output, &text).with_context(|| format!("writing {}", output.display()))?;
    info!(output = %output.display(), symbols = payload.symbol_count, "decompressed");
    Ok(output)
}

/// Compress and decompress in memory, failing unless the text comes back unchanged.
pub fn roundtrip_file(codec: &Codec, input: &Path) -> Result<CompressionStats> {
    let text = read_input(input)?;
    let compressed = codec.compress(&text)?;
    let decoded = codec.decompress(&compressed.payload, &compressed.table)?;
    verify_match(&text, &decoded, input)?;
    info!("round trip succeeded");
    Ok(compressed.stats)
}

fn verify_match(original: &str, decoded: &str, input: &Path) -> Result<()> {
    if decoded != original {
        bail!("decompressed text does not match {}", input.display());
    }
    Ok(())
}

pub fn report(stats: &CompressionStats) {
    info!(
        original_bytes = stats.original_size,
        compressed_bytes = stats.compressed_size,
        table_bytes = stats.table_size,
        saved_bytes = stats.space_saved(),
        "compression ratio {:.2}%",
        stats.saving_percent()
    );
}
