use anyhow::Result;
use clap::{Parser, Subcommand};
use huffpack::cli;
use huffpack::{Codec, CodecConfig, TableFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "huffpack", version, about = "Huffman text compressor")]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[clap(long, default_value = "info")]
    log_level: String,

    /// Persist code tables as bincode instead of JSON
    #[clap(long)]
    binary_table: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a text file into Compressed/, Trees/ and JSON/ under the output directory
    Compress {
        #[clap(value_parser)]
        input: PathBuf,
        #[clap(long, value_parser, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Decompress a payload with its code table
    Decompress {
        #[clap(value_parser)]
        payload: PathBuf,
        #[clap(value_parser)]
        table: PathBuf,
        /// Output file; defaults to Decompressed/decompressed_<stem>.txt under --out-dir
        #[clap(long, value_parser)]
        output: Option<PathBuf>,
        #[clap(long, value_parser, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Compress, decompress and compare
    Roundtrip {
        #[clap(value_parser)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let codec = Codec::new(CodecConfig {
        table_format: if cli.binary_table {
            TableFormat::Bincode
        } else {
            TableFormat::Json
        },
        ..CodecConfig::default()
    });

    match cli.command {
        Command::Compress { input, out_dir } => {
            let output = cli::compress_file(&codec, &input, &out_dir)?;
            cli::report(&output.stats);
        }
        Command::Decompress {
            payload,
            table,
            output,
            out_dir,
        } => {
            cli::decompress_file(&codec, &payload, &table, output, &out_dir)?;
        }
        Command::Roundtrip { input } => {
            let stats = cli::roundtrip_file(&codec, &input)?;
            cli::report(&stats);
        }
    }
    Ok(())
}
