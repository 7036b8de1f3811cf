//! huffpack: Huffman entropy coder.
//!
//! Pipeline, leaf to root:
//! - [`frequency`] counts symbol occurrences
//! - [`tree`] merges the two lightest nodes until one root remains
//! - [`code_table`] walks the tree into a flat prefix-code table
//! - [`bitpack`] packs text into an MSB-first bitstream and back
//! - [`container`] lays out the payload header and the table+payload archive
//!
//! Decoding needs only the code table and the payload; the tree is dropped once the
//! table has been derived.

pub mod bitpack;
pub mod cli;
pub mod code_table;
pub mod config;
pub mod container;
pub mod error;
pub mod frequency;
pub mod tree;

pub use crate::code_table::{Code, CodeTable};
pub use crate::config::{CodecConfig, TableFormat};
pub use crate::container::{Archive, PackedPayload};
pub use crate::error::CodecError;
pub use crate::frequency::FrequencyTable;

use tracing::{debug, info};

/// Output of [`Codec::compress`]: the decode key, the payload and run statistics.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub table: CodeTable,
    pub payload: PackedPayload,
    pub stats: CompressionStats,
}

impl Compressed {
    pub fn into_archive(self) -> Archive {
        Archive {
            table: self.table,
            payload: self.payload,
        }
    }
}

/// Compression statistics
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompressionStats {
    pub symbol_count: usize,
    pub distinct_symbols: usize,
    /// UTF-8 size of the input.
    pub original_size: usize,
    /// Serialized payload size, header included.
    pub compressed_size: usize,
    /// Serialized code table size in the configured format.
    pub table_size: usize,
    pub ratio: f64,
    pub entropy_bits: f64,
    pub avg_code_len: f64,
}

impl CompressionStats {
    /// Bytes saved by the payload alone; negative when it grew.
    pub fn space_saved(&self) -> i64 {
        self.original_size as i64 - self.compressed_size as i64
    }

    /// Saving as a percentage of the original size.
    pub fn saving_percent(&self) -> f64 {
        (1.0 - self.ratio) * 100.0
    }
}

/// The main codec engine
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Create a new codec with the given configuration
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Count, build the tree, derive the table and pack `text`.
    pub fn compress(&self, text: &str) -> Result<Compressed, CodecError> {
        if text.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        // symbol and bit counts past u32::MAX are rejected by the packer
        let max = self.config.max_input_size;
        if text.len() > max {
            return Err(CodecError::InputTooLarge {
                len: text.len(),
                max,
            });
        }

        let freq = FrequencyTable::count(text);
        let table = CodeTable::build(&freq)?;
        let payload = bitpack::pack(text, &table)?;

        if self.config.verify_roundtrip {
            let decoded = bitpack::unpack_payload(&payload, &table)?;
            if decoded != text {
                return Err(CodecError::MalformedStream(
                    "round-trip verification failed".into(),
                ));
            }
            debug!("round-trip verified");
        }

        let table_size = self.serialize_table(&table)?.len();
        let stats = Self::stats(text, &freq, &payload, table_size);
        info!(
            symbols = stats.symbol_count,
            distinct = stats.distinct_symbols,
            original = stats.original_size,
            compressed = stats.compressed_size,
            ratio = stats.ratio,
            "compressed text"
        );

        Ok(Compressed {
            table,
            payload,
            stats,
        })
    }

    /// Decode a payload with its code table.
    pub fn decompress(
        &self,
        payload: &PackedPayload,
        table: &CodeTable,
    ) -> Result<String, CodecError> {
        bitpack::unpack_payload(payload, table)
    }

    pub fn serialize_table(&self, table: &CodeTable) -> Result<Vec<u8>, CodecError> {
        table.serialize(self.config.table_format)
    }

    pub fn deserialize_table(&self, bytes: &[u8]) -> Result<CodeTable, CodecError> {
        CodeTable::deserialize(bytes, self.config.table_format)
    }

    fn stats(
        text: &str,
        freq: &FrequencyTable,
        payload: &PackedPayload,
        table_size: usize,
    ) -> CompressionStats {
        let original_size = text.len();
        let compressed_size = payload.encoded_len();
        let symbol_count = payload.symbol_count as usize;
        CompressionStats {
            symbol_count,
            distinct_symbols: freq.len(),
            original_size,
            compressed_size,
            table_size,
            ratio: compressed_size as f64 / original_size as f64,
            entropy_bits: freq.entropy(),
            avg_code_len: payload.bit_len as f64 / symbol_count as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_roundtrip() {
        let codec = Codec::default();
        let text = "the quick brown fox jumps over the lazy dog";
        let compressed = codec.compress(text).unwrap();
        let decompressed = codec
            .decompress(&compressed.payload, &compressed.table)
            .unwrap();
        assert_eq!(decompressed, text);
    }

    #[test]
    fn test_compress_empty() {
        let codec = Codec::default();
        assert!(matches!(codec.compress(""), Err(CodecError::EmptyInput)));
    }

    #[test]
    fn test_input_limit() {
        let codec = Codec::new(CodecConfig {
            max_input_size: 4,
            ..CodecConfig::default()
        });
        assert!(codec.compress("abcd").is_ok());
        assert!(matches!(
            codec.compress("abcde"),
            Err(CodecError::InputTooLarge { len: 5, max: 4 })
        ));
    }

    #[test]
    fn test_input_limit_counts_bytes() {
        let codec = Codec::new(CodecConfig {
            max_input_size: 3,
            ..CodecConfig::default()
        });
        // two chars, four UTF-8 bytes
        assert!(matches!(
            codec.compress("éé"),
            Err(CodecError::InputTooLarge { len: 4, max: 3 })
        ));
    }

    #[test]
    fn test_verify_roundtrip() {
        let codec = Codec::new(CodecConfig {
            verify_roundtrip: true,
            ..CodecConfig::default()
        });
        assert!(codec.compress("mississippi").is_ok());
    }

    #[test]
    fn test_stats() {
        let codec = Codec::default();
        let text = "aaaaaaaaaa".repeat(100);
        let stats = codec.compress(&text).unwrap().stats;
        assert_eq!(stats.symbol_count, 1000);
        assert_eq!(stats.distinct_symbols, 1);
        assert_eq!(stats.compressed_size, 8 + 125);
        assert!(stats.ratio < 1.0, "repetitive data should compress well");
        assert!(stats.space_saved() > 0);
        assert!(stats.entropy_bits < 0.01);
        assert!((stats.avg_code_len - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_avg_code_len_bounded_by_entropy() {
        let codec = Codec::default();
        let stats = codec.compress("abracadabra alakazam").unwrap().stats;
        assert!(stats.avg_code_len >= stats.entropy_bits);
        assert!(stats.avg_code_len < stats.entropy_bits + 1.0);
    }

    #[test]
    fn test_table_format_follows_config() {
        let codec = Codec::new(CodecConfig {
            table_format: TableFormat::Bincode,
            ..CodecConfig::default()
        });
        let compressed = codec.compress("hello").unwrap();
        let bytes = codec.serialize_table(&compressed.table).unwrap();
        assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
        assert_eq!(codec.deserialize_table(&bytes).unwrap(), compressed.table);
    }
}
