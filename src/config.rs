//! Configuration for huffpack

use serde::{Deserialize, Serialize};

/// On-wire representation used when persisting a [`CodeTable`](crate::code_table::CodeTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableFormat {
    /// Human-readable `{"symbol": "bits"}` text.
    Json,
    /// Compact binary encoding.
    Bincode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    pub table_format: TableFormat,
    /// Limit on the UTF-8 size of the input, in bytes.
    pub max_input_size: usize,
    pub verify_roundtrip: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            table_format: TableFormat::Json,
            max_input_size: 100 * 1024 * 1024, // 100 MB
            verify_roundtrip: false,
        }
    }
}
