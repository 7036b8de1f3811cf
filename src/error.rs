//! Error types for huffpack

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("empty input")]
    EmptyInput,

    #[error("symbol {0:?} is not covered by the code table")]
    UnknownSymbol(char),

    #[error("malformed stream: {0}")]
    MalformedStream(String),

    #[error("invalid code table: {0}")]
    InvalidTable(String),

    #[error("input too large: {len} exceeds limit {max}")]
    InputTooLarge { len: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for CodecError {
    fn from(e: bincode::Error) -> Self {
        CodecError::Serialization(e.to_string())
    }
}
