//! Payload and archive layouts
//!
//! Bare payload, all integers big-endian:
//! `[symbol_count:u32][bit_len:u32][packed bytes: ceil(bit_len / 8)]`
//!
//! Archive bundle (table and payload in one file):
//! `[magic "HUF1"][version:u8][table_len:u32][table: bincode][payload]`

use crate::code_table::CodeTable;
use crate::config::TableFormat;
use crate::error::CodecError;
use std::io::{Read, Write};

pub const ARCHIVE_MAGIC: [u8; 4] = *b"HUF1";
pub const ARCHIVE_VERSION: u8 = 1;

/// Packed bits plus the counts needed to stop decoding before the padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPayload {
    pub symbol_count: u32,
    pub bit_len: u32,
    pub bytes: Vec<u8>,
}

impl PackedPayload {
    pub const HEADER_LEN: usize = 8;

    /// Number of bytes needed to hold `bit_len` bits.
    pub fn byte_len_for(bit_len: u32) -> usize {
        (bit_len as usize + 7) / 8
    }

    pub fn padding_bits(&self) -> u32 {
        ((self.bytes.len() * 8) as u32).saturating_sub(self.bit_len)
    }

    /// Size of the serialized payload including its header.
    pub fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + self.bytes.len()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        writer.write_all(&self.symbol_count.to_be_bytes())?;
        writer.write_all(&self.bit_len.to_be_bytes())?;
        writer.write_all(&self.bytes)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(self.encoded_len());
        output.extend_from_slice(&self.symbol_count.to_be_bytes());
        output.extend_from_slice(&self.bit_len.to_be_bytes());
        output.extend_from_slice(&self.bytes);
        output
    }

    /// Parse a payload occupying all of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < Self::HEADER_LEN {
            return Err(CodecError::MalformedStream(format!(
                "payload header needs {} bytes, got {}",
                Self::HEADER_LEN,
                data.len()
            )));
        }
        let symbol_count = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let bit_len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let bytes = &data[Self::HEADER_LEN..];

        let expected = Self::byte_len_for(bit_len);
        if bytes.len() != expected {
            return Err(CodecError::MalformedStream(format!(
                "{} bits need {} bytes, got {}",
                bit_len,
                expected,
                bytes.len()
            )));
        }

        Ok(PackedPayload {
            symbol_count,
            bit_len,
            bytes: bytes.to_vec(),
        })
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }
}

/// A code table bundled with the payload it decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub table: CodeTable,
    pub payload: PackedPayload,
}

impl Archive {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let table = self.table.serialize(TableFormat::Bincode)?;
        let table_len = u32::try_from(table.len()).map_err(|_| CodecError::InputTooLarge {
            len: table.len(),
            max: u32::MAX as usize,
        })?;

        let mut output = Vec::with_capacity(9 + table.len() + self.payload.encoded_len());
        output.extend_from_slice(&ARCHIVE_MAGIC);
        output.push(ARCHIVE_VERSION);
        output.extend_from_slice(&table_len.to_be_bytes());
        output.extend_from_slice(&table);
        self.payload.write_to(&mut output)?;
        Ok(output)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < 9 {
            return Err(CodecError::MalformedStream("archive too short".into()));
        }
        if data[..4] != ARCHIVE_MAGIC {
            return Err(CodecError::MalformedStream("bad archive magic".into()));
        }
        if data[4] != ARCHIVE_VERSION {
            return Err(CodecError::MalformedStream(format!(
                "unsupported archive version {}",
                data[4]
            )));
        }
        let table_len = u32::from_be_bytes([data[5], data[6], data[7], data[8]]) as usize;
        let rest = &data[9..];
        if rest.len() < table_len {
            return Err(CodecError::MalformedStream("truncated code table".into()));
        }
        let (table, payload) = rest.split_at(table_len);

        Ok(Archive {
            table: CodeTable::deserialize(table, TableFormat::Bincode)?,
            payload: PackedPayload::from_bytes(payload)?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }
}
