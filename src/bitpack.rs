//! Bit-level packing and unpacking
//!
//! Codes are written most-significant bit first and the final byte is zero-padded.
//! The unpacker walks the stream one bit at a time, growing a candidate code until it
//! matches an entry of the inverted table, and stops as soon as the declared number of
//! symbols has been emitted so padding bits are never read as a code.

use crate::code_table::{Code, CodeTable};
use crate::container::PackedPayload;
use crate::error::CodecError;
use crate::tree::Symbol;
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use std::io::Cursor;
use tracing::debug;

/// Encode `text` with `table`.
///
/// Fails with [`CodecError::UnknownSymbol`] on the first symbol the table does not cover.
pub fn pack(text: &str, table: &CodeTable) -> Result<PackedPayload, CodecError> {
    let mut bytes = Vec::new();
    let mut bit_len: u64 = 0;
    let mut symbol_count: u64 = 0;
    {
        let mut w = BitWriter::endian(&mut bytes, BigEndian);
        for c in text.chars() {
            let code = table.get(c).ok_or(CodecError::UnknownSymbol(c))?;
            w.write(code.len(), code.bits())?;
            bit_len += code.len() as u64;
            symbol_count += 1;
        }
        w.byte_align()?;
    }

    let too_large = |len: u64| CodecError::InputTooLarge {
        len: len as usize,
        max: u32::MAX as usize,
    };
    let payload = PackedPayload {
        symbol_count: u32::try_from(symbol_count).map_err(|_| too_large(symbol_count))?,
        bit_len: u32::try_from(bit_len).map_err(|_| too_large(bit_len))?,
        bytes,
    };
    debug!(
        symbols = payload.symbol_count,
        bits = payload.bit_len,
        bytes = payload.bytes.len(),
        padding = payload.padding_bits(),
        "packed payload"
    );
    Ok(payload)
}

/// Decode `symbol_count` symbols from the first `bit_len` bits of `bytes`.
pub fn unpack(
    bytes: &[u8],
    bit_len: u32,
    symbol_count: u32,
    table: &CodeTable,
) -> Result<String, CodecError> {
    let expected_bytes = PackedPayload::byte_len_for(bit_len);
    if bytes.len() != expected_bytes {
        return Err(CodecError::MalformedStream(format!(
            "{} bits need {} bytes, got {}",
            bit_len,
            expected_bytes,
            bytes.len()
        )));
    }

    let decode = table.decode_map();
    let max_len = table.max_code_len();
    let mut r = BitReader::endian(Cursor::new(bytes), BigEndian);
    // every symbol costs at least one bit
    let mut output = String::with_capacity(symbol_count.min(bit_len) as usize);
    let mut emitted: u32 = 0;
    let mut consumed: u32 = 0;
    let mut current = Code::EMPTY;

    while emitted < symbol_count {
        if consumed == bit_len {
            return Err(CodecError::MalformedStream(format!(
                "stream exhausted after {} of {} symbols",
                emitted, symbol_count
            )));
        }
        let bit = r
            .read_bit()
            .map_err(|e| CodecError::MalformedStream(e.to_string()))?;
        consumed += 1;
        current = current.push(bit).ok_or_else(|| {
            CodecError::MalformedStream("candidate code overflowed 64 bits".into())
        })?;

        match decode.get(&current) {
            Some(Symbol::Char(c)) => {
                output.push(*c);
                emitted += 1;
                current = Code::EMPTY;
            }
            Some(Symbol::Placeholder) => {
                return Err(CodecError::MalformedStream(format!(
                    "placeholder code at bit {}",
                    consumed - current.len()
                )));
            }
            None if current.len() >= max_len => {
                return Err(CodecError::MalformedStream(format!(
                    "no code matches {} at bit {}",
                    current,
                    consumed - current.len()
                )));
            }
            None => {}
        }
    }

    if consumed != bit_len {
        return Err(CodecError::MalformedStream(format!(
            "{} meaningful bits left after {} symbols",
            bit_len - consumed,
            symbol_count
        )));
    }

    debug!(symbols = emitted, bits = consumed, "unpacked payload");
    Ok(output)
}

/// [`unpack`] driven by a [`PackedPayload`].
pub fn unpack_payload(payload: &PackedPayload, table: &CodeTable) -> Result<String, CodecError> {
    unpack(&payload.bytes, payload.bit_len, payload.symbol_count, table)
}
