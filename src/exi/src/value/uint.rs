//! EXI Unsigned Integer: a sequence of 7-bit groups, least-significant
//! group first, each carried in a byte whose high bit is the
//! continuation flag (1 = more groups follow, 0 = last group).
//!
//! Capped at 64 bits of magnitude; larger values are out of scope for
//! the non-`bigint` build (see `value::uint_big` under the `bigint`
//! feature).

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{ExiError, ExiResult};

/// Writes `value` as an EXI Unsigned Integer.
pub fn encode(writer: &mut BitWriter, mut value: u64) -> ExiResult<()> {
    loop {
        let group = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            writer.write_bits((group | 0x80) as u64, 8)?;
        } else {
            writer.write_bits(group as u64, 8)?;
            break;
        }
    }
    Ok(())
}

/// Reads an EXI Unsigned Integer. Fails with `InvalidExiInput` if the
/// encoded magnitude does not fit in 64 bits.
pub fn decode(reader: &mut BitReader) -> ExiResult<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        if shift > 63 {
            return Err(ExiError::invalid_input("unsigned integer exceeds 64 bits"));
        }
        let byte = reader.read_bits(8)? as u8;
        let group = (byte & 0x7f) as u64;
        if shift == 63 && group > 1 {
            return Err(ExiError::invalid_input("unsigned integer exceeds 64 bits"));
        }
        result |= group << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    Ok(result)
}

/// Writes an arbitrary-precision magnitude as an EXI Unsigned Integer,
/// with no 64-bit ceiling. Only available with the `bigint` feature.
#[cfg(feature = "bigint")]
pub fn encode_big(writer: &mut BitWriter, mut value: num_bigint::BigUint) -> ExiResult<()> {
    use num_bigint::BigUint;
    let group_mask = BigUint::from(0x7fu32);
    loop {
        let group = (&value & &group_mask).to_u64_digits().first().copied().unwrap_or(0) as u8;
        value >>= 7u32;
        if value == BigUint::from(0u32) {
            writer.write_bits(group as u64, 8)?;
            break;
        } else {
            writer.write_bits((group | 0x80) as u64, 8)?;
        }
    }
    Ok(())
}

/// Reads an EXI Unsigned Integer with no 64-bit ceiling. Only
/// available with the `bigint` feature.
#[cfg(feature = "bigint")]
pub fn decode_big(reader: &mut BitReader) -> ExiResult<num_bigint::BigUint> {
    use num_bigint::BigUint;
    let mut result = BigUint::from(0u32);
    let mut shift: u32 = 0;
    loop {
        let byte = reader.read_bits(8)? as u8;
        let group = BigUint::from((byte & 0x7f) as u32);
        result |= group << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    Ok(result)
}
