//! EXI n-bit Unsigned Integer: a fixed-width raw field, no continuation
//! bits. Used for small bounded-range fields (date/time components,
//! enumeration indices).

use crate::bitstream::{BitReader, BitWriter};
use crate::error::ExiResult;

/// Writes the low `n` bits of `value` as a fixed-width field.
pub fn encode(writer: &mut BitWriter, value: u64, n: u32) -> ExiResult<()> {
    writer.write_bits(value, n)
}

/// Reads an `n`-bit fixed-width field.
pub fn decode(reader: &mut BitReader, n: u32) -> ExiResult<u64> {
    reader.read_bits(n)
}
