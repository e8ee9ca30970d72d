//! EXI Binary: an Unsigned Integer length prefix followed by that many
//! octets, each octet itself an 8-bit field (not a byte-aligned raw
//! copy - EXI bit-packed streams do not guarantee alignment here).

use crate::bitstream::{BitReader, BitWriter};
use crate::error::ExiResult;
use crate::value::uint;

/// Writes a binary value as length-prefixed octets.
pub fn encode(writer: &mut BitWriter, bytes: &[u8]) -> ExiResult<()> {
    uint::encode(writer, bytes.len() as u64)?;
    for &b in bytes {
        writer.write_bits(b as u64, 8)?;
    }
    Ok(())
}

/// Reads a length-prefixed binary value.
pub fn decode(reader: &mut BitReader) -> ExiResult<Vec<u8>> {
    let len = uint::decode(reader)? as usize;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(reader.read_bits(8)? as u8);
    }
    Ok(out)
}
