//! EXI Integer: one sign bit followed by the magnitude as an Unsigned
//! Integer. A negative value `-x` is carried as sign `1` and magnitude
//! `x - 1`, so `-1` encodes as sign `1`, magnitude `0`. Zero is always
//! sign `0` - there is no signed-zero ambiguity to guard against.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::ExiResult;
use crate::value::uint;

/// Writes `value` as an EXI (signed) Integer.
pub fn encode(writer: &mut BitWriter, value: i64) -> ExiResult<()> {
    if value >= 0 {
        writer.write_bit(false)?;
        uint::encode(writer, value as u64)
    } else {
        debug_assert_ne!(value, 0, "zero must take the sign=0 branch, never sign=1 magnitude=0");
        writer.write_bit(true)?;
        let magnitude = (-(value as i128) - 1) as u128;
        uint::encode(writer, magnitude as u64)
    }
}

/// Reads an EXI (signed) Integer. Fails with `InvalidExiInput` if the
/// decoded value does not fit in `i64`.
pub fn decode(reader: &mut BitReader) -> ExiResult<i64> {
    let negative = reader.read_bit()?;
    let magnitude = uint::decode(reader)?;
    if negative {
        let value = -(magnitude as i128) - 1;
        i64::try_from(value)
            .map_err(|_| crate::error::ExiError::invalid_input("signed integer exceeds 64-bit range"))
    } else {
        i64::try_from(magnitude)
            .map_err(|_| crate::error::ExiError::invalid_input("signed integer exceeds 64-bit range"))
    }
}
