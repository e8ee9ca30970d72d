//! EXI Float: two consecutive (signed) Integers - MANTISSA and
//! EXPONENT - representing `MANTISSA * 2^EXPONENT` (spec.md §4.2). The
//! reserved exponent value for the schema "special" payloads (INF,
//! -INF, NaN) is modeled as `SpecialFloat` rather than silently
//! clamped.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::ExiResult;
use crate::value::int;

/// The exponent value reserved to flag INF/-INF/NaN: never produced by
/// a finite mantissa/exponent pair our encoder emits.
const SPECIAL_EXPONENT: i64 = i64::MIN;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatValue {
    Finite { mantissa: i64, exponent: i64 },
    Infinity,
    NegativeInfinity,
    NotANumber,
}

/// Writes a `FloatValue`.
pub fn encode(writer: &mut BitWriter, value: &FloatValue) -> ExiResult<()> {
    let (mantissa, exponent) = match *value {
        FloatValue::Finite { mantissa, exponent } => (mantissa, exponent),
        FloatValue::Infinity => (1, SPECIAL_EXPONENT),
        FloatValue::NegativeInfinity => (-1, SPECIAL_EXPONENT),
        FloatValue::NotANumber => (0, SPECIAL_EXPONENT),
    };
    int::encode(writer, mantissa)?;
    int::encode(writer, exponent)
}

/// Reads a `FloatValue`.
pub fn decode(reader: &mut BitReader) -> ExiResult<FloatValue> {
    let mantissa = int::decode(reader)?;
    let exponent = int::decode(reader)?;
    Ok(if exponent == SPECIAL_EXPONENT {
        match mantissa {
            1 => FloatValue::Infinity,
            -1 => FloatValue::NegativeInfinity,
            _ => FloatValue::NotANumber,
        }
    } else {
        FloatValue::Finite { mantissa, exponent }
    })
}

/// Converts a finite `FloatValue` to an `f64`, for callers that need
/// the numeric value rather than the lexical mantissa/exponent pair.
/// Returns the IEEE special values for the non-finite variants.
pub fn to_f64(value: &FloatValue) -> f64 {
    match *value {
        FloatValue::Finite { mantissa, exponent } => mantissa as f64 * 2f64.powi(exponent as i32),
        FloatValue::Infinity => f64::INFINITY,
        FloatValue::NegativeInfinity => f64::NEG_INFINITY,
        FloatValue::NotANumber => f64::NAN,
    }
}
