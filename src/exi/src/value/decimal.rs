//! EXI Decimal: a sign bit, the integral part as an Unsigned Integer,
//! and the fractional digits (reversed, trailing zeros stripped) as a
//! second Unsigned Integer. Composed entirely of the primitives above,
//! per spec.md §4.2.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::ExiResult;
use crate::value::uint;

/// A decimal value split into sign, integral magnitude, and fractional
/// digit string (most-significant digit first, no trailing zeros).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    pub negative: bool,
    pub integral: u64,
    pub fraction_digits: String,
}

impl Decimal {
    pub fn new(negative: bool, integral: u64, fraction_digits: impl Into<String>) -> Self {
        let mut digits = fraction_digits.into();
        while digits.ends_with('0') {
            digits.pop();
        }
        Self { negative, integral, fraction_digits: digits }
    }
}

fn fraction_to_uint(digits: &str) -> u64 {
    if digits.is_empty() {
        return 0;
    }
    digits.chars().rev().collect::<String>().parse().unwrap_or(0)
}

fn uint_to_fraction(mut value: u64, digit_count_hint: usize) -> String {
    if value == 0 {
        return String::new();
    }
    let mut reversed = String::new();
    while value > 0 {
        reversed.push(char::from(b'0' + (value % 10) as u8));
        value /= 10;
    }
    // account for fraction strings that began with (i.e. reversed,
    // end with) zero digits lost when parsed back as an integer.
    while reversed.len() < digit_count_hint {
        reversed.push('0');
    }
    reversed.chars().rev().collect()
}

/// Writes a `Decimal`.
pub fn encode(writer: &mut BitWriter, value: &Decimal) -> ExiResult<()> {
    writer.write_bit(value.negative)?;
    uint::encode(writer, value.integral)?;
    uint::encode(writer, fraction_to_uint(&value.fraction_digits))
}

/// Reads a `Decimal`. `digit_count_hint` lets the caller request a
/// minimum fraction-digit width when the canonical digit count must be
/// reconstructed from context outside the stream; `0` reconstructs the
/// shortest form.
pub fn decode(reader: &mut BitReader, digit_count_hint: usize) -> ExiResult<Decimal> {
    let negative = reader.read_bit()?;
    let integral = uint::decode(reader)?;
    let fraction_value = uint::decode(reader)?;
    let fraction_digits = uint_to_fraction(fraction_value, digit_count_hint);
    Ok(Decimal { negative, integral, fraction_digits })
}
