//! EXI DateTime: a fixed sequence of small integer fields, the exact
//! subset depending on which XSD datetime type is in play (`dateTime`,
//! `date`, `time`, `gYear`, ...). spec.md §4.2 folds all of these into
//! one component struct with optional fields, since every field here is
//! the same pair of primitives (N-bit or Integer) regardless of which
//! XSD type selected it; `DateTimeKind` documents which fields a given
//! type populates without needing a separate codec per type.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::ExiResult;
use crate::value::{nbit, uint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    GYear,
    GYearMonth,
    Date,
    DateTime,
    Time,
    GMonth,
    GMonthDay,
    GDay,
}

/// A decoded/pre-encode date-time value. Fields not meaningful for
/// `kind` are left at their default and not written to the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeValue {
    pub kind: Option<DateTimeKind>,
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub fractional_second_nanos: u32,
    /// Timezone offset from UTC in minutes, if present.
    pub timezone_offset_minutes: Option<i32>,
}

fn has_date(kind: DateTimeKind) -> bool {
    matches!(
        kind,
        DateTimeKind::GYear
            | DateTimeKind::GYearMonth
            | DateTimeKind::Date
            | DateTimeKind::DateTime
            | DateTimeKind::GMonth
            | DateTimeKind::GMonthDay
            | DateTimeKind::GDay
    )
}

fn has_month(kind: DateTimeKind) -> bool {
    matches!(
        kind,
        DateTimeKind::GYearMonth
            | DateTimeKind::Date
            | DateTimeKind::DateTime
            | DateTimeKind::GMonth
            | DateTimeKind::GMonthDay
    )
}

fn has_day(kind: DateTimeKind) -> bool {
    matches!(kind, DateTimeKind::Date | DateTimeKind::DateTime | DateTimeKind::GMonthDay | DateTimeKind::GDay)
}

fn has_time(kind: DateTimeKind) -> bool {
    matches!(kind, DateTimeKind::DateTime | DateTimeKind::Time)
}

fn write_timezone(writer: &mut BitWriter, offset: Option<i32>) -> ExiResult<()> {
    match offset {
        None => writer.write_bit(false),
        Some(minutes) => {
            writer.write_bit(true)?;
            // Offsets run -14:00..=+14:00, biased to a non-negative 12-bit field.
            let biased = (minutes + 14 * 60) as u64;
            writer.write_bits(biased, 12)
        }
    }
}

fn read_timezone(reader: &mut BitReader) -> ExiResult<Option<i32>> {
    if reader.read_bit()? {
        let biased = reader.read_bits(12)? as i32;
        Ok(Some(biased - 14 * 60))
    } else {
        Ok(None)
    }
}

/// Writes a `DateTimeValue`. `value.kind` selects which fields are
/// emitted; callers construct values through the `DateTimeKind`
/// associated with their XSD type.
pub fn encode(writer: &mut BitWriter, value: &DateTimeValue) -> ExiResult<()> {
    let kind = value.kind.unwrap_or(DateTimeKind::DateTime);
    if has_date(kind) {
        crate::value::int::encode(writer, value.year)?;
    }
    if has_month(kind) {
        nbit::encode(writer, value.month as u64, 4)?;
    }
    if has_day(kind) {
        nbit::encode(writer, value.day as u64, 5)?;
    }
    if has_time(kind) {
        nbit::encode(writer, value.hour as u64, 5)?;
        nbit::encode(writer, value.minute as u64, 6)?;
        nbit::encode(writer, value.second as u64, 6)?;
        if value.fractional_second_nanos > 0 {
            writer.write_bit(true)?;
            uint::encode(writer, value.fractional_second_nanos as u64)?;
        } else {
            writer.write_bit(false)?;
        }
    }
    write_timezone(writer, value.timezone_offset_minutes)
}

/// Reads a `DateTimeValue` for the given `kind`.
pub fn decode(reader: &mut BitReader, kind: DateTimeKind) -> ExiResult<DateTimeValue> {
    let mut value = DateTimeValue { kind: Some(kind), ..Default::default() };
    if has_date(kind) {
        value.year = crate::value::int::decode(reader)?;
    }
    if has_month(kind) {
        value.month = nbit::decode(reader, 4)? as u32;
    }
    if has_day(kind) {
        value.day = nbit::decode(reader, 5)? as u32;
    }
    if has_time(kind) {
        value.hour = nbit::decode(reader, 5)? as u32;
        value.minute = nbit::decode(reader, 6)? as u32;
        value.second = nbit::decode(reader, 6)? as u32;
        if reader.read_bit()? {
            value.fractional_second_nanos = uint::decode(reader)? as u32;
        }
    }
    value.timezone_offset_minutes = read_timezone(reader)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_full_datetime_with_timezone_and_fraction() {
        let v = DateTimeValue {
            kind: Some(DateTimeKind::DateTime),
            year: 2024,
            month: 3,
            day: 14,
            hour: 9,
            minute: 26,
            second: 53,
            fractional_second_nanos: 589_793,
            timezone_offset_minutes: Some(-300),
        };
        let mut w = BitWriter::new();
        encode(&mut w, &v).unwrap();
        let bytes = w.finish().unwrap();
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode(&mut r, DateTimeKind::DateTime).unwrap(), v);
    }

    #[test]
    fn roundtrips_gyear_without_time_fields() {
        let v = DateTimeValue { kind: Some(DateTimeKind::GYear), year: 1999, ..Default::default() };
        let mut w = BitWriter::new();
        encode(&mut w, &v).unwrap();
        let bytes = w.finish().unwrap();
        let mut r = BitReader::new(&bytes);
        let got = decode(&mut r, DateTimeKind::GYear).unwrap();
        assert_eq!(got.year, 1999);
        assert_eq!(got.month, 0);
    }

    #[test]
    fn absent_timezone_roundtrips_as_none() {
        let v = DateTimeValue { kind: Some(DateTimeKind::Time), hour: 1, minute: 2, second: 3, ..Default::default() };
        let mut w = BitWriter::new();
        encode(&mut w, &v).unwrap();
        let bytes = w.finish().unwrap();
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode(&mut r, DateTimeKind::Time).unwrap().timezone_offset_minutes, None);
    }
}
