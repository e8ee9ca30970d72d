//! EXI String value: local-value hit, global-value hit, or miss with a
//! code-point literal, each against the string table owned by the
//! codec instance currently running (spec.md §4.2, §4.4).
//!
//! The leading `UnsignedInteger` selector doubles as the miss-branch
//! length: `0` is a local hit, `1` is a global hit, and any `n >= 2`
//! is a miss carrying `n - 2` Unicode code points, each written as a
//! `UCSCodePoint` (unsigned varint holding the scalar value).

use crate::bitstream::{BitReader, BitWriter};
use crate::error::ExiError;
use crate::error::ExiResult;
use crate::strings::{CompactId, StringTable};
use crate::value::uint;

const LOCAL_HIT: u64 = 0;
const GLOBAL_HIT: u64 = 1;
const MISS_OFFSET: u64 = 2;

/// Writes each Unicode scalar value of `text`, in order, as a
/// `UCSCodePoint` unsigned varint, with no length prefix of its own
/// (the caller has already committed to a code-point count).
pub(crate) fn write_codepoints_raw(writer: &mut BitWriter, text: &str) -> ExiResult<()> {
    for ch in text.chars() {
        uint::encode(writer, ch as u64)?;
    }
    Ok(())
}

/// Reads `count` `UCSCodePoint` varints back into a `String`.
pub(crate) fn read_codepoints_raw(reader: &mut BitReader, count: usize) -> ExiResult<String> {
    let mut text = String::with_capacity(count);
    for _ in 0..count {
        let cp = uint::decode(reader)?;
        let scalar = u32::try_from(cp).map_err(|_| ExiError::invalid_input("code point exceeds u32 range"))?;
        let ch = char::from_u32(scalar).ok_or_else(|| ExiError::invalid_input("invalid Unicode code point"))?;
        text.push(ch);
    }
    Ok(text)
}

/// Writes a self-delimited code-point literal: a `UnsignedInteger`
/// code-point count, then each code point as a `UCSCodePoint`. Shared
/// by the URI/LocalName/Prefix partitions and by Comment/PI/DocType
/// text, which all carry literals outside the local/global value
/// partitions.
pub(crate) fn write_literal_text(writer: &mut BitWriter, text: &str) -> ExiResult<()> {
    uint::encode(writer, text.chars().count() as u64)?;
    write_codepoints_raw(writer, text)
}

pub(crate) fn read_literal_text(reader: &mut BitReader) -> ExiResult<String> {
    let count = uint::decode(reader)? as usize;
    read_codepoints_raw(reader, count)
}

/// Writes `value` in the local-name-scoped slot `(uri_id, local_id)`.
pub fn encode<'arena>(
    writer: &mut BitWriter,
    table: &mut StringTable<'arena>,
    uri_id: CompactId,
    local_id: CompactId,
    value: &str,
) -> ExiResult<()> {
    if let Some(local_entry) = table.get_local_name(uri_id, local_id)? {
        if let Some(id) = local_entry.find_local_value(value) {
            uint::encode(writer, LOCAL_HIT)?;
            writer.write_bits(id.0 as u64, hit_width(local_entry.local_value_count()))?;
            return Ok(());
        }
    }
    if let Some(id) = table.find_global_value(value) {
        uint::encode(writer, GLOBAL_HIT)?;
        writer.write_bits(id.0 as u64, hit_width(table.global_value_count()))?;
        return Ok(());
    }
    let count = value.chars().count() as u64;
    uint::encode(writer, count + MISS_OFFSET)?;
    write_codepoints_raw(writer, value)?;
    table.add_value(uri_id, local_id, value)?;
    Ok(())
}

/// Bit width for a compact ID that selects among `count` *existing*
/// entries (a value/global-value hit, spec.md §4.2 paths 2/3):
/// `ceil(log2(count))`, `0` when `count <= 1`. The selector varint
/// already distinguishes hit from miss, so unlike
/// `strings::bits_for_count` (which reserves an extra slot for an
/// implicit "miss") there is nothing left to reserve a bit for here.
fn hit_width(count: u32) -> u32 {
    if count <= 1 {
        return 0;
    }
    let mut bits = 0u32;
    while (1u64 << bits) < count as u64 {
        bits += 1;
    }
    bits
}

/// Reads a string in the local-name-scoped slot `(uri_id, local_id)`,
/// returning a reference stable for the table's lifetime.
pub fn decode<'arena>(
    reader: &mut BitReader,
    table: &mut StringTable<'arena>,
    uri_id: CompactId,
    local_id: CompactId,
) -> ExiResult<&'arena str> {
    let selector = uint::decode(reader)?;
    match selector {
        LOCAL_HIT => {
            let local_entry = table
                .get_local_name(uri_id, local_id)?
                .ok_or_else(|| ExiError::invalid_input("local-value hit against unknown local name"))?;
            let bits = hit_width(local_entry.local_value_count());
            let id = reader.read_bits(bits)? as u32;
            local_entry
                .get_local_value(CompactId(id))
                .ok_or_else(|| ExiError::invalid_input("local-value hit out of range"))
        }
        GLOBAL_HIT => {
            let bits = hit_width(table.global_value_count());
            let id = reader.read_bits(bits)? as u32;
            table.get_global_value(CompactId(id)).ok_or_else(|| ExiError::invalid_input("global-value hit out of range"))
        }
        n => {
            let count = (n - MISS_OFFSET) as usize;
            let text = read_codepoints_raw(reader, count)?;
            table.add_value(uri_id, local_id, &text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ExiOptions;
    use bumpalo::Bump;

    fn setup<'a>(arena: &'a Bump) -> (StringTable<'a>, CompactId, CompactId) {
        let mut table = StringTable::setup(arena, &ExiOptions::default());
        let uri_id = table.add_uri("urn:demo");
        let local_id = table.add_local_name(uri_id, "widget").unwrap();
        (table, uri_id, local_id)
    }

    #[test]
    fn first_occurrence_is_a_miss_then_repeats_hit_locally() {
        let arena = Bump::new();
        let (mut table, uri_id, local_id) = setup(&arena);

        let mut w = BitWriter::new();
        encode(&mut w, &mut table, uri_id, local_id, "hello").unwrap();
        encode(&mut w, &mut table, uri_id, local_id, "hello").unwrap();
        let bytes = w.finish().unwrap();

        let mut r = BitReader::new(&bytes);
        let mut table2 = StringTable::setup(&arena, &ExiOptions::default());
        let uri_id2 = table2.add_uri("urn:demo");
        let local_id2 = table2.add_local_name(uri_id2, "widget").unwrap();
        assert_eq!(decode(&mut r, &mut table2, uri_id2, local_id2).unwrap(), "hello");
        assert_eq!(decode(&mut r, &mut table2, uri_id2, local_id2).unwrap(), "hello");
    }

    #[test]
    fn repeated_value_under_a_different_qname_hits_globally() {
        let arena = Bump::new();
        let mut table = StringTable::setup(&arena, &ExiOptions::default());
        let uri_id = table.add_uri("urn:demo");
        let local_a = table.add_local_name(uri_id, "a").unwrap();
        let local_b = table.add_local_name(uri_id, "b").unwrap();

        let mut w = BitWriter::new();
        encode(&mut w, &mut table, uri_id, local_a, "shared").unwrap();
        encode(&mut w, &mut table, uri_id, local_b, "shared").unwrap();
        let bytes = w.finish().unwrap();

        let mut r = BitReader::new(&bytes);
        let mut table2 = StringTable::setup(&arena, &ExiOptions::default());
        let uri_id2 = table2.add_uri("urn:demo");
        let local_a2 = table2.add_local_name(uri_id2, "a").unwrap();
        let local_b2 = table2.add_local_name(uri_id2, "b").unwrap();
        assert_eq!(decode(&mut r, &mut table2, uri_id2, local_a2).unwrap(), "shared");
        assert_eq!(decode(&mut r, &mut table2, uri_id2, local_b2).unwrap(), "shared");
    }

    #[test]
    fn empty_string_roundtrips() {
        let arena = Bump::new();
        let (mut table, uri_id, local_id) = setup(&arena);
        let mut w = BitWriter::new();
        encode(&mut w, &mut table, uri_id, local_id, "").unwrap();
        let bytes = w.finish().unwrap();
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode(&mut r, &mut table, uri_id, local_id).unwrap(), "");
    }

    #[test]
    fn hit_width_reserves_no_extra_slot_unlike_bits_for_count() {
        assert_eq!(hit_width(0), 0);
        assert_eq!(hit_width(1), 0);
        assert_eq!(hit_width(2), 1);
        assert_eq!(hit_width(4), 2);
        assert_eq!(hit_width(5), 3);
    }

    #[test]
    fn non_ascii_codepoints_roundtrip_on_miss() {
        let arena = Bump::new();
        let (mut table, uri_id, local_id) = setup(&arena);
        let mut w = BitWriter::new();
        encode(&mut w, &mut table, uri_id, local_id, "r\u{00e9}sum\u{00e9}").unwrap();
        let bytes = w.finish().unwrap();
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode(&mut r, &mut table, uri_id, local_id).unwrap(), "r\u{00e9}sum\u{00e9}");
    }

    #[test]
    fn miss_selector_counts_codepoints_not_bytes() {
        // "\u{00e9}" (U+00E9) is 2 UTF-8 bytes but 1 code point; the
        // miss selector must carry the code-point count.
        let arena = Bump::new();
        let (mut table, uri_id, local_id) = setup(&arena);
        let mut w = BitWriter::new();
        encode(&mut w, &mut table, uri_id, local_id, "\u{00e9}").unwrap();
        let bytes = w.finish().unwrap();
        let mut r = BitReader::new(&bytes);
        let selector = uint::decode(&mut r).unwrap();
        assert_eq!(selector, 1 + MISS_OFFSET);
    }
}
