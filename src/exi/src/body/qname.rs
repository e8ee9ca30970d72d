//! Shared compact-ID-with-miss-slot encoding for the URI, Prefix and
//! Local-Name partitions: a `log`-width field where the value equal to
//! the partition's current size means "miss - a code-point literal
//! follows and is appended to the partition" (spec.md §4.4).

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{ExiError, ExiResult};
use crate::strings::{bits_for_count, CompactId, StringTable};
use crate::value::string::{read_literal_text, write_literal_text};

pub(crate) fn write_literal(writer: &mut BitWriter, text: &str) -> ExiResult<()> {
    write_literal_text(writer, text)
}

pub(crate) fn read_literal(reader: &mut BitReader) -> ExiResult<String> {
    read_literal_text(reader)
}

pub fn encode_uri<'arena>(writer: &mut BitWriter, table: &mut StringTable<'arena>, uri: &str) -> ExiResult<CompactId> {
    let count = table.uri_count();
    let log = bits_for_count(count);
    if let Some(id) = table.find_uri(uri) {
        writer.write_bits(id.0 as u64, log)?;
        return Ok(id);
    }
    writer.write_bits(count as u64, log)?;
    write_literal(writer, uri)?;
    Ok(table.add_uri(uri))
}

pub fn decode_uri<'arena>(reader: &mut BitReader, table: &mut StringTable<'arena>) -> ExiResult<CompactId> {
    let count = table.uri_count();
    let log = bits_for_count(count);
    let id = reader.read_bits(log)? as u32;
    if id == count {
        let uri = read_literal(reader)?;
        Ok(table.add_uri(&uri))
    } else {
        Ok(CompactId(id))
    }
}

pub fn encode_local_name<'arena>(
    writer: &mut BitWriter,
    table: &mut StringTable<'arena>,
    uri_id: CompactId,
    name: &str,
) -> ExiResult<CompactId> {
    let count = table.local_name_count(uri_id)?;
    let log = bits_for_count(count);
    if let Some(id) = table.find_local_name(uri_id, name)? {
        writer.write_bits(id.0 as u64, log)?;
        return Ok(id);
    }
    writer.write_bits(count as u64, log)?;
    write_literal(writer, name)?;
    table.add_local_name(uri_id, name)
}

pub fn decode_local_name<'arena>(
    reader: &mut BitReader,
    table: &mut StringTable<'arena>,
    uri_id: CompactId,
) -> ExiResult<CompactId> {
    let count = table.local_name_count(uri_id)?;
    let log = bits_for_count(count);
    let id = reader.read_bits(log)? as u32;
    if id == count {
        let name = read_literal(reader)?;
        table.add_local_name(uri_id, &name)
    } else {
        Ok(CompactId(id))
    }
}

pub fn encode_prefix<'arena>(
    writer: &mut BitWriter,
    table: &mut StringTable<'arena>,
    uri_id: CompactId,
    prefix: &str,
) -> ExiResult<()> {
    let count = table.prefix_count(uri_id)?;
    let log = bits_for_count(count);
    if let Some(id) = table.find_prefix(uri_id, prefix)? {
        writer.write_bits(id.0 as u64, log)?;
        return Ok(());
    }
    writer.write_bits(count as u64, log)?;
    write_literal(writer, prefix)?;
    table.add_prefix(uri_id, prefix)?;
    Ok(())
}

pub fn decode_prefix<'arena>(
    reader: &mut BitReader,
    table: &mut StringTable<'arena>,
    uri_id: CompactId,
) -> ExiResult<&'arena str> {
    let count = table.prefix_count(uri_id)?;
    let log = bits_for_count(count);
    let id = reader.read_bits(log)? as u32;
    if id == count {
        let prefix = read_literal(reader)?;
        let new_id = table.add_prefix(uri_id, &prefix)?;
        table.get_prefix(uri_id, new_id)?.ok_or_else(|| ExiError::invalid_input("prefix vanished after insert"))
    } else {
        table
            .get_prefix(uri_id, CompactId(id))?
            .ok_or_else(|| ExiError::invalid_input("prefix hit out of range"))
    }
}
