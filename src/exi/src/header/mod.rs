//! The EXI header: optional `$EXI` cookie, distinguishing bits `10`,
//! the presence bit for Options, a 4-bit preview flag, the EXI version
//! (a 4-bit-group varint, `1 + sum` of groups read), an optional
//! Options body, and alignment padding (spec.md §4.3).
//!
//! The Options body is itself EXI content in the full W3C grammar, a
//! bootstrapping wrinkle real processors resolve with a fixed
//! "Options schema" grammar baked into the core. This crate sidesteps
//! that bootstrap with a flat, fixed-order field encoding instead of
//! running the general body codec over itself - documented in
//! DESIGN.md as a deliberate simplification, not an oversight.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{ExiError, ExiResult};

const COOKIE: &[u8; 4] = b"$EXI";
const DISTINGUISHING_BITS: u64 = 0b10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    BitPacked,
    ByteAligned,
    PreCompression,
    Compression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreserveFlags {
    pub comments: bool,
    pub processing_instructions: bool,
    pub dtd: bool,
    pub prefixes: bool,
    pub lexical_values: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExiOptions {
    pub alignment: Alignment,
    pub strict: bool,
    pub fragment: bool,
    pub self_contained: bool,
    pub preserve: PreserveFlags,
    pub schema_id: Option<String>,
    pub value_max_length: Option<u32>,
    pub value_partition_capacity: Option<u32>,
}

impl ExiOptions {
    /// Rejects combinations the EXI 1.0 spec forbids outright (spec.md
    /// §4.3's mutual-exclusion matrix; see DESIGN.md for the decided
    /// rule set).
    pub fn validate(&self) -> ExiResult<()> {
        if self.strict && self.self_contained {
            return Err(ExiError::HeaderOptionsMismatch("strict and selfContained are mutually exclusive".into()));
        }
        if self.strict && self.preserve.lexical_values {
            return Err(ExiError::HeaderOptionsMismatch("strict and preserve.lexicalValues are mutually exclusive".into()));
        }
        if self.strict && self.alignment != Alignment::BitPacked {
            return Err(ExiError::HeaderOptionsMismatch("strict requires bit-packed alignment".into()));
        }
        if self.self_contained && self.alignment == Alignment::Compression {
            return Err(ExiError::HeaderOptionsMismatch("selfContained is incompatible with compression".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExiHeader {
    pub had_cookie: bool,
    pub is_preview_version: bool,
    pub version: u32,
    pub options: ExiOptions,
}

/// Writes the version number as the spec's 4-bit-group varint: each
/// group holds a value in `[0, 15]`; a group `< 15` is the last one,
/// and the version equals `1 + sum` of every group read (§4.3 step 3).
fn write_version(writer: &mut BitWriter, version: u32) -> ExiResult<()> {
    let mut remaining = version.checked_sub(1).ok_or_else(|| ExiError::invalid_header("EXI version must be >= 1"))?;
    loop {
        if remaining >= 15 {
            writer.write_bits(15, 4)?;
            remaining -= 15;
        } else {
            writer.write_bits(remaining as u64, 4)?;
            break;
        }
    }
    Ok(())
}

fn read_version(reader: &mut BitReader) -> ExiResult<u32> {
    let mut sum: u32 = 0;
    loop {
        let nibble = reader.read_bits(4)? as u32;
        sum = sum.checked_add(nibble).ok_or_else(|| ExiError::invalid_header("EXI version field too long"))?;
        if nibble < 15 {
            break;
        }
    }
    sum.checked_add(1).ok_or_else(|| ExiError::invalid_header("EXI version field too long"))
}

/// Writes the 4-bit `preview` field (§4.3 step 3): all-zero for a
/// final version, `1111` for a preview version.
fn write_preview(writer: &mut BitWriter, is_preview_version: bool) -> ExiResult<()> {
    writer.write_bits(if is_preview_version { 0b1111 } else { 0 }, 4)
}

fn read_preview(reader: &mut BitReader) -> ExiResult<bool> {
    Ok(reader.read_bits(4)? != 0)
}

fn write_options(writer: &mut BitWriter, options: &ExiOptions) -> ExiResult<()> {
    writer.write_bits(
        match options.alignment {
            Alignment::BitPacked => 0,
            Alignment::ByteAligned => 1,
            Alignment::PreCompression => 2,
            Alignment::Compression => 3,
        },
        2,
    )?;
    writer.write_bit(options.strict)?;
    writer.write_bit(options.fragment)?;
    writer.write_bit(options.self_contained)?;
    writer.write_bit(options.preserve.comments)?;
    writer.write_bit(options.preserve.processing_instructions)?;
    writer.write_bit(options.preserve.dtd)?;
    writer.write_bit(options.preserve.prefixes)?;
    writer.write_bit(options.preserve.lexical_values)?;
    match &options.schema_id {
        None => writer.write_bit(false)?,
        Some(id) => {
            writer.write_bit(true)?;
            crate::value::uint::encode(writer, id.len() as u64)?;
            for &b in id.as_bytes() {
                writer.write_bits(b as u64, 8)?;
            }
        }
    }
    match options.value_max_length {
        None => writer.write_bit(false)?,
        Some(n) => {
            writer.write_bit(true)?;
            crate::value::uint::encode(writer, n as u64)?;
        }
    }
    match options.value_partition_capacity {
        None => writer.write_bit(false)?,
        Some(n) => {
            writer.write_bit(true)?;
            crate::value::uint::encode(writer, n as u64)?;
        }
    }
    Ok(())
}

fn read_options(reader: &mut BitReader) -> ExiResult<ExiOptions> {
    let alignment = match reader.read_bits(2)? {
        0 => Alignment::BitPacked,
        1 => Alignment::ByteAligned,
        2 => Alignment::PreCompression,
        3 => Alignment::Compression,
        _ => unreachable!(),
    };
    let strict = reader.read_bit()?;
    let fragment = reader.read_bit()?;
    let self_contained = reader.read_bit()?;
    let preserve = PreserveFlags {
        comments: reader.read_bit()?,
        processing_instructions: reader.read_bit()?,
        dtd: reader.read_bit()?,
        prefixes: reader.read_bit()?,
        lexical_values: reader.read_bit()?,
    };
    let schema_id = if reader.read_bit()? {
        let len = crate::value::uint::decode(reader)? as usize;
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(reader.read_bits(8)? as u8);
        }
        Some(String::from_utf8(bytes).map_err(|e| ExiError::invalid_header(e.to_string()))?)
    } else {
        None
    };
    let value_max_length = if reader.read_bit()? { Some(crate::value::uint::decode(reader)? as u32) } else { None };
    let value_partition_capacity =
        if reader.read_bit()? { Some(crate::value::uint::decode(reader)? as u32) } else { None };
    let options = ExiOptions {
        alignment,
        strict,
        fragment,
        self_contained,
        preserve,
        schema_id,
        value_max_length,
        value_partition_capacity,
    };
    options.validate()?;
    Ok(options)
}

/// Writes the complete header: cookie (if `include_cookie`),
/// distinguishing bits, options-presence bit, preview flag, version,
/// options (if not default), and alignment padding.
pub fn write_header(
    writer: &mut BitWriter,
    include_cookie: bool,
    is_preview_version: bool,
    version: u32,
    options: &ExiOptions,
) -> ExiResult<()> {
    options.validate()?;
    if include_cookie {
        writer.write_bytes(COOKIE)?;
    }
    writer.write_bits(DISTINGUISHING_BITS, 2)?;
    let has_options = *options != ExiOptions::default();
    writer.write_bit(has_options)?;
    write_preview(writer, is_preview_version)?;
    write_version(writer, version)?;
    if has_options {
        write_options(writer, options)?;
    }
    if options.alignment != Alignment::BitPacked {
        writer.align_to_byte()?;
    }
    Ok(())
}

/// Reads and validates a header, auto-detecting the `$EXI` cookie.
pub fn parse_header(reader: &mut BitReader) -> ExiResult<ExiHeader> {
    let had_cookie = reader.peek_bytes(4).map(|b| &b[..] == COOKIE).unwrap_or(false);
    if had_cookie {
        reader.read_byte_aligned(4)?;
    }
    let bits = reader.read_bits(2)?;
    if bits != DISTINGUISHING_BITS {
        return Err(ExiError::invalid_header("missing EXI distinguishing bits"));
    }
    let has_options = reader.read_bit()?;
    let is_preview_version = read_preview(reader)?;
    let version = read_version(reader)?;
    let options = if has_options { read_options(reader)? } else { ExiOptions::default() };
    if options.alignment != Alignment::BitPacked {
        reader.align_to_byte();
    }
    Ok(ExiHeader { had_cookie, is_preview_version, version, options })
}
