//! The body codec: `Encoder`/`Decoder` drive the grammar engine over
//! an XML event sequence, delegating qname resolution to `strings`
//! and typed payloads to `value` (spec.md §4.6).
//!
//! Grounded on the teacher's `PeParser::read` top-level driver loop,
//! generalized from "read a fixed sequence of file sections" to "read
//! productions until `ParsingComplete`."

mod qname;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{ExiError, ExiResult};
use crate::grammar::{EventKind, GrammarStack};
use crate::strings::{CompactId, StringTable};
use crate::value;

/// Receives decoded events in document order. Each method may return
/// `Err(ExiError::HandlerStop)` to end decoding early without it being
/// treated as a stream-format failure.
pub trait EventSink {
    fn start_document(&mut self) -> ExiResult<()>;
    fn end_document(&mut self) -> ExiResult<()>;
    fn start_element(&mut self, uri: &str, local_name: &str) -> ExiResult<()>;
    fn end_element(&mut self) -> ExiResult<()>;
    fn attribute(&mut self, uri: &str, local_name: &str, value: &str) -> ExiResult<()>;
    fn namespace_declaration(&mut self, uri: &str, prefix: &str, is_local_element_ns: bool) -> ExiResult<()>;
    fn characters(&mut self, value: &str) -> ExiResult<()>;
    fn comment(&mut self, text: &str) -> ExiResult<()>;
    fn processing_instruction(&mut self, target: &str, data: &str) -> ExiResult<()>;
    fn doctype(&mut self, name: &str, public_id: &str, system_id: &str, text: &str) -> ExiResult<()>;
}

fn doc_content_events() -> [EventKind; 4] {
    [EventKind::Comment, EventKind::ProcessingInstruction, EventKind::DocType, EventKind::StartElement]
}

fn doc_end_events() -> [EventKind; 3] {
    [EventKind::Comment, EventKind::ProcessingInstruction, EventKind::EndDocument]
}

fn doc_alternatives(state: crate::grammar::DocState) -> Vec<EventKind> {
    match state {
        crate::grammar::DocState::Content => doc_content_events().to_vec(),
        crate::grammar::DocState::End => doc_end_events().to_vec(),
    }
}

/// Looks up existing (never-inserting) ids for `(uri, local)`, useful
/// to check whether a grammar may already hold a learned production
/// for this exact qname.
fn existing_qname<'arena>(table: &StringTable<'arena>, uri: &str, local: &str) -> Option<(CompactId, CompactId)> {
    let uri_id = table.find_uri(uri)?;
    let local_id = table.find_local_name(uri_id, local).ok()??;
    Some((uri_id, local_id))
}

pub struct Encoder<'arena> {
    table: StringTable<'arena>,
    stack: GrammarStack,
}

impl<'arena> Encoder<'arena> {
    pub fn new(arena: &'arena bumpalo::Bump, options: &crate::header::ExiOptions) -> Self {
        Self { table: StringTable::setup(arena, options), stack: GrammarStack::new() }
    }

    /// The `$EXI` body has no bits for Start Document - it is implicit
    /// at the position right after the header.
    pub fn start_document(&mut self) -> ExiResult<()> {
        Ok(())
    }

    fn encode_doc_event(&mut self, writer: &mut BitWriter, event: EventKind) -> ExiResult<()> {
        let alts = doc_alternatives(self.stack.doc_state());
        let idx = alts
            .iter()
            .position(|&e| e == event)
            .ok_or_else(|| ExiError::InconsistentProcState(format!("{event:?} not valid at document level here")))?;
        writer.write_bits(idx as u64, crate::grammar::code_width(alts.len() as u32))
    }

    pub fn end_document(&mut self, writer: &mut BitWriter) -> ExiResult<()> {
        self.encode_doc_event(writer, EventKind::EndDocument)
    }

    pub fn start_element(&mut self, writer: &mut BitWriter, uri: &str, local_name: &str) -> ExiResult<()> {
        if self.stack.depth() == 0 {
            self.encode_doc_event(writer, EventKind::StartElement)?;
            let uri_id = qname::encode_uri(writer, &mut self.table, uri)?;
            let local_id = qname::encode_local_name(writer, &mut self.table, uri_id, local_name)?;
            self.stack.push_element((uri_id, local_id));
            return Ok(());
        }
        let qname_opt = existing_qname(&self.table, uri, local_name);
        let production_id = self
            .stack
            .find_in_current_element(EventKind::StartElement, qname_opt)
            .ok_or_else(|| ExiError::InconsistentProcState("no matching SE production".into()))?;
        let width = self.stack.current_log().unwrap_or(0);
        writer.write_bits(production_id as u64, width)?;
        let production = self.stack.production_at(production_id);
        let (uri_id, local_id) = match production.and_then(|p| p.qname) {
            Some(ids) => ids,
            None => {
                let uri_id = qname::encode_uri(writer, &mut self.table, uri)?;
                let local_id = qname::encode_local_name(writer, &mut self.table, uri_id, local_name)?;
                (uri_id, local_id)
            }
        };
        self.stack.apply(EventKind::StartElement, Some((uri_id, local_id)), production_id);
        self.stack.push_element((uri_id, local_id));
        Ok(())
    }

    pub fn end_element(&mut self, writer: &mut BitWriter) -> ExiResult<()> {
        let production_id = self
            .stack
            .find_in_current_element(EventKind::EndElement, None)
            .ok_or_else(|| ExiError::InconsistentProcState("no matching EE production".into()))?;
        let width = self.stack.current_log().unwrap_or(0);
        writer.write_bits(production_id as u64, width)?;
        self.stack.apply(EventKind::EndElement, None, production_id);
        self.stack.pop_element();
        Ok(())
    }

    pub fn attribute(&mut self, writer: &mut BitWriter, uri: &str, local_name: &str, value: &str) -> ExiResult<()> {
        let qname_opt = existing_qname(&self.table, uri, local_name);
        let production_id = self
            .stack
            .find_in_current_element(EventKind::Attribute, qname_opt)
            .ok_or_else(|| ExiError::InconsistentProcState("no matching AT production".into()))?;
        let width = self.stack.current_log().unwrap_or(0);
        writer.write_bits(production_id as u64, width)?;
        let production = self.stack.production_at(production_id);
        let (uri_id, local_id) = match production.and_then(|p| p.qname) {
            Some(ids) => ids,
            None => {
                let uri_id = qname::encode_uri(writer, &mut self.table, uri)?;
                let local_id = qname::encode_local_name(writer, &mut self.table, uri_id, local_name)?;
                (uri_id, local_id)
            }
        };
        self.stack.apply(EventKind::Attribute, Some((uri_id, local_id)), production_id);
        value::string::encode(writer, &mut self.table, uri_id, local_id, value)
    }

    pub fn namespace_declaration(
        &mut self,
        writer: &mut BitWriter,
        uri: &str,
        prefix: &str,
        is_local_element_ns: bool,
    ) -> ExiResult<()> {
        let production_id = self
            .stack
            .find_in_current_element(EventKind::NamespaceDeclaration, None)
            .ok_or_else(|| ExiError::InconsistentProcState("no matching NS production".into()))?;
        let width = self.stack.current_log().unwrap_or(0);
        writer.write_bits(production_id as u64, width)?;
        self.stack.apply(EventKind::NamespaceDeclaration, None, production_id);
        let uri_id = qname::encode_uri(writer, &mut self.table, uri)?;
        qname::encode_prefix(writer, &mut self.table, uri_id, prefix)?;
        writer.write_bit(is_local_element_ns)
    }

    pub fn characters(&mut self, writer: &mut BitWriter, value: &str) -> ExiResult<()> {
        let production_id = self
            .stack
            .find_in_current_element(EventKind::Characters, None)
            .ok_or_else(|| ExiError::InconsistentProcState("no matching CH production".into()))?;
        let width = self.stack.current_log().unwrap_or(0);
        writer.write_bits(production_id as u64, width)?;
        self.stack.apply(EventKind::Characters, None, production_id);
        let (uri_id, local_id) =
            self.stack.current_key().ok_or_else(|| ExiError::InconsistentProcState("characters outside any element".into()))?;
        value::string::encode(writer, &mut self.table, uri_id, local_id, value)
    }

    pub fn comment(&mut self, writer: &mut BitWriter, text: &str) -> ExiResult<()> {
        if self.stack.depth() == 0 {
            self.encode_doc_event(writer, EventKind::Comment)?;
        } else {
            let production_id = self
                .stack
                .find_in_current_element(EventKind::Comment, None)
                .ok_or_else(|| ExiError::InconsistentProcState("no matching comment production".into()))?;
            let width = self.stack.current_log().unwrap_or(0);
            writer.write_bits(production_id as u64, width)?;
            self.stack.apply(EventKind::Comment, None, production_id);
        }
        qname::write_literal(writer, text)
    }

    pub fn processing_instruction(&mut self, writer: &mut BitWriter, target: &str, data: &str) -> ExiResult<()> {
        if self.stack.depth() == 0 {
            self.encode_doc_event(writer, EventKind::ProcessingInstruction)?;
        } else {
            let production_id = self
                .stack
                .find_in_current_element(EventKind::ProcessingInstruction, None)
                .ok_or_else(|| ExiError::InconsistentProcState("no matching PI production".into()))?;
            let width = self.stack.current_log().unwrap_or(0);
            writer.write_bits(production_id as u64, width)?;
            self.stack.apply(EventKind::ProcessingInstruction, None, production_id);
        }
        qname::write_literal(writer, target)?;
        qname::write_literal(writer, data)
    }

    pub fn doctype(&mut self, writer: &mut BitWriter, name: &str, public_id: &str, system_id: &str, text: &str) -> ExiResult<()> {
        self.encode_doc_event(writer, EventKind::DocType)?;
        qname::write_literal(writer, name)?;
        qname::write_literal(writer, public_id)?;
        qname::write_literal(writer, system_id)?;
        qname::write_literal(writer, text)
    }
}

pub struct Decoder<'arena> {
    table: StringTable<'arena>,
    stack: GrammarStack,
}

impl<'arena> Decoder<'arena> {
    pub fn new(arena: &'arena bumpalo::Bump, options: &crate::header::ExiOptions) -> Self {
        Self { table: StringTable::setup(arena, options), stack: GrammarStack::new() }
    }

    fn decode_doc_event(&mut self, reader: &mut BitReader) -> ExiResult<EventKind> {
        let alts = doc_alternatives(self.stack.doc_state());
        let idx = reader.read_bits(crate::grammar::code_width(alts.len() as u32))? as usize;
        alts.get(idx).copied().ok_or_else(|| ExiError::invalid_input("document event code out of range"))
    }

    /// Decodes the whole document, dispatching to `sink` in order.
    /// Returns once `EndDocument` has been delivered.
    pub fn decode_document(&mut self, reader: &mut BitReader, sink: &mut dyn EventSink) -> ExiResult<()> {
        sink.start_document()?;
        loop {
            match self.decode_one(reader, sink) {
                Ok(()) => continue,
                Err(ExiError::ParsingComplete) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    fn decode_one(&mut self, reader: &mut BitReader, sink: &mut dyn EventSink) -> ExiResult<()> {
        if self.stack.depth() == 0 {
            return self.decode_at_document_level(reader, sink);
        }
        let width = self.stack.current_log().unwrap_or(0);
        let production_id = reader.read_bits(width)? as u32;
        let production = self
            .stack
            .production_at(production_id)
            .ok_or_else(|| ExiError::invalid_input("production id out of range"))?;
        match production.event {
            EventKind::Attribute => {
                let (uri_id, local_id) = self.resolve_qname(reader, production.qname)?;
                let value = crate::value::string::decode(reader, &mut self.table, uri_id, local_id)?.to_string();
                self.stack.apply(EventKind::Attribute, Some((uri_id, local_id)), production_id);
                let uri = self.table.get_uri(uri_id).unwrap_or("").to_string();
                let local = self.local_name_str(uri_id, local_id)?;
                sink.attribute(&uri, &local, &value)
            }
            EventKind::NamespaceDeclaration => {
                let uri_id = qname::decode_uri(reader, &mut self.table)?;
                let prefix = qname::decode_prefix(reader, &mut self.table, uri_id)?.to_string();
                let is_local = reader.read_bit()?;
                self.stack.apply(EventKind::NamespaceDeclaration, None, production_id);
                let uri = self.table.get_uri(uri_id).unwrap_or("").to_string();
                sink.namespace_declaration(&uri, &prefix, is_local)
            }
            EventKind::StartElement => {
                let (uri_id, local_id) = self.resolve_qname(reader, production.qname)?;
                self.stack.apply(EventKind::StartElement, Some((uri_id, local_id)), production_id);
                self.stack.push_element((uri_id, local_id));
                let uri = self.table.get_uri(uri_id).unwrap_or("").to_string();
                let local = self.local_name_str(uri_id, local_id)?;
                sink.start_element(&uri, &local)
            }
            EventKind::Characters => {
                let (uri_id, local_id) = self
                    .stack
                    .current_key()
                    .ok_or_else(|| ExiError::InconsistentProcState("characters outside any element".into()))?;
                let value = crate::value::string::decode(reader, &mut self.table, uri_id, local_id)?.to_string();
                self.stack.apply(EventKind::Characters, None, production_id);
                sink.characters(&value)
            }
            EventKind::EndElement => {
                self.stack.apply(EventKind::EndElement, None, production_id);
                self.stack.pop_element();
                sink.end_element()
            }
            EventKind::Comment => {
                let text = qname::read_literal(reader)?;
                self.stack.apply(EventKind::Comment, None, production_id);
                sink.comment(&text)
            }
            EventKind::ProcessingInstruction => {
                let target = qname::read_literal(reader)?;
                let data = qname::read_literal(reader)?;
                self.stack.apply(EventKind::ProcessingInstruction, None, production_id);
                sink.processing_instruction(&target, &data)
            }
            other => Err(ExiError::InconsistentProcState(format!("{other:?} not valid in element content"))),
        }
    }

    fn decode_at_document_level(&mut self, reader: &mut BitReader, sink: &mut dyn EventSink) -> ExiResult<()> {
        let event = self.decode_doc_event(reader)?;
        match event {
            EventKind::Comment => {
                let text = qname::read_literal(reader)?;
                sink.comment(&text)
            }
            EventKind::ProcessingInstruction => {
                let target = qname::read_literal(reader)?;
                let data = qname::read_literal(reader)?;
                sink.processing_instruction(&target, &data)
            }
            EventKind::DocType => {
                let name = qname::read_literal(reader)?;
                let public_id = qname::read_literal(reader)?;
                let system_id = qname::read_literal(reader)?;
                let text = qname::read_literal(reader)?;
                sink.doctype(&name, &public_id, &system_id, &text)
            }
            EventKind::StartElement => {
                let uri_id = qname::decode_uri(reader, &mut self.table)?;
                let local_id = qname::decode_local_name(reader, &mut self.table, uri_id)?;
                self.stack.push_element((uri_id, local_id));
                let uri = self.table.get_uri(uri_id).unwrap_or("").to_string();
                let local = self.local_name_str(uri_id, local_id)?;
                sink.start_element(&uri, &local)
            }
            EventKind::EndDocument => {
                sink.end_document()?;
                Err(ExiError::ParsingComplete)
            }
            other => Err(ExiError::InconsistentProcState(format!("{other:?} not valid at document level"))),
        }
    }

    fn resolve_qname(
        &mut self,
        reader: &mut BitReader,
        learned: Option<(CompactId, CompactId)>,
    ) -> ExiResult<(CompactId, CompactId)> {
        match learned {
            Some(ids) => Ok(ids),
            None => {
                let uri_id = qname::decode_uri(reader, &mut self.table)?;
                let local_id = qname::decode_local_name(reader, &mut self.table, uri_id)?;
                Ok((uri_id, local_id))
            }
        }
    }

    fn local_name_str(&self, uri_id: CompactId, local_id: CompactId) -> ExiResult<String> {
        Ok(self
            .table
            .get_local_name(uri_id, local_id)?
            .map(|e| e.local_name.to_string())
            .unwrap_or_default())
    }
}
