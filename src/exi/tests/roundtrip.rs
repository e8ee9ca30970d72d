//! End-to-end tests driving `Encoder`/`Decoder` together through a
//! small XML event stream, complementing the per-module unit tests.

use bumpalo::Bump;
use exi::header::{ExiOptions, PreserveFlags};
use exi::{BitReader, BitWriter, Decoder, Encoder, ExiResult, EventSink};

#[derive(Debug, PartialEq, Clone)]
enum Recorded {
    StartDocument,
    EndDocument,
    StartElement(String, String),
    EndElement,
    Attribute(String, String, String),
    NamespaceDeclaration(String, String, bool),
    Characters(String),
    Comment(String),
    ProcessingInstruction(String, String),
    DocType(String, String, String, String),
}

#[derive(Default)]
struct Recorder {
    events: Vec<Recorded>,
}

impl EventSink for Recorder {
    fn start_document(&mut self) -> ExiResult<()> {
        self.events.push(Recorded::StartDocument);
        Ok(())
    }
    fn end_document(&mut self) -> ExiResult<()> {
        self.events.push(Recorded::EndDocument);
        Ok(())
    }
    fn start_element(&mut self, uri: &str, local_name: &str) -> ExiResult<()> {
        self.events.push(Recorded::StartElement(uri.to_string(), local_name.to_string()));
        Ok(())
    }
    fn end_element(&mut self) -> ExiResult<()> {
        self.events.push(Recorded::EndElement);
        Ok(())
    }
    fn attribute(&mut self, uri: &str, local_name: &str, value: &str) -> ExiResult<()> {
        self.events.push(Recorded::Attribute(uri.to_string(), local_name.to_string(), value.to_string()));
        Ok(())
    }
    fn namespace_declaration(&mut self, uri: &str, prefix: &str, is_local_element_ns: bool) -> ExiResult<()> {
        self.events.push(Recorded::NamespaceDeclaration(uri.to_string(), prefix.to_string(), is_local_element_ns));
        Ok(())
    }
    fn characters(&mut self, value: &str) -> ExiResult<()> {
        self.events.push(Recorded::Characters(value.to_string()));
        Ok(())
    }
    fn comment(&mut self, text: &str) -> ExiResult<()> {
        self.events.push(Recorded::Comment(text.to_string()));
        Ok(())
    }
    fn processing_instruction(&mut self, target: &str, data: &str) -> ExiResult<()> {
        self.events.push(Recorded::ProcessingInstruction(target.to_string(), data.to_string()));
        Ok(())
    }
    fn doctype(&mut self, name: &str, public_id: &str, system_id: &str, text: &str) -> ExiResult<()> {
        self.events.push(Recorded::DocType(name.to_string(), public_id.to_string(), system_id.to_string(), text.to_string()));
        Ok(())
    }
}

#[test]
fn header_only_roundtrip_with_cookie() {
    let options = ExiOptions::default();
    let mut w = BitWriter::new();
    exi::header::write_header(&mut w, true, false, 1, &options).unwrap();
    let bytes = w.finish().unwrap();

    let mut r = BitReader::new(&bytes);
    let header = exi::header::parse_header(&mut r).unwrap();
    assert!(header.had_cookie);
    assert!(!header.is_preview_version);
    assert_eq!(header.version, 1);
    assert_eq!(header.options, options);
}

#[test]
fn trivial_empty_element_roundtrips() {
    let arena = Bump::new();
    let options = ExiOptions::default();
    let mut encoder = Encoder::new(&arena, &options);
    let mut w = BitWriter::new();
    encoder.start_document().unwrap();
    encoder.start_element(&mut w, "urn:demo", "root").unwrap();
    encoder.end_element(&mut w).unwrap();
    encoder.end_document(&mut w).unwrap();
    let bytes = w.finish().unwrap();

    let decode_arena = Bump::new();
    let mut decoder = Decoder::new(&decode_arena, &options);
    let mut r = BitReader::new(&bytes);
    let mut sink = Recorder::default();
    decoder.decode_document(&mut r, &mut sink).unwrap();

    assert_eq!(
        sink.events,
        vec![
            Recorded::StartDocument,
            Recorded::StartElement("urn:demo".into(), "root".into()),
            Recorded::EndElement,
            Recorded::EndDocument,
        ]
    );
}

#[test]
fn attribute_and_characters_roundtrip() {
    let arena = Bump::new();
    let options = ExiOptions::default();
    let mut encoder = Encoder::new(&arena, &options);
    let mut w = BitWriter::new();
    encoder.start_document().unwrap();
    encoder.start_element(&mut w, "urn:demo", "widget").unwrap();
    encoder.attribute(&mut w, "", "id", "42").unwrap();
    encoder.characters(&mut w, "hello world").unwrap();
    encoder.end_element(&mut w).unwrap();
    encoder.end_document(&mut w).unwrap();
    let bytes = w.finish().unwrap();

    let decode_arena = Bump::new();
    let mut decoder = Decoder::new(&decode_arena, &options);
    let mut r = BitReader::new(&bytes);
    let mut sink = Recorder::default();
    decoder.decode_document(&mut r, &mut sink).unwrap();

    assert_eq!(
        sink.events,
        vec![
            Recorded::StartDocument,
            Recorded::StartElement("urn:demo".into(), "widget".into()),
            Recorded::Attribute("".into(), "id".into(), "42".into()),
            Recorded::Characters("hello world".into()),
            Recorded::EndElement,
            Recorded::EndDocument,
        ]
    );
}

/// A repeated child qname should be learned by the parent's grammar the
/// first time it appears (via the wildcard), then matched by a
/// dedicated production on every later occurrence - shrinking the
/// per-child production code width rather than growing it.
#[test]
fn repeated_child_element_shrinks_after_first_occurrence() {
    let arena = Bump::new();
    let options = ExiOptions::default();
    let mut encoder = Encoder::new(&arena, &options);
    let mut w = BitWriter::new();
    encoder.start_document().unwrap();
    encoder.start_element(&mut w, "urn:demo", "list").unwrap();
    for _ in 0..5 {
        encoder.start_element(&mut w, "urn:demo", "item").unwrap();
        encoder.end_element(&mut w).unwrap();
    }
    encoder.end_element(&mut w).unwrap();
    encoder.end_document(&mut w).unwrap();
    let bytes = w.finish().unwrap();

    let decode_arena = Bump::new();
    let mut decoder = Decoder::new(&decode_arena, &options);
    let mut r = BitReader::new(&bytes);
    let mut sink = Recorder::default();
    decoder.decode_document(&mut r, &mut sink).unwrap();

    let item_starts =
        sink.events.iter().filter(|e| matches!(e, Recorded::StartElement(_, n) if n == "item")).count();
    assert_eq!(item_starts, 5);
}

#[test]
fn namespace_declaration_preserved_when_requested() {
    let arena = Bump::new();
    let options = ExiOptions { preserve: PreserveFlags { prefixes: true, ..Default::default() }, ..Default::default() };
    let mut encoder = Encoder::new(&arena, &options);
    let mut w = BitWriter::new();
    encoder.start_document().unwrap();
    encoder.start_element(&mut w, "urn:demo", "root").unwrap();
    encoder.namespace_declaration(&mut w, "urn:demo", "d", true).unwrap();
    encoder.end_element(&mut w).unwrap();
    encoder.end_document(&mut w).unwrap();
    let bytes = w.finish().unwrap();

    let decode_arena = Bump::new();
    let mut decoder = Decoder::new(&decode_arena, &options);
    let mut r = BitReader::new(&bytes);
    let mut sink = Recorder::default();
    decoder.decode_document(&mut r, &mut sink).unwrap();

    assert!(sink.events.contains(&Recorded::NamespaceDeclaration("urn:demo".into(), "d".into(), true)));
}

#[test]
fn comments_and_processing_instructions_at_document_level() {
    let arena = Bump::new();
    let options = ExiOptions::default();
    let mut encoder = Encoder::new(&arena, &options);
    let mut w = BitWriter::new();
    encoder.start_document().unwrap();
    encoder.comment(&mut w, "top-level remark").unwrap();
    encoder.processing_instruction(&mut w, "target", "data").unwrap();
    encoder.start_element(&mut w, "", "root").unwrap();
    encoder.end_element(&mut w).unwrap();
    encoder.end_document(&mut w).unwrap();
    let bytes = w.finish().unwrap();

    let decode_arena = Bump::new();
    let mut decoder = Decoder::new(&decode_arena, &options);
    let mut r = BitReader::new(&bytes);
    let mut sink = Recorder::default();
    decoder.decode_document(&mut r, &mut sink).unwrap();

    assert_eq!(sink.events[1], Recorded::Comment("top-level remark".into()));
    assert_eq!(sink.events[2], Recorded::ProcessingInstruction("target".into(), "data".into()));
}

/// A `fill` callback that starves after the first pull, forcing
/// `BufferEndReached`, then supplies the rest on retry - the recovery
/// path a streaming caller is expected to use.
#[test]
fn buffer_end_is_recoverable_by_retrying_with_more_bytes() {
    let arena = Bump::new();
    let options = ExiOptions::default();
    let mut encoder = Encoder::new(&arena, &options);
    let mut w = BitWriter::new();
    encoder.start_document().unwrap();
    encoder.start_element(&mut w, "urn:demo", "root").unwrap();
    encoder.end_element(&mut w).unwrap();
    encoder.end_document(&mut w).unwrap();
    let bytes = w.finish().unwrap();

    let (first_half, second_half) = bytes.split_at(bytes.len().min(2));
    let mut remaining = second_half.to_vec();
    let fill: Box<dyn FnMut(&mut [u8]) -> usize> = Box::new(move |scratch: &mut [u8]| -> usize {
        if remaining.is_empty() {
            return 0;
        }
        let n = remaining.len().min(scratch.len());
        scratch[..n].copy_from_slice(&remaining[..n]);
        remaining.drain(..n);
        n
    });
    let mut reader = BitReader::with_fill(first_half, Some(fill));

    let decode_arena = Bump::new();
    let mut decoder = Decoder::new(&decode_arena, &options);
    let mut sink = Recorder::default();
    let result = decoder.decode_document(&mut reader, &mut sink);
    assert!(result.is_ok(), "decoding should recover across the fill boundary: {result:?}");
    assert_eq!(sink.events.last(), Some(&Recorded::EndDocument));
}
