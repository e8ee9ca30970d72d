//! The diagnostic surface (spec.md §6 diagnostic interface, §7 user-visible
//! failure policy).
//!
//! This is independent of the `log` crate output used internally for
//! trace/debug/warn level detail: the diagnostic `Sink` is the
//! caller-facing, line-oriented error report. The first error aborts the
//! current operation; the codec never tries to re-synchronize a stream
//! after a failure.

use std::fmt::Write as _;

use crate::error::{ExiError, StreamPos};

/// A single character sink for line-oriented diagnostic text.
///
/// Borrowed non-exclusively: writes within one codec instance are
/// sequential, so `&self` is sufficient and callers may share a sink
/// across an encoder and its matching decoder in a round-trip test.
pub trait Sink {
    fn write_line(&self, line: &str);
}

/// A `Sink` that appends to an in-memory buffer, useful in tests and for
/// embedding applications that want the text without wiring up I/O.
#[derive(Default)]
pub struct BufferSink {
    lines: std::cell::RefCell<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl Sink for BufferSink {
    fn write_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// A `Sink` that writes to stderr, one line per error.
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_line(&self, line: &str) {
        eprintln!("{line}");
    }
}

fn position_of(err: &ExiError) -> Option<StreamPos> {
    match err {
        ExiError::OutOfBoundBuffer { pos, .. }
        | ExiError::InvalidExiHeader { pos, .. }
        | ExiError::InvalidExiInput { pos, .. }
        | ExiError::BufferEndReached { pos } => *pos,
        _ => None,
    }
}

fn error_name(err: &ExiError) -> &'static str {
    match err {
        ExiError::NotImplemented(_) => "NotImplemented",
        ExiError::Unexpected(_) => "Unexpected",
        ExiError::OutOfBoundBuffer { .. } => "OutOfBoundBuffer",
        ExiError::NullReference(_) => "NullReference",
        ExiError::MemoryAllocationError(_) => "MemoryAllocationError",
        ExiError::InvalidExiHeader { .. } => "InvalidExiHeader",
        ExiError::InconsistentProcState(_) => "InconsistentProcState",
        ExiError::InvalidExiInput { .. } => "InvalidExiInput",
        ExiError::BufferEndReached { .. } => "BufferEndReached",
        ExiError::ParsingComplete => "ParsingComplete",
        ExiError::InvalidExiConfiguration(_) => "InvalidExiConfiguration",
        ExiError::NoPrefixesPreservedXmlSchema => "NoPrefixesPreservedXmlSchema",
        ExiError::InvalidStringOperation(_) => "InvalidStringOperation",
        ExiError::HeaderOptionsMismatch(_) => "HeaderOptionsMismatch",
        ExiError::HandlerStop => "HandlerStop",
    }
}

/// Reports `err` to `sink` as one line: error name, offset if known, and
/// the contextual message.
pub fn report(sink: &dyn Sink, err: &ExiError) {
    let mut line = String::new();
    let _ = write!(line, "{}", error_name(err));
    if let Some(pos) = position_of(err) {
        let _ = write!(line, " at byte {} bit {}", pos.byte, pos.bit);
    }
    let _ = write!(line, ": {err}");
    sink.write_line(&line);
    log::warn!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_one_line_with_offset() {
        let sink = BufferSink::new();
        report(&sink, &ExiError::invalid_input_at("bad varint", StreamPos::new(12, 3)));
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("InvalidExiInput at byte 12 bit 3"));
    }

    #[test]
    fn reports_without_offset_when_unknown() {
        let sink = BufferSink::new();
        report(&sink, &ExiError::HandlerStop);
        let lines = sink.lines();
        assert_eq!(lines[0], "HandlerStop: handler requested early termination");
    }
}
