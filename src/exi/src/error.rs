//! The closed error taxonomy shared by every layer of the codec.
//!
//! Leaf functions return `Result<T, ExiError>`; call sites propagate with
//! `?`. There is no exception-based control flow anywhere in this crate.

use thiserror::Error;

/// Position in the stream an error was observed at, when known.
///
/// `byte` is the byte offset from the start of the buffer; `bit` is the
/// bit offset within that byte (0-7, MSB-first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamPos {
    pub byte: u64,
    pub bit: u8,
}

impl StreamPos {
    pub fn new(byte: u64, bit: u8) -> Self {
        Self { byte, bit }
    }
}

/// The complete set of error kinds the codec can raise.
///
/// This is a closed taxonomy: every variant corresponds to one named
/// kind. `ParsingComplete` is not a failure - callers use it as a
/// control signal meaning "successful end of stream."
#[derive(Debug, Error)]
pub enum ExiError {
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("unexpected internal error: {0}")]
    Unexpected(String),

    #[error("out of bound buffer access at {pos:?}: {message}")]
    OutOfBoundBuffer { message: String, pos: Option<StreamPos> },

    #[error("required pointer was absent: {0}")]
    NullReference(&'static str),

    #[error("allocator failed: {0}")]
    MemoryAllocationError(String),

    #[error("invalid EXI header at {pos:?}: {message}")]
    InvalidExiHeader { message: String, pos: Option<StreamPos> },

    #[error("encoder/decoder state did not match event: {0}")]
    InconsistentProcState(String),

    #[error("invalid EXI input at {pos:?}: {message}")]
    InvalidExiInput { message: String, pos: Option<StreamPos> },

    #[error("buffer end reached at {pos:?}")]
    BufferEndReached { pos: Option<StreamPos> },

    /// Not an error: successful end-of-stream, used as a control signal.
    #[error("parsing complete")]
    ParsingComplete,

    #[error("invalid EXI configuration: {0}")]
    InvalidExiConfiguration(String),

    #[error("schema-qname value present without preserve.prefixes")]
    NoPrefixesPreservedXmlSchema,

    #[error("invalid string operation: {0}")]
    InvalidStringOperation(String),

    #[error("mutually exclusive options set: {0}")]
    HeaderOptionsMismatch(String),

    #[error("handler requested early termination")]
    HandlerStop,
}

impl ExiError {
    pub fn out_of_bound(message: impl Into<String>) -> Self {
        ExiError::OutOfBoundBuffer { message: message.into(), pos: None }
    }

    pub fn out_of_bound_at(message: impl Into<String>, pos: StreamPos) -> Self {
        ExiError::OutOfBoundBuffer { message: message.into(), pos: Some(pos) }
    }

    pub fn invalid_header(message: impl Into<String>) -> Self {
        ExiError::InvalidExiHeader { message: message.into(), pos: None }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ExiError::InvalidExiInput { message: message.into(), pos: None }
    }

    pub fn invalid_input_at(message: impl Into<String>, pos: StreamPos) -> Self {
        ExiError::InvalidExiInput { message: message.into(), pos: Some(pos) }
    }

    pub fn buffer_end() -> Self {
        ExiError::BufferEndReached { pos: None }
    }

    pub fn buffer_end_at(pos: StreamPos) -> Self {
        ExiError::BufferEndReached { pos: Some(pos) }
    }

    /// True when this is the `BufferEndReached` control error - the one
    /// kind a streaming caller is expected to recover from by supplying
    /// more bytes/room and retrying (spec.md §5, §7).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExiError::BufferEndReached { .. })
    }
}

pub type ExiResult<T> = Result<T, ExiError>;
