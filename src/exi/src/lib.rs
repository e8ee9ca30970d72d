//! A schema-less EXI (Efficient XML Interchange) binary codec core:
//! bit-level I/O, the typed value primitives, the header, the string
//! table, the built-in grammar engine, and the body codec that drives
//! all of them over an XML event stream.

pub mod bitstream;
pub mod body;
pub mod diagnostic;
pub mod error;
pub mod grammar;
pub mod header;
pub mod strings;
pub mod value;

pub use bitstream::{BitReader, BitWriter};
pub use body::{Decoder, Encoder, EventSink};
pub use error::{ExiError, ExiResult, StreamPos};
pub use header::{Alignment, ExiHeader, ExiOptions, PreserveFlags};
