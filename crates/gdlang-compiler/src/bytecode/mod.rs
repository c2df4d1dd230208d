//! Bytecode encoding.
//!
//! - [`ByteWriter`] - append-only buffer with the primitive encoders and
//!   16-bit back-patching
//! - [`ByteReader`] - the matching decoder, used by tooling and tests

mod reader;
mod writer;

pub use reader::ByteReader;
pub use writer::ByteWriter;
