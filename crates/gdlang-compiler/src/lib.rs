//! GDLang Compiler
//!
//! The back half of the GDLang toolchain: a checked AST goes in, VM bytecode
//! and a source map come out.
//!
//! ## Architecture
//!
//! - **Lowering**: [`Evaluator`] walks each checked unit and appends IR to the
//!   root [`Block`]
//! - **Emission**: the root block serializes itself through an [`IrContext`]
//!   that back-patches jump labels and records source positions
//!
//! ## Modules
//!
//! - [`bytecode`]: byte writer and reader
//! - [`compiler`]: pipeline facade and artifact writer
//! - [`cpu`]: opcodes and registers
//! - [`ident_gen`]: fresh label names
//! - [`ir`]: IR node model, emission and assembly listing
//! - [`lower`]: AST to IR lowering
//! - [`source_map`]: bytecode offset to source position table
//! - [`symbols`]: scoped symbol stack used during checking

pub mod bytecode;
pub mod compiler;
pub mod cpu;
pub mod ident_gen;
pub mod ir;
pub mod lower;
pub mod source_map;
pub mod symbols;

pub use bytecode::{ByteReader, ByteWriter};
pub use compiler::{BuildMode, Compilation, Compiler, CompilerOptions, Frontend, MAIN, lower_units};
pub use cpu::{OpCode, Register};
pub use ident_gen::{HashedIdents, IdentSource, SequentialIdents};
pub use ir::{Block, Discoverable, IrContext, IrKind, IrNode, Payload};
pub use lower::Evaluator;
pub use source_map::{Mapping, SOURCE_MAP_VERSION, SourceMap};
pub use symbols::{BUILTINS, Symbol, SymbolKind, SymbolStack};

// Re-export the error types from core for convenience
pub use gdlang_core::{CompileError, InternalError};
