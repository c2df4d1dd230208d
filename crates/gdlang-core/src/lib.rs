//! GDLang core vocabulary.
//!
//! Types shared by every stage of the compiler:
//!
//! - [`Span`] and [`FileSet`] - source positions and file registry
//! - [`Ident`] - tagged identifiers (register byte, compact number, short string)
//! - [`Typable`] and [`TypeCode`] - static types and their wire codes
//! - [`GDObject`] - concrete values
//! - [`Operation`], [`CollectionOperation`], [`UseMode`] - operator enums
//! - [`CompileError`], [`InternalError`], [`Diagnostic`] - the error hierarchy

mod error;
mod ident;
mod object;
mod operation;
mod span;
mod types;

pub use error::{CompileError, Diagnostic, Diagnostics, InternalError, report};
pub use ident::{Ident, IdentMode};
pub use object::{GDArray, GDObject, GDStruct};
pub use operation::{CollectionOperation, Operation, UseMode};
pub use span::{FileId, FileSet, Span};
pub use types::{LambdaArg, LambdaType, StructField, TypeCode, Typable};
