//! Unified error types for GDLang compilation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompileError (top-level)
//! ├── Syntax          - parse errors surfaced by the AST builder (joined)
//! ├── Semantic        - static checker findings (joined)
//! ├── PackageNotFound - package path did not resolve
//! ├── Io              - reading sources or writing artifacts failed
//! └── Internal        - compiler invariant violations (InternalError)
//! ```
//!
//! User-facing failures render as `<code>: <message> at <file>:<line>:<col>`
//! through [`Diagnostic`]; internal errors are programmer errors and only
//! show up when the compiler itself is broken.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::{Ident, Span};

// ============================================================================
// Diagnostics
// ============================================================================

/// A single user-facing finding from the front end or the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Short machine-readable code, e.g. `E0102`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// File the finding belongs to.
    pub file: String,
    /// Location within `file`.
    pub span: Span,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            file: file.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}:{}:{}",
            self.code, self.message, self.file, self.span.line, self.span.col
        )
    }
}

impl std::error::Error for Diagnostic {}

/// A joinable list of diagnostics.
///
/// Phases that keep going after a finding (parsing, static checking)
/// collect everything here and fail once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Append every diagnostic from `other`.
    pub fn join(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was reported, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Diagnostics> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Diagnostics(vec![diagnostic])
    }
}

// ============================================================================
// Internal Errors
// ============================================================================

/// Compiler invariant violations.
///
/// None of these can be caused by a well-formed, checked program; they mean
/// a front-end or compiler bug and are reported with enough context to find it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InternalError {
    /// The lowering pass met an AST node it has no rule for.
    #[error("no lowering rule for {kind} node at {span}")]
    UnknownNode { kind: &'static str, span: Span },

    /// A label was registered twice in one compilation.
    #[error("label '{label}' defined twice")]
    DuplicateLabel { label: Ident },

    /// Emission finished with jumps whose labels were never defined.
    #[error("undefined labels after emission: {}", .labels.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(", "))]
    DanglingMarks { labels: Vec<Ident> },

    /// A string ident does not fit its one-byte length prefix.
    #[error("identifier of {len} bytes exceeds the 255 byte limit")]
    IdentTooLong { len: usize },

    /// The static checker left a slot empty that lowering depends on.
    #[error("missing inferred {what} at {span}")]
    MissingInference { what: &'static str, span: Span },

    /// An expression position lowered to nothing.
    #[error("{kind} node at {span} produced no value")]
    NoValue { kind: &'static str, span: Span },

    /// `break` with no enclosing loop.
    #[error("break outside of a loop at {span}")]
    BreakOutsideLoop { span: Span },

    /// A label position does not fit the 16-bit jump operand.
    #[error("label '{label}' at offset {offset} is out of 16-bit range")]
    LabelOutOfRange { label: Ident, offset: usize },

    /// A block body does not fit the 16-bit length prefix.
    #[error("block of {len} bytes exceeds the 16-bit length prefix")]
    BlockTooLarge { len: usize },

    /// A scanner token has no grammar mapping.
    #[error("token '{token}' has no grammar mapping")]
    UnmappedToken { token: String },

    /// Decoding met a byte that is not a type code.
    #[error("unknown type code {code:#04x} at offset {offset}")]
    UnknownTypeCode { code: u8, offset: usize },

    /// Decoding met a byte that is not an opcode.
    #[error("unknown opcode {code:#04x} at offset {offset}")]
    UnknownOpcode { code: u8, offset: usize },

    /// Decoding ran past the end of the buffer.
    #[error("unexpected end of bytecode at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Decoding met an encoded value that cannot be represented.
    #[error("invalid encoding at offset {offset}: {detail}")]
    InvalidEncoding { offset: usize, detail: String },
}

// ============================================================================
// Compile Errors
// ============================================================================

/// Any failure of a compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Parse errors, joined.
    #[error("{0}")]
    Syntax(Diagnostics),

    /// Static checker findings, joined.
    #[error("{0}")]
    Semantic(Diagnostics),

    /// A package path did not resolve to anything on disk.
    #[error("package not found: {}", .path.display())]
    PackageNotFound { path: PathBuf },

    /// An I/O operation failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A compiler invariant was violated.
    #[error("internal compiler error: {0}")]
    Internal(#[from] InternalError),
}

impl CompileError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a compiler bug rather than a problem with the input.
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

/// Render an error the way the command-line front ends print it: the
/// message only, without a trailing newline.
pub fn report(err: &CompileError) -> String {
    err.to_string().trim_end_matches('\n').to_string()
}
