//! Source location tracking for diagnostics and source maps.
//!
//! Provides [`Span`] to track where AST nodes (and the IR derived from them)
//! originate, and [`FileSet`] to give every source file a stable index.

use std::fmt;
use std::sync::RwLock;

use rustc_hash::FxHashMap;

/// Index of a file registered in a [`FileSet`].
///
/// `FileId(0)` is reserved for "no file" so that a zeroed span is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub u32);

impl FileId {
    /// The reserved "no file" id.
    pub const NONE: FileId = FileId(0);

    /// Whether this id refers to a registered file.
    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != 0
    }
}

/// A span of source code.
///
/// Lines and columns are 1-indexed. The default value (all zeroes) is the
/// invalid position sentinel: it is never written to a source map.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// File the span belongs to.
    pub file: FileId,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// The zero/invalid position.
    pub const NONE: Span = Span {
        file: FileId::NONE,
        line: 0,
        col: 0,
        len: 0,
    };

    /// Create a new span.
    #[inline]
    pub fn new(file: FileId, line: u32, col: u32, len: u32) -> Self {
        Self {
            file,
            line,
            col,
            len,
        }
    }

    /// Whether this span points at a real source location.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.file.is_some() && self.line != 0
    }

    /// Column one past the last byte covered by the span.
    #[inline]
    pub fn col_end(&self) -> u32 {
        self.col + self.len
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.0, self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Default)]
struct FileTable {
    names: Vec<String>,
    index: FxHashMap<String, FileId>,
}

/// Registry of source files seen during a compilation.
///
/// Registration goes through an internal lock so front-end stages that
/// register files from different places can share one set by reference.
#[derive(Debug, Default)]
pub struct FileSet {
    table: RwLock<FileTable>,
}

impl FileSet {
    /// Create an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning its id. Registering the same name twice
    /// returns the id handed out the first time.
    pub fn add(&self, name: &str) -> FileId {
        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        if let Some(&id) = table.index.get(name) {
            return id;
        }
        table.names.push(name.to_string());
        let id = FileId(table.names.len() as u32);
        table.index.insert(name.to_string(), id);
        id
    }

    /// Name of a registered file.
    pub fn name(&self, id: FileId) -> Option<String> {
        if !id.is_some() {
            return None;
        }
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        table.names.get(id.0 as usize - 1).cloned()
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(|e| e.into_inner()).names.len()
    }

    /// Whether no file has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
