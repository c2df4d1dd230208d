//! Bytecode offset to source position index.
//!
//! Mappings are recorded while bytecode is written, so offsets arrive in
//! non-decreasing order. When two nodes start at the same offset (a `Set`
//! and the first node of its expression, say) the first mapping is kept.

use std::collections::BTreeMap;

use gdlang_core::Span;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Current `.gdmap` format version.
pub const SOURCE_MAP_VERSION: u8 = 1;

/// One mapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// Bytecode offset.
    pub offset: u32,
    /// Index into [`SourceMap::sources`].
    pub file: u32,
    pub line: u32,
    pub col_start: u32,
    pub col_end: u32,
}

/// The source map of one compilation.
#[derive(Debug, Clone)]
pub struct SourceMap {
    version: u8,
    sources: Vec<String>,
    source_index: FxHashMap<String, u32>,
    mappings: Vec<Mapping>,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk JSON shape: `{version, sources, mappings: {"<offset>": [file, line, colStart, colEnd]}}`.
#[derive(Debug, Serialize, Deserialize)]
struct SourceMapFile {
    version: u8,
    sources: Vec<String>,
    mappings: BTreeMap<u32, [u32; 4]>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            version: SOURCE_MAP_VERSION,
            sources: Vec::new(),
            source_index: FxHashMap::default(),
            mappings: Vec::new(),
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Source file names; a mapping's `file` indexes this list.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Mappings in recording order.
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn source_index(&mut self, file_name: &str) -> u32 {
        if let Some(&index) = self.source_index.get(file_name) {
            return index;
        }
        let index = self.sources.len() as u32;
        self.sources.push(file_name.to_string());
        self.source_index.insert(file_name.to_string(), index);
        index
    }

    /// Record that the bytes at `offset` come from `span` in `file_name`.
    ///
    /// Invalid spans are ignored, and so is a second mapping for an offset
    /// that is already mapped. Returns whether an entry was added.
    pub fn add_mapping(&mut self, offset: usize, span: Span, file_name: &str) -> bool {
        if !span.is_valid() {
            return false;
        }
        let offset = offset as u32;
        if self.mappings.last().is_some_and(|last| last.offset >= offset) {
            return false;
        }
        let file = self.source_index(file_name);
        self.mappings.push(Mapping {
            offset,
            file,
            line: span.line,
            col_start: span.col,
            col_end: span.col_end(),
        });
        true
    }

    /// The mapping covering `offset`: the last entry at or before it.
    pub fn lookup(&self, offset: usize) -> Option<&Mapping> {
        let offset = offset as u32;
        let idx = self.mappings.partition_point(|m| m.offset <= offset);
        idx.checked_sub(1).map(|i| &self.mappings[i])
    }

    /// Exact entry at `offset`.
    pub fn get(&self, offset: usize) -> Option<&Mapping> {
        let offset = offset as u32;
        self.mappings
            .binary_search_by_key(&offset, |m| m.offset)
            .ok()
            .map(|i| &self.mappings[i])
    }

    /// Encode as `.gdmap` JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let file = SourceMapFile {
            version: self.version,
            sources: self.sources.clone(),
            mappings: self
                .mappings
                .iter()
                .map(|m| (m.offset, [m.file, m.line, m.col_start, m.col_end]))
                .collect(),
        };
        serde_json::to_string(&file)
    }

    /// Decode `.gdmap` JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let file: SourceMapFile = serde_json::from_str(json)?;
        let source_index = file
            .sources
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as u32))
            .collect();
        Ok(Self {
            version: file.version,
            sources: file.sources,
            source_index,
            mappings: file
                .mappings
                .into_iter()
                .map(|(offset, [file, line, col_start, col_end])| Mapping {
                    offset,
                    file,
                    line,
                    col_start,
                    col_end,
                })
                .collect(),
        })
    }
}
