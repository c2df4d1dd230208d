//! Per-compilation emission state: source map, labels and pending jump patches.

use gdlang_core::{FileId, FileSet, Ident, InternalError, Span};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::bytecode::ByteWriter;
use crate::source_map::SourceMap;

type Result<T> = std::result::Result<T, InternalError>;

/// A jump operand waiting for its label.
#[derive(Debug, Clone, PartialEq)]
struct Mark {
    /// Offset of the two reserved bytes.
    offset: usize,
    label: Ident,
}

/// State shared by every node while one IR tree is emitted.
///
/// Labels resolve to absolute offsets in the buffer being written. A jump to
/// a label that is already known is patched on the spot; otherwise it is kept
/// as a mark until [`IrContext::add_label`] sees the label.
#[derive(Debug)]
pub struct IrContext<'a> {
    files: &'a FileSet,
    file_names: FxHashMap<FileId, String>,
    source_map: SourceMap,
    label_offsets: FxHashMap<Ident, u16>,
    marks: Vec<Mark>,
}

impl<'a> IrContext<'a> {
    pub fn new(files: &'a FileSet) -> Self {
        Self {
            files,
            file_names: FxHashMap::default(),
            source_map: SourceMap::new(),
            label_offsets: FxHashMap::default(),
            marks: Vec::new(),
        }
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Offset of a registered label.
    pub fn label_offset(&self, label: &Ident) -> Option<u16> {
        self.label_offsets.get(label).copied()
    }

    /// Number of jumps still waiting for their label.
    pub fn pending_marks(&self) -> usize {
        self.marks.len()
    }

    /// Record where the bytes at `offset` came from.
    ///
    /// Spans whose file is not registered in the file set are skipped along
    /// with invalid ones.
    pub fn add_mapping(&mut self, offset: usize, span: Span) {
        if !span.is_valid() {
            return;
        }
        if !self.file_names.contains_key(&span.file) {
            let Some(name) = self.files.name(span.file) else {
                return;
            };
            self.file_names.insert(span.file, name);
        }
        if let Some(name) = self.file_names.get(&span.file) {
            self.source_map.add_mapping(offset, span, name);
        }
    }

    /// Ask for the two bytes at `offset` to hold the offset of `label`.
    ///
    /// Returns `true` when the label was already known and the bytes were
    /// patched immediately.
    pub fn add_mark(&mut self, code: &mut ByteWriter, offset: usize, label: Ident) -> bool {
        if let Some(target) = self.label_offset(&label) {
            code.write_u16_at(offset, target);
            return true;
        }
        self.marks.push(Mark { offset, label });
        false
    }

    /// Register `label` at `offset` and patch every mark waiting for it.
    pub fn add_label(&mut self, code: &mut ByteWriter, offset: usize, label: Ident) -> Result<()> {
        if self.label_offsets.contains_key(&label) {
            return Err(InternalError::DuplicateLabel { label });
        }
        let target = u16::try_from(offset).map_err(|_| InternalError::LabelOutOfRange {
            label: label.clone(),
            offset,
        })?;
        self.label_offsets.insert(label, target);
        self.resolve_marks(code);
        Ok(())
    }

    fn resolve_marks(&mut self, code: &mut ByteWriter) {
        let labels = &self.label_offsets;
        self.marks.retain(|mark| match labels.get(&mark.label) {
            Some(&target) => {
                trace!(label = %mark.label, at = mark.offset, target, "patched jump");
                code.write_u16_at(mark.offset, target);
                false
            }
            None => true,
        });
    }

    /// Close emission: every jump must have found its label.
    pub fn finish(self) -> Result<SourceMap> {
        if !self.marks.is_empty() {
            return Err(InternalError::DanglingMarks {
                labels: self.marks.into_iter().map(|m| m.label).collect(),
            });
        }
        Ok(self.source_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::OpCode;

    fn label(name: &str) -> Ident {
        Ident::new(name).unwrap()
    }

    #[test]
    fn forward_jump_resolves_on_label() {
        let files = FileSet::new();
        let mut ctx = IrContext::new(&files);
        let mut code = ByteWriter::new();

        code.write_op(OpCode::Jump);
        let at = code.reserve_u16();
        assert!(!ctx.add_mark(&mut code, at, label("L")));
        code.write_op(OpCode::BBegin);
        code.write_op(OpCode::BEnd);

        ctx.add_label(&mut code, 1, label("L")).unwrap();
        assert_eq!(&code.code()[1..3], &[0x01, 0x00]);
        assert_eq!(ctx.pending_marks(), 0);
        assert!(ctx.finish().is_ok());
    }

    #[test]
    fn backward_jump_patches_immediately() {
        let files = FileSet::new();
        let mut ctx = IrContext::new(&files);
        let mut code = ByteWriter::new();
        code.write_op(OpCode::BBegin);
        ctx.add_label(&mut code, 1, label("top")).unwrap();
        assert_eq!(ctx.label_offset(&label("top")), Some(1));
        assert_eq!(ctx.label_offset(&label("end")), None);

        code.write_op(OpCode::Jump);
        let at = code.reserve_u16();
        assert!(ctx.add_mark(&mut code, at, label("top")));
        assert_eq!(&code.code()[at..at + 2], &[0x01, 0x00]);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let files = FileSet::new();
        let mut ctx = IrContext::new(&files);
        let mut code = ByteWriter::new();
        ctx.add_label(&mut code, 0, label("L")).unwrap();
        assert_eq!(
            ctx.add_label(&mut code, 4, label("L")),
            Err(InternalError::DuplicateLabel { label: label("L") })
        );
    }

    #[test]
    fn several_marks_for_one_label() {
        let files = FileSet::new();
        let mut ctx = IrContext::new(&files);
        let mut code = ByteWriter::new();
        let a = code.reserve_u16();
        let b = code.reserve_u16();
        ctx.add_mark(&mut code, a, label("end"));
        ctx.add_mark(&mut code, b, label("end"));
        ctx.add_mark(&mut code, b, label("other"));
        assert_eq!(ctx.pending_marks(), 3);

        ctx.add_label(&mut code, 4, label("end")).unwrap();
        assert_eq!(ctx.pending_marks(), 1);
        assert_eq!(code.code(), &[4, 0, 4, 0]);
    }

    #[test]
    fn dangling_marks_fail_finish() {
        let files = FileSet::new();
        let mut ctx = IrContext::new(&files);
        let mut code = ByteWriter::new();
        let at = code.reserve_u16();
        ctx.add_mark(&mut code, at, label("nowhere"));
        assert_eq!(
            ctx.finish().unwrap_err(),
            InternalError::DanglingMarks {
                labels: vec![label("nowhere")]
            }
        );
    }

    #[test]
    fn label_past_u16_is_out_of_range() {
        let files = FileSet::new();
        let mut ctx = IrContext::new(&files);
        let mut code = ByteWriter::new();
        assert!(matches!(
            ctx.add_label(&mut code, 70_000, label("far")),
            Err(InternalError::LabelOutOfRange { offset: 70_000, .. })
        ));
    }

    #[test]
    fn mappings_use_registered_file_names() {
        let files = FileSet::new();
        let main = files.add("main.gd");
        let mut ctx = IrContext::new(&files);
        ctx.add_mapping(0, Span::new(main, 1, 1, 4));
        ctx.add_mapping(2, Span::NONE);
        ctx.add_mapping(3, Span::new(FileId(99), 1, 1, 1));

        let map = ctx.finish().unwrap();
        assert_eq!(map.sources(), &["main.gd".to_string()]);
        assert_eq!(map.len(), 1);
    }
}
