use gdlang_ast::{NodeId, NodeKind};
use gdlang_core::Ident;
use tracing::trace;

use crate::ir::{Block, IrNode};

use super::{Evaluator, Result};

impl<'a> Evaluator<'a> {
    /// `use a.b.c { x, y }`. Foreign packages are bound by the host and emit
    /// nothing.
    pub(super) fn eval_use(&mut self, id: NodeId, out: &mut Block) -> Result<Option<IrNode>> {
        let ast = self.ast;
        let NodeKind::Use {
            path,
            resolved,
            imports,
            mode,
        } = ast.kind(id)
        else {
            return Err(self.unknown(id));
        };
        if !mode.is_emitted() {
            trace!(package = %path.join("."), "skipping foreign package");
            return Ok(None);
        }
        let imports = imports
            .iter()
            .map(Ident::new)
            .collect::<Result<Vec<_>>>()?;
        out.push(IrNode::use_package(
            *mode,
            Ident::new(resolved)?,
            imports,
            self.span(id),
        ));
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use gdlang_ast::AstBuilder;
    use gdlang_core::{FileId, UseMode};

    #[test]
    fn builtin_and_source_packages_are_emitted() {
        let mut b = AstBuilder::new(FileId(1));
        let math = b.use_package(&["std", "math"], "std/math", &["sqrt", "pi"], UseMode::Builtin);
        let local = b.use_package(&["shapes"], "src/shapes", &[], UseMode::Source);
        let ast = b.finish();

        let (block, result) = lower(&ast, math);
        assert!(result.is_none());
        assert_eq!(lines(&block), vec!["use builtin std/math sqrt pi"]);
        let (block, _) = lower(&ast, local);
        assert_eq!(lines(&block), vec!["use source src/shapes"]);
    }

    #[test]
    fn foreign_packages_emit_nothing() {
        let mut b = AstBuilder::new(FileId(1));
        let ffi = b.use_package(&["gl"], "libgl", &["draw"], UseMode::Foreign);
        let ast = b.finish();

        let (block, _) = lower(&ast, ffi);
        assert!(block.is_empty());
    }
}
