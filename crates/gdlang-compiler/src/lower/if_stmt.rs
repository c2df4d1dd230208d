//! `if` / `else if` / `else` chains and the ternary operator.
//!
//! A chain lowers to a row of guards followed by the labeled bodies:
//!
//! ```text
//! cmpjump c1 Bool(true) L1
//! cmpjump c2 Bool(true) L2
//! begin            ; else body, reached when no guard jumped
//! jump end
//! => label L1:
//! begin            ; first body
//! jump end
//! => label L2:
//! begin            ; second body
//! => label end:
//! ```

use gdlang_ast::{NodeId, NodeKind};
use gdlang_core::{GDObject, Ident};

use crate::ir::{Block, IrNode};

use super::{Evaluator, Result};

impl<'a> Evaluator<'a> {
    pub(super) fn eval_if(&mut self, id: NodeId, out: &mut Block) -> Result<Option<IrNode>> {
        let ast = self.ast;
        let NodeKind::If {
            else_ifs,
            else_block,
            ..
        } = ast.kind(id)
        else {
            return Err(self.unknown(id));
        };
        let span = self.span(id);
        let end = self.fresh();

        let mut branches: Vec<(Ident, NodeId)> = Vec::with_capacity(else_ifs.len() + 1);
        for &branch in std::iter::once(&id).chain(else_ifs) {
            let NodeKind::If { conds, block, .. } = ast.kind(branch) else {
                return Err(self.unknown(branch));
            };
            let label = self.fresh();
            for &cond in conds {
                let value = self.eval_value(cond, out)?;
                out.push(IrNode::compare_jump(
                    value,
                    IrNode::object(GDObject::Bool(true), span),
                    label.clone(),
                    self.span(cond),
                ));
            }
            branches.push((label, *block));
        }

        if let Some(els) = else_block {
            self.eval(*els, out)?;
        }
        out.push(IrNode::jump(end.clone(), span));

        let last = branches.len() - 1;
        for (i, (label, block)) in branches.into_iter().enumerate() {
            out.push(IrNode::label(label, span));
            self.eval(block, out)?;
            if i != last {
                out.push(IrNode::jump(end.clone(), span));
            }
        }
        out.push(IrNode::label(end, span));
        Ok(None)
    }

    /// `c ? t : e`
    pub(super) fn eval_ternary(
        &mut self,
        id: NodeId,
        cond: NodeId,
        then: NodeId,
        els: NodeId,
        out: &mut Block,
    ) -> Result<IrNode> {
        let cond = self.eval_value(cond, out)?;
        let then = self.eval_value(then, out)?;
        let els = self.eval_value(els, out)?;
        out.push(IrNode::ternary(cond, then, els, self.span(id)));
        Ok(Self::rpop())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use gdlang_ast::AstBuilder;
    use gdlang_core::{FileId, GDObject, Typable};

    fn stmt(b: &mut AstBuilder, name: &str) -> gdlang_ast::NodeId {
        let v = b.literal(GDObject::Int(1));
        let set = b.set(name, Typable::Int, v);
        b.block(vec![set])
    }

    #[test]
    fn if_else_if_else_layout() {
        let mut b = AstBuilder::new(FileId(1));
        let a = b.ident("a");
        let x = stmt(&mut b, "x");
        let cond_b = b.ident("b");
        let y = stmt(&mut b, "y");
        let else_if = b.else_if(vec![cond_b], y);
        let z = stmt(&mut b, "z");
        let chain = b.if_chain(vec![a], x, vec![else_if], Some(z));
        let ast = b.finish();

        let (block, result) = lower(&ast, chain);
        assert!(result.is_none());
        assert_eq!(
            lines(&block),
            vec![
                "cmpjump $a Bool(true) L1",
                "cmpjump $b Bool(true) L2",
                "begin (1 nodes)",
                "jump L0",
                "=> label L1:",
                "begin (1 nodes)",
                "jump L0",
                "=> label L2:",
                "begin (1 nodes)",
                "=> label L0:",
            ]
        );
    }

    #[test]
    fn every_guard_condition_jumps() {
        let mut b = AstBuilder::new(FileId(1));
        let p = b.ident("p");
        let q = b.ident("q");
        let body = b.block(vec![]);
        let chain = b.if_chain(vec![p, q], body, vec![], None);
        let ast = b.finish();

        let (block, _) = lower(&ast, chain);
        assert_eq!(
            lines(&block),
            vec![
                "cmpjump $p Bool(true) L1",
                "cmpjump $q Bool(true) L1",
                "jump L0",
                "=> label L1:",
                "begin (0 nodes)",
                "=> label L0:",
            ]
        );
    }

    #[test]
    fn ternary_yields_rpop() {
        let mut b = AstBuilder::new(FileId(1));
        let c = b.literal(GDObject::Bool(true));
        let t = b.literal(GDObject::String("ok".into()));
        let e = b.literal(GDObject::String("no".into()));
        let tern = b.ternary(c, t, e);
        let ast = b.finish();

        let (block, result) = lower(&ast, tern);
        assert_eq!(
            lines(&block),
            vec![r#"tif Bool(true) String("ok") String("no")"#]
        );
        assert_eq!(result.unwrap().to_string(), "RPop");
    }
}
