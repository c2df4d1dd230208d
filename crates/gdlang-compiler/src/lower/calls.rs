//! Calls, indexing, attribute access and spread arguments.

use gdlang_ast::NodeId;

use crate::ir::{Block, IrNode};

use super::{Evaluator, Result};

impl<'a> Evaluator<'a> {
    /// `f(args...)`: arguments travel as an `Array(Any)` iterable.
    pub(super) fn eval_call(
        &mut self,
        id: NodeId,
        callee: NodeId,
        args: &[NodeId],
        out: &mut Block,
    ) -> Result<IrNode> {
        let span = self.span(id);
        let callee = self.eval_value(callee, out)?;
        let mut values = Vec::with_capacity(args.len());
        for &arg in args {
            values.push(self.eval_value(arg, out)?);
        }
        out.push(IrNode::call(callee, IrNode::args(values, span), span));
        Ok(Self::rpop())
    }

    /// `a[i]` / `a?[i]`
    pub(super) fn eval_index(
        &mut self,
        id: NodeId,
        expr: NodeId,
        index: NodeId,
        nil_safe: bool,
        out: &mut Block,
    ) -> Result<IrNode> {
        let target = self.eval_value(expr, out)?;
        let index = self.eval_value(index, out)?;
        out.push(IrNode::iget(index, nil_safe, target, self.span(id)));
        Ok(Self::rpop())
    }

    /// `a.b` / `a?.b`
    pub(super) fn eval_dot(
        &mut self,
        id: NodeId,
        expr: NodeId,
        name: &str,
        nil_safe: bool,
        out: &mut Block,
    ) -> Result<IrNode> {
        let target = self.eval_value(expr, out)?;
        let ident = self.ident_of(id, name)?;
        out.push(IrNode::aget(ident, nil_safe, target, self.span(id)));
        Ok(Self::rpop())
    }

    /// `xs...` wraps the iterable so the VM expands it in place.
    pub(super) fn eval_spread(&mut self, id: NodeId, expr: NodeId, out: &mut Block) -> Result<IrNode> {
        let ty = self
            .type_of(id, "spread type")
            .or_else(|_| self.type_of(expr, "spread type"))?;
        let inner = self.eval_value(expr, out)?;
        Ok(IrNode::wrapped(ty, inner, self.span(id)))
    }
}
