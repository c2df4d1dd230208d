//! Operators, collection mutation and casts.

use gdlang_ast::NodeId;
use gdlang_core::{CollectionOperation, Operation};

use crate::ir::{Block, IrNode};

use super::{Evaluator, Result};

impl<'a> Evaluator<'a> {
    pub(super) fn eval_binary(
        &mut self,
        id: NodeId,
        op: Operation,
        left: NodeId,
        right: NodeId,
        out: &mut Block,
    ) -> Result<IrNode> {
        let left = self.eval_value(left, out)?;
        let right = self.eval_value(right, out)?;
        out.push(IrNode::op(op, left, Some(right), self.span(id)));
        Ok(Self::rpop())
    }

    pub(super) fn eval_unary(
        &mut self,
        id: NodeId,
        op: Operation,
        expr: NodeId,
        out: &mut Block,
    ) -> Result<IrNode> {
        let operand = self.eval_value(expr, out)?;
        out.push(IrNode::op(op, operand, None, self.span(id)));
        Ok(Self::rpop())
    }

    /// `c << v` / `c >> v`
    pub(super) fn eval_collection(
        &mut self,
        id: NodeId,
        op: CollectionOperation,
        target: NodeId,
        value: NodeId,
        out: &mut Block,
    ) -> Result<Option<IrNode>> {
        let target = self.eval_value(target, out)?;
        let value = self.eval_value(value, out)?;
        out.push(IrNode::collection_op(op, target, value, self.span(id)));
        Ok(None)
    }

    /// `e as T`
    ///
    /// Named references are cast by the VM. Anything else was already
    /// narrowed by the checker; when it left no value behind the cast is
    /// still emitted.
    pub(super) fn eval_cast(&mut self, id: NodeId, expr: NodeId, out: &mut Block) -> Result<IrNode> {
        let span = self.span(id);
        let value = self.eval_value(expr, out)?;
        let ty = self.type_of(id, "cast type")?;
        match self.ast.inferred_object(id) {
            Some(object) if !value.is_named_reference() => {
                return Ok(IrNode::object(object.clone(), span));
            }
            _ => {}
        }
        out.push(IrNode::cast(ty, value, span));
        Ok(Self::rpop())
    }
}
