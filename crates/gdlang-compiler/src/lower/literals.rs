//! Literals, name references and iterable literals.

use gdlang_ast::{NodeId, NodeKind};
use gdlang_core::{GDObject, InternalError};

use crate::ir::{Block, IrNode};

use super::{Evaluator, Result};

impl<'a> Evaluator<'a> {
    /// A literal becomes the value the checker inferred for it.
    pub(super) fn eval_literal(&mut self, id: NodeId) -> Result<IrNode> {
        let object = self
            .ast
            .inferred_object(id)
            .cloned()
            .ok_or(InternalError::MissingInference {
                what: "literal value",
                span: self.span(id),
            })?;
        Ok(IrNode::object(object, self.span(id)))
    }

    /// A name becomes a reference to its resolved ident. The fallback is the
    /// value the checker computed for it, or nil.
    pub(super) fn eval_ident(&mut self, id: NodeId, name: &str) -> Result<IrNode> {
        let ident = self.ident_of(id, name)?;
        let fallback = self.ast.inferred_object(id).cloned().unwrap_or(GDObject::Nil);
        Ok(IrNode::object(
            GDObject::IdObject(ident, Box::new(fallback)),
            self.span(id),
        ))
    }

    /// Tuple and array literals.
    pub(super) fn eval_iterable(
        &mut self,
        id: NodeId,
        exprs: &[NodeId],
        out: &mut Block,
    ) -> Result<IrNode> {
        let ty = self.type_of(id, "iterable type")?;
        let mut nodes = Vec::with_capacity(exprs.len());
        for &expr in exprs {
            nodes.push(self.eval_value(expr, out)?);
        }
        Ok(IrNode::iterable(ty, nodes, self.span(id)))
    }

    /// Struct literals: the attribute expressions, in declaration order.
    pub(super) fn eval_struct(
        &mut self,
        id: NodeId,
        attrs: &[NodeId],
        out: &mut Block,
    ) -> Result<IrNode> {
        let ast = self.ast;
        let ty = self.type_of(id, "struct type")?;
        let mut nodes = Vec::with_capacity(attrs.len());
        for &attr in attrs {
            let expr = match ast.kind(attr) {
                NodeKind::StructAttr { expr, .. } => *expr,
                _ => attr,
            };
            nodes.push(self.eval_value(expr, out)?);
        }
        Ok(IrNode::iterable(ty, nodes, self.span(id)))
    }
}
