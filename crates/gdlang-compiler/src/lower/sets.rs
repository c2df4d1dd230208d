//! Declarations, shared expressions, assignment and type aliases.

use gdlang_ast::{NodeId, NodeKind};
use gdlang_core::{GDObject, Ident};

use crate::cpu::Register;
use crate::ir::{Block, Discoverable, IrNode};

use super::{Evaluator, Result};

impl<'a> Evaluator<'a> {
    /// `[pub] [const] name = expr`
    pub(super) fn eval_set(&mut self, id: NodeId, out: &mut Block) -> Result<Option<IrNode>> {
        let ast = self.ast;
        let NodeKind::Set {
            is_pub,
            is_const,
            name,
            expr,
            index,
        } = ast.kind(id)
        else {
            return Err(self.unknown(id));
        };

        let value = match ast.kind(*expr) {
            NodeKind::SharedExpr { .. } => self.eval_shared(*expr, *index, out)?,
            _ => self.eval_value(*expr, out)?,
        };
        let ident = self.ident_of(id, name)?;
        let ty = self.type_of(id, "declared type")?;
        out.push(IrNode::set(
            Discoverable::new(*is_pub, *is_const, ident),
            ty,
            value,
            self.span(id),
        ));
        Ok(None)
    }

    /// Element `index` of a shared expression.
    ///
    /// The first use evaluates the expression into `Ra`; every use then
    /// indexes `Ra`.
    fn eval_shared(&mut self, shared: NodeId, index: usize, out: &mut Block) -> Result<IrNode> {
        let span = self.span(shared);
        let ra = self.eval_shared_whole(shared, out)?;
        let index = IrNode::object(GDObject::Int(index as i64), span);
        out.push(IrNode::iget(index, true, ra, span));
        Ok(Self::rpop())
    }

    /// The whole value of a shared expression, held in `Ra`.
    pub(super) fn eval_shared_whole(&mut self, shared: NodeId, out: &mut Block) -> Result<IrNode> {
        let ast = self.ast;
        let NodeKind::SharedExpr { expr, processed } = ast.kind(shared) else {
            return Err(self.unknown(shared));
        };
        let span = self.span(shared);
        if !processed.get() {
            let value = self.eval_value(*expr, out)?;
            out.push(IrNode::mov(IrNode::register(Register::Ra, span), value, span));
            processed.set(true);
        }
        Ok(IrNode::register(Register::Ra, span))
    }

    /// `lhs = rhs`: `ISet` for indexed targets, `ASet` for attributes and
    /// `Mov` for everything else.
    pub(super) fn eval_update(
        &mut self,
        id: NodeId,
        lhs: NodeId,
        rhs: NodeId,
        out: &mut Block,
    ) -> Result<Option<IrNode>> {
        let ast = self.ast;
        let span = self.span(id);
        match ast.kind(lhs) {
            NodeKind::Index { expr, index, .. } => {
                let target = self.eval_value(*expr, out)?;
                let index = self.eval_value(*index, out)?;
                let value = self.eval_value(rhs, out)?;
                out.push(IrNode::iset(index, target, value, span));
            }
            NodeKind::Dot {
                expr,
                name,
                nil_safe,
            } => {
                let target = self.eval_value(*expr, out)?;
                let ident = self.ident_of(lhs, name)?;
                let value = self.eval_value(rhs, out)?;
                out.push(IrNode::aset(*nil_safe, ident, target, value, span));
            }
            NodeKind::Ident { name } => {
                let target = IrNode::id(self.ident_of(lhs, name)?, self.span(lhs));
                let value = self.eval_value(rhs, out)?;
                out.push(IrNode::mov(target, value, span));
            }
            _ => {
                let target = self.eval_value(lhs, out)?;
                let value = self.eval_value(rhs, out)?;
                out.push(IrNode::mov(target, value, span));
            }
        }
        Ok(None)
    }

    /// `[pub] type name = T`
    pub(super) fn eval_type_alias(
        &mut self,
        id: NodeId,
        is_pub: bool,
        name: &str,
        out: &mut Block,
    ) -> Result<Option<IrNode>> {
        let ty = self.type_of(id, "aliased type")?;
        let disc = Discoverable::new(is_pub, true, Ident::new(name)?);
        out.push(IrNode::type_alias(disc, ty, self.span(id)));
        Ok(None)
    }
}
