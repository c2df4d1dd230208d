//! Loops.
//!
//! Both loop forms go through [`Evaluator::eval_loop`], which lays a loop out
//! as one block:
//!
//! 1. `start` hook, then the induction sets, then the `pre_sets` hook
//! 2. `=> label top:`
//! 3. `in_loop` hook, then one `cmpjump c Bool(false) end` per condition
//! 4. the body, `jump top`, `=> label end:`
//!
//! `for-in` keeps the iterable in `Ra` and the index in `Ri`.

use gdlang_ast::{NodeId, NodeKind};
use gdlang_core::{GDObject, Ident, InternalError, Operation};
use tracing::trace;

use crate::cpu::Register;
use crate::ir::{Block, IrNode};

use super::{Evaluator, Result};

/// Labels of the loop being lowered.
pub(super) struct LoopLabels {
    pub top: Ident,
    pub end: Ident,
}

type Hook<'h, 'a> = Box<dyn FnOnce(&mut Evaluator<'a>, &LoopLabels, &mut Block) -> Result<()> + 'h>;

fn noop<'h, 'a>() -> Hook<'h, 'a> {
    Box::new(|_: &mut Evaluator<'a>, _: &LoopLabels, _: &mut Block| Ok(()))
}

impl<'a> Evaluator<'a> {
    /// Shared loop template.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn eval_loop(
        &mut self,
        id: NodeId,
        sets: &[NodeId],
        conds: &[NodeId],
        body: NodeId,
        start: Hook<'_, 'a>,
        pre_sets: Hook<'_, 'a>,
        in_loop: Hook<'_, 'a>,
        out: &mut Block,
    ) -> Result<()> {
        let span = self.span(id);
        let labels = LoopLabels {
            top: self.fresh(),
            end: self.fresh(),
        };
        self.loop_ends.insert(id, labels.end.clone());
        trace!(top = %labels.top, end = %labels.end, "loop labels");

        let mut block = Block::new();
        start(self, &labels, &mut block)?;
        for &set in sets {
            self.eval(set, &mut block)?;
        }
        pre_sets(self, &labels, &mut block)?;

        block.push(IrNode::label(labels.top.clone(), span));
        in_loop(self, &labels, &mut block)?;
        for &cond in conds {
            let value = self.eval_value(cond, &mut block)?;
            block.push(IrNode::compare_jump(
                value,
                IrNode::object(GDObject::Bool(false), span),
                labels.end.clone(),
                self.span(cond),
            ));
        }

        self.eval(body, &mut block)?;
        block.push(IrNode::jump(labels.top, span));
        block.push(IrNode::label(labels.end, span));
        out.push(IrNode::block(block, span));
        Ok(())
    }

    /// `for sets; conds; { body }`
    pub(super) fn eval_for_if(
        &mut self,
        id: NodeId,
        sets: Option<NodeId>,
        conds: &[NodeId],
        block: NodeId,
        out: &mut Block,
    ) -> Result<Option<IrNode>> {
        let sets: Vec<NodeId> = sets.into_iter().collect();
        self.eval_loop(id, &sets, conds, block, noop(), noop(), noop(), out)?;
        Ok(None)
    }

    /// `for key, value in expr { body }`
    pub(super) fn eval_for_in(
        &mut self,
        id: NodeId,
        key: Option<NodeId>,
        value: Option<NodeId>,
        expr: NodeId,
        block: NodeId,
        out: &mut Block,
    ) -> Result<Option<IrNode>> {
        let span = self.span(id);
        let ra = move || IrNode::register(Register::Ra, span);
        let ri = move || IrNode::register(Register::Ri, span);

        let key_target = key.map(|set| self.set_target(set)).transpose()?;
        let value_target = value.map(|set| self.set_target(set)).transpose()?;
        let sets: Vec<NodeId> = key.into_iter().chain(value).collect();

        let start: Hook<'_, 'a> = Box::new(move |ev: &mut Self, _: &LoopLabels, block: &mut Block| {
            let iterable = ev.eval_value(expr, block)?;
            block.push(IrNode::mov(ra(), iterable, span));
            block.push(IrNode::mov(ri(), IrNode::object(GDObject::Int(0), span), span));
            Ok(())
        });

        let in_loop: Hook<'_, 'a> = Box::new(move |_: &mut Self, labels: &LoopLabels, block: &mut Block| {
            block.push(IrNode::ilen(ra(), span));
            block.push(IrNode::op(Operation::Less, ri(), Some(Self::rpop()), span));
            block.push(IrNode::compare_jump(
                Self::rpop(),
                IrNode::object(GDObject::Bool(false), span),
                labels.end.clone(),
                span,
            ));
            if let Some(target) = value_target {
                block.push(IrNode::iget(ri(), true, ra(), span));
                block.push(IrNode::mov(target, Self::rpop(), span));
            }
            if let Some(target) = key_target {
                block.push(IrNode::mov(target, ri(), span));
            }
            let one = IrNode::object(GDObject::Int(1), span);
            block.push(IrNode::op(Operation::Add, ri(), Some(one), span));
            block.push(IrNode::mov(ri(), Self::rpop(), span));
            Ok(())
        });

        self.eval_loop(id, &sets, &[], block, start, noop(), in_loop, out)?;
        Ok(None)
    }

    /// The name a for-in target set binds.
    fn set_target(&self, set: NodeId) -> Result<IrNode> {
        match self.ast.kind(set) {
            NodeKind::Set { name, .. } => Ok(IrNode::id(self.ident_of(set, name)?, self.span(set))),
            _ => Err(self.unknown(set)),
        }
    }

    /// `break` jumps to the end label of the innermost loop.
    pub(super) fn eval_break(&mut self, id: NodeId, out: &mut Block) -> Result<Option<IrNode>> {
        let span = self.span(id);
        let end = self
            .ast
            .enclosing_loop(id)
            .and_then(|lp| self.loop_ends.get(&lp))
            .cloned()
            .ok_or(InternalError::BreakOutsideLoop { span })?;
        out.push(IrNode::jump(end, span));
        Ok(None)
    }
}
