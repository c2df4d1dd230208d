//! Bytecode emission for IR nodes.
//!
//! Operand order is fixed by what the VM decodes. Anything the VM pops off
//! its stack (the operands of `Op` and `Tif`, iterable members) is written
//! in reverse so that popping yields source order.

use gdlang_core::{CollectionOperation, FileSet, GDObject, InternalError, Typable};

use crate::bytecode::ByteWriter;
use crate::cpu::OpCode;
use crate::source_map::SourceMap;

use super::{Block, Discoverable, IrContext, IrKind, IrNode, Payload};

type Result<T> = std::result::Result<T, InternalError>;

impl IrNode {
    /// Write this node's bytecode.
    pub fn emit_bytecode(&self, code: &mut ByteWriter, ctx: &mut IrContext<'_>) -> Result<()> {
        ctx.add_mapping(code.len(), self.span);

        match &self.kind {
            IrKind::Object { ty, payload } => emit_object(ty, payload, code, ctx)?,
            IrKind::Set { disc, ty, expr } => {
                code.write_op(OpCode::Set);
                write_discoverable(code, disc)?;
                code.write_type(ty)?;
                expr.emit_bytecode(code, ctx)?;
            }
            IrKind::TypeAlias { disc, ty } => {
                code.write_op(OpCode::TypeAlias);
                write_discoverable(code, disc)?;
                code.write_type(ty)?;
            }
            IrKind::Mov { target, value } => {
                code.write_op(OpCode::Mov);
                target.emit_bytecode(code, ctx)?;
                value.emit_bytecode(code, ctx)?;
            }
            IrKind::Op { op, left, right } => {
                code.write_op(OpCode::Operation);
                code.write_u8((*op).into());
                match right {
                    Some(right) => right.emit_bytecode(code, ctx)?,
                    None => code.write_object(&GDObject::Nil)?,
                }
                left.emit_bytecode(code, ctx)?;
            }
            IrKind::CollectionOp { op, left, right } => {
                code.write_op(match op {
                    CollectionOperation::Add => OpCode::CAdd,
                    CollectionOperation::Remove => OpCode::CRemove,
                });
                left.emit_bytecode(code, ctx)?;
                right.emit_bytecode(code, ctx)?;
            }
            IrKind::IGet {
                idx,
                nil_safe,
                expr,
            } => {
                code.write_op(OpCode::IGet);
                code.write_bool(*nil_safe);
                idx.emit_bytecode(code, ctx)?;
                expr.emit_bytecode(code, ctx)?;
            }
            IrKind::ISet { idx, expr, value } => {
                code.write_op(OpCode::CSet);
                idx.emit_bytecode(code, ctx)?;
                expr.emit_bytecode(code, ctx)?;
                value.emit_bytecode(code, ctx)?;
            }
            IrKind::ILen { expr } => {
                code.write_op(OpCode::ILen);
                expr.emit_bytecode(code, ctx)?;
            }
            IrKind::AGet {
                ident,
                nil_safe,
                expr,
            } => {
                code.write_op(OpCode::AGet);
                code.write_bool(*nil_safe);
                expr.emit_bytecode(code, ctx)?;
                code.write_ident(ident)?;
            }
            IrKind::ASet {
                nil_safe,
                ident,
                expr,
                value,
            } => {
                code.write_op(OpCode::ASet);
                code.write_bool(*nil_safe);
                code.write_ident(ident)?;
                expr.emit_bytecode(code, ctx)?;
                value.emit_bytecode(code, ctx)?;
            }
            IrKind::Cast { ty, expr } => {
                code.write_op(OpCode::CastObj);
                code.write_type(ty)?;
                expr.emit_bytecode(code, ctx)?;
            }
            IrKind::Call { callee, args } => {
                code.write_op(OpCode::Call);
                callee.emit_bytecode(code, ctx)?;
                args.emit_bytecode(code, ctx)?;
            }
            IrKind::TernaryIf { cond, then, els } => {
                code.write_op(OpCode::Tif);
                els.emit_bytecode(code, ctx)?;
                then.emit_bytecode(code, ctx)?;
                cond.emit_bytecode(code, ctx)?;
            }
            IrKind::CompareJump {
                expr,
                equals_to,
                label,
            } => {
                code.write_op(OpCode::CompareJump);
                expr.emit_bytecode(code, ctx)?;
                equals_to.emit_bytecode(code, ctx)?;
                let at = code.reserve_u16();
                ctx.add_mark(code, at, label.clone());
            }
            IrKind::Jump { label } => {
                code.write_op(OpCode::Jump);
                let at = code.reserve_u16();
                ctx.add_mark(code, at, label.clone());
            }
            IrKind::Label { ident } => {
                let offset = code.len();
                ctx.add_label(code, offset, ident.clone())?;
            }
            IrKind::Lambda { ty, block } => {
                code.write_op(OpCode::Lambda);
                code.write_type(&Typable::Lambda(ty.clone()))?;
                block.emit_bytecode(code, ctx)?;
            }
            IrKind::Block(block) => block.emit_bytecode(code, ctx)?,
            IrKind::Ret { expr } => {
                code.write_op(OpCode::Ret);
                expr.emit_bytecode(code, ctx)?;
            }
            IrKind::Use {
                mode,
                package,
                imports,
            } => {
                code.write_op(OpCode::Use);
                code.write_u8((*mode).into());
                code.write_ident(package)?;
                code.write_u8(count(imports.len(), code.len())?);
                for import in imports {
                    code.write_ident(import)?;
                }
            }
        }
        Ok(())
    }
}

impl Block {
    /// Write the block framed as `BBegin <len> body BEnd`.
    ///
    /// The length covers the body plus the `BEnd` byte.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit_bytecode(&self, code: &mut ByteWriter, ctx: &mut IrContext<'_>) -> Result<()> {
        code.write_op(OpCode::BBegin);
        let len_at = code.reserve_u16();
        let start = code.len();
        for node in &self.nodes {
            node.emit_bytecode(code, ctx)?;
        }
        let len = code.len() - start + 1;
        let framed = u16::try_from(len).map_err(|_| InternalError::BlockTooLarge { len })?;
        code.write_u16_at(len_at, framed);
        code.write_op(OpCode::BEnd);
        Ok(())
    }

    /// Emit the block as a complete program and close the context.
    ///
    /// Fails if any jump is left without its label.
    pub fn to_bytecode(&self, files: &FileSet) -> Result<(Vec<u8>, SourceMap)> {
        let mut code = ByteWriter::new();
        let mut ctx = IrContext::new(files);
        self.emit_bytecode(&mut code, &mut ctx)?;
        let source_map = ctx.finish()?;
        Ok((code.into_bytes(), source_map))
    }
}

fn count(len: usize, offset: usize) -> Result<u8> {
    u8::try_from(len).map_err(|_| InternalError::InvalidEncoding {
        offset,
        detail: format!("{} entries exceed the u8 count", len),
    })
}

fn write_discoverable(code: &mut ByteWriter, disc: &Discoverable) -> Result<()> {
    code.write_bool(disc.is_pub);
    code.write_bool(disc.is_const);
    code.write_ident(&disc.ident)
}

fn emit_object(
    ty: &Typable,
    payload: &Payload,
    code: &mut ByteWriter,
    ctx: &mut IrContext<'_>,
) -> Result<()> {
    match payload {
        Payload::Object(object) => code.write_object(object),
        Payload::Node(inner) => {
            code.write_type(ty)?;
            inner.emit_bytecode(code, ctx)
        }
        Payload::Nodes(nodes) => {
            code.write_type(ty)?;
            code.write_u8(count(nodes.len(), code.len())?);
            for node in nodes.iter().rev() {
                node.emit_bytecode(code, ctx)?;
            }
            Ok(())
        }
    }
}
