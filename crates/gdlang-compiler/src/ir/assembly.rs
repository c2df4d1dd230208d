//! Assembly text for `.gdasm` debug artifacts.
//!
//! One instruction per line. Blocks and lambda bodies indent by
//! [`INDENT`] spaces; labels sit on a dedented line as `=> label <ident>:`.

use std::fmt::{self, Write};

use crate::cpu::{OpCode, Register};

use super::{Block, Discoverable, IrKind, IrNode, Payload};

/// Indentation step for nested blocks.
pub const INDENT: usize = 2;

fn line(out: &mut String, indent: usize, text: impl fmt::Display) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{:indent$}{}", "", text, indent = indent);
}

impl Block {
    /// Render the block as assembly text.
    pub fn assembly(&self) -> String {
        let mut out = String::new();
        self.write_assembly(&mut out, 0);
        out
    }

    pub fn write_assembly(&self, out: &mut String, indent: usize) {
        line(out, indent, OpCode::BBegin.name());
        for node in &self.nodes {
            node.write_assembly(out, indent + INDENT);
        }
        line(out, indent, OpCode::BEnd.name());
    }
}

impl IrNode {
    pub fn write_assembly(&self, out: &mut String, indent: usize) {
        match &self.kind {
            IrKind::Label { .. } => line(out, indent.saturating_sub(INDENT), self),
            IrKind::Block(block) => block.write_assembly(out, indent),
            IrKind::Lambda { ty, block } => {
                line(out, indent, format_args!("{} {}", OpCode::Lambda.name(), ty));
                block.write_assembly(out, indent + INDENT);
            }
            _ => line(out, indent, self),
        }
    }
}

impl fmt::Display for Discoverable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pub {
            f.write_str("pub ")?;
        }
        if self.is_const {
            f.write_str("const ")?;
        }
        write!(f, "{}", self.ident)
    }
}

fn nil_safe(flag: bool) -> &'static str {
    if flag { "?" } else { "" }
}

/// Single-line form, used for instructions and for operands.
impl fmt::Display for IrNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic().unwrap_or_default();
        match &self.kind {
            IrKind::Object { ty, payload } => match payload {
                Payload::Object(object) => match Register::of_object(object) {
                    Some(register) => write!(f, "{}", register),
                    None => write!(f, "{}", object),
                },
                Payload::Node(inner) => write!(f, "{}:{}", ty, inner),
                Payload::Nodes(nodes) => {
                    write!(f, "{}{{", ty)?;
                    for (i, node) in nodes.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", node)?;
                    }
                    f.write_str("}")
                }
            },
            IrKind::Set { disc, ty, expr } => write!(f, "{} {} {} {}", name, disc, ty, expr),
            IrKind::TypeAlias { disc, ty } => write!(f, "{} {} {}", name, disc, ty),
            IrKind::Mov { target, value } => write!(f, "{} {} {}", name, target, value),
            IrKind::Op { op, left, right } => match right {
                Some(right) => write!(f, "{} {} {} {}", name, op, left, right),
                None => write!(f, "{} {} {}", name, op, left),
            },
            IrKind::CollectionOp { left, right, .. } => write!(f, "{} {} {}", name, left, right),
            IrKind::IGet {
                idx,
                nil_safe: safe,
                expr,
            } => write!(f, "{}{} {} {}", name, nil_safe(*safe), idx, expr),
            IrKind::ISet { idx, expr, value } => write!(f, "{} {} {} {}", name, idx, expr, value),
            IrKind::ILen { expr } => write!(f, "{} {}", name, expr),
            IrKind::AGet {
                ident,
                nil_safe: safe,
                expr,
            } => write!(f, "{}{} {} {}", name, nil_safe(*safe), expr, ident),
            IrKind::ASet {
                nil_safe: safe,
                ident,
                expr,
                value,
            } => write!(f, "{}{} {} {} {}", name, nil_safe(*safe), expr, ident, value),
            IrKind::Cast { ty, expr } => write!(f, "{} {} {}", name, ty, expr),
            IrKind::Call { callee, args } => write!(f, "{} {} {}", name, callee, args),
            IrKind::TernaryIf { cond, then, els } => write!(f, "{} {} {} {}", name, cond, then, els),
            IrKind::CompareJump {
                expr,
                equals_to,
                label,
            } => write!(f, "{} {} {} {}", name, expr, equals_to, label),
            IrKind::Jump { label } => write!(f, "{} {}", name, label),
            IrKind::Label { ident } => write!(f, "=> {} {}:", OpCode::Label.name(), ident),
            IrKind::Lambda { ty, block } => write!(f, "{} {} ({} nodes)", name, ty, block.len()),
            IrKind::Block(block) => write!(f, "{} ({} nodes)", name, block.len()),
            IrKind::Ret { expr } => write!(f, "{} {}", name, expr),
            IrKind::Use {
                mode,
                package,
                imports,
            } => {
                write!(f, "{} {} {}", name, mode.name(), package)?;
                for import in imports {
                    write!(f, " {}", import)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdlang_core::{GDObject, Ident, LambdaType, Operation, Span, Typable};

    fn ident(name: &str) -> Ident {
        Ident::new(name).unwrap()
    }

    #[test]
    fn labels_are_dedented() {
        let block = Block::from(vec![
            IrNode::label(ident("top"), Span::NONE),
            IrNode::jump(ident("top"), Span::NONE),
        ]);
        assert_eq!(block.assembly(), "begin\n=> label top:\n  jump top\nend\n");
    }

    #[test]
    fn registers_render_by_name() {
        let node = IrNode::op(
            Operation::Less,
            IrNode::register(Register::Ri, Span::NONE),
            Some(IrNode::register(Register::RPop, Span::NONE)),
            Span::NONE,
        );
        assert_eq!(node.to_string(), "op lt Ri RPop");
    }

    #[test]
    fn lambda_body_is_indented() {
        let body = Block::from(vec![IrNode::ret(IrNode::nil(Span::NONE), Span::NONE)]);
        let lambda = IrNode::lambda(LambdaType::new(vec![], Typable::Nil, false), body, Span::NONE);
        let text = Block::from(vec![lambda]).assembly();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "  lambda () => nil");
        assert_eq!(lines[2], "    begin");
        assert_eq!(lines[3], "      ret nil");
        assert_eq!(lines[4], "    end");
    }

    #[test]
    fn set_and_iterables() {
        let array = IrNode::iterable(
            Typable::array(Typable::Int),
            vec![
                IrNode::object(GDObject::Int(10), Span::NONE),
                IrNode::object(GDObject::Int(20), Span::NONE),
            ],
            Span::NONE,
        );
        let set = IrNode::set(
            Discoverable::new(true, true, ident("xs")),
            Typable::array(Typable::Int),
            array,
            Span::NONE,
        );
        assert_eq!(set.to_string(), "set pub const xs [int] [int]{Int(10), Int(20)}");
    }

    #[test]
    fn lines_start_with_opcode_name() {
        let nil = || IrNode::nil(Span::NONE);
        let nodes = vec![
            (OpCode::Mov, IrNode::mov(nil(), nil(), Span::NONE)),
            (OpCode::CSet, IrNode::iset(nil(), nil(), nil(), Span::NONE)),
            (OpCode::CastObj, IrNode::cast(Typable::Int, nil(), Span::NONE)),
            (OpCode::Tif, IrNode::ternary(nil(), nil(), nil(), Span::NONE)),
            (OpCode::Jump, IrNode::jump(ident("end"), Span::NONE)),
            (OpCode::Ret, IrNode::ret(nil(), Span::NONE)),
        ];
        for (op, node) in nodes {
            assert_eq!(node.mnemonic(), Some(op.name()));
            let text = node.to_string();
            assert_eq!(text.split(' ').next(), Some(op.name()), "{}", text);
        }
    }

    #[test]
    fn nil_safe_access() {
        let node = IrNode::iget(
            IrNode::register(Register::Ri, Span::NONE),
            true,
            IrNode::register(Register::Ra, Span::NONE),
            Span::NONE,
        );
        assert_eq!(node.to_string(), "iget? Ri Ra");
    }
}
