//! Intermediate representation.
//!
//! IR is a tree of typed instruction nodes. Lowering appends instructions to
//! a [`Block`]; values flow between instructions through registers (mostly
//! [`Register::RPop`], the VM's result stack) or as inline operand nodes.
//!
//! Every node supports two outputs:
//! - bytecode, via [`IrNode::emit_bytecode`] (see `emit.rs`)
//! - assembly text for `.gdasm` debug artifacts (see `assembly.rs`)
//!
//! Neither output mutates the tree; label bookkeeping lives in [`IrContext`].

mod assembly;
mod context;
mod emit;

use gdlang_core::{
    CollectionOperation, GDObject, Ident, LambdaType, Operation, Span, Typable, UseMode,
};

use crate::cpu::Register;

pub use context::IrContext;

// ============================================================================
// Node model
// ============================================================================

/// Header shared by top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Discoverable {
    pub is_pub: bool,
    pub is_const: bool,
    pub ident: Ident,
}

impl Discoverable {
    pub fn new(is_pub: bool, is_const: bool, ident: Ident) -> Self {
        Self {
            is_pub,
            is_const,
            ident,
        }
    }
}

/// What an [`IrKind::Object`] carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A concrete value, written as a typed object.
    Object(GDObject),
    /// A single node written after the declared type.
    Node(Box<IrNode>),
    /// Iterable members, written in reverse after a count.
    Nodes(Vec<IrNode>),
}

/// An IR node with the source position it was lowered from.
#[derive(Debug, Clone, PartialEq)]
pub struct IrNode {
    pub kind: IrKind,
    /// [`Span::NONE`] for compiler-synthesized nodes.
    pub span: Span,
}

/// IR node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum IrKind {
    Object {
        ty: Typable,
        payload: Payload,
    },
    Set {
        disc: Discoverable,
        ty: Typable,
        expr: Box<IrNode>,
    },
    TypeAlias {
        disc: Discoverable,
        ty: Typable,
    },
    Mov {
        target: Box<IrNode>,
        value: Box<IrNode>,
    },
    /// Result goes to [`Register::RPop`].
    Op {
        op: Operation,
        left: Box<IrNode>,
        right: Option<Box<IrNode>>,
    },
    CollectionOp {
        op: CollectionOperation,
        left: Box<IrNode>,
        right: Box<IrNode>,
    },
    IGet {
        idx: Box<IrNode>,
        nil_safe: bool,
        expr: Box<IrNode>,
    },
    ISet {
        idx: Box<IrNode>,
        expr: Box<IrNode>,
        value: Box<IrNode>,
    },
    ILen {
        expr: Box<IrNode>,
    },
    AGet {
        ident: Ident,
        nil_safe: bool,
        expr: Box<IrNode>,
    },
    ASet {
        nil_safe: bool,
        ident: Ident,
        expr: Box<IrNode>,
        value: Box<IrNode>,
    },
    Cast {
        ty: Typable,
        expr: Box<IrNode>,
    },
    /// `args` is an `Array(Any)` iterable object.
    Call {
        callee: Box<IrNode>,
        args: Box<IrNode>,
    },
    TernaryIf {
        cond: Box<IrNode>,
        then: Box<IrNode>,
        els: Box<IrNode>,
    },
    CompareJump {
        expr: Box<IrNode>,
        equals_to: Box<IrNode>,
        label: Ident,
    },
    Jump {
        label: Ident,
    },
    Label {
        ident: Ident,
    },
    Lambda {
        ty: LambdaType,
        block: Block,
    },
    Block(Block),
    Ret {
        expr: Box<IrNode>,
    },
    Use {
        mode: UseMode,
        package: Ident,
        imports: Vec<Ident>,
    },
}

/// An ordered sequence of IR nodes, framed with `BBegin`/`BEnd` on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub nodes: Vec<IrNode>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: IrNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn last(&self) -> Option<&IrNode> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IrNode> {
        self.nodes.iter()
    }
}

impl From<Vec<IrNode>> for Block {
    fn from(nodes: Vec<IrNode>) -> Self {
        Self { nodes }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl IrNode {
    pub fn new(kind: IrKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A concrete value.
    pub fn object(object: GDObject, span: Span) -> Self {
        let ty = object.ty();
        Self::new(
            IrKind::Object {
                ty,
                payload: Payload::Object(object),
            },
            span,
        )
    }

    /// A typed nil.
    pub fn nil(span: Span) -> Self {
        Self::object(GDObject::Nil, span)
    }

    /// A reference to a register.
    pub fn register(register: Register, span: Span) -> Self {
        Self::object(register.object(), span)
    }

    /// A named reference with a nil fallback.
    pub fn id(ident: Ident, span: Span) -> Self {
        Self::object(GDObject::id(ident), span)
    }

    /// An iterable literal built from member nodes.
    pub fn iterable(ty: Typable, nodes: Vec<IrNode>, span: Span) -> Self {
        Self::new(
            IrKind::Object {
                ty,
                payload: Payload::Nodes(nodes),
            },
            span,
        )
    }

    /// Call arguments: an `Array(Any)` iterable.
    pub fn args(nodes: Vec<IrNode>, span: Span) -> Self {
        Self::iterable(Typable::array(Typable::Any), nodes, span)
    }

    /// An object whose value is produced by `inner`.
    pub fn wrapped(ty: Typable, inner: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::Object {
                ty,
                payload: Payload::Node(Box::new(inner)),
            },
            span,
        )
    }

    pub fn set(disc: Discoverable, ty: Typable, expr: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::Set {
                disc,
                ty,
                expr: Box::new(expr),
            },
            span,
        )
    }

    pub fn type_alias(disc: Discoverable, ty: Typable, span: Span) -> Self {
        Self::new(IrKind::TypeAlias { disc, ty }, span)
    }

    pub fn mov(target: IrNode, value: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::Mov {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn op(op: Operation, left: IrNode, right: Option<IrNode>, span: Span) -> Self {
        Self::new(
            IrKind::Op {
                op,
                left: Box::new(left),
                right: right.map(Box::new),
            },
            span,
        )
    }

    pub fn collection_op(op: CollectionOperation, left: IrNode, right: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::CollectionOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn iget(idx: IrNode, nil_safe: bool, expr: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::IGet {
                idx: Box::new(idx),
                nil_safe,
                expr: Box::new(expr),
            },
            span,
        )
    }

    pub fn iset(idx: IrNode, expr: IrNode, value: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::ISet {
                idx: Box::new(idx),
                expr: Box::new(expr),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn ilen(expr: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::ILen {
                expr: Box::new(expr),
            },
            span,
        )
    }

    pub fn aget(ident: Ident, nil_safe: bool, expr: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::AGet {
                ident,
                nil_safe,
                expr: Box::new(expr),
            },
            span,
        )
    }

    pub fn aset(nil_safe: bool, ident: Ident, expr: IrNode, value: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::ASet {
                nil_safe,
                ident,
                expr: Box::new(expr),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn cast(ty: Typable, expr: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::Cast {
                ty,
                expr: Box::new(expr),
            },
            span,
        )
    }

    pub fn call(callee: IrNode, args: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::Call {
                callee: Box::new(callee),
                args: Box::new(args),
            },
            span,
        )
    }

    pub fn ternary(cond: IrNode, then: IrNode, els: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::TernaryIf {
                cond: Box::new(cond),
                then: Box::new(then),
                els: Box::new(els),
            },
            span,
        )
    }

    pub fn compare_jump(expr: IrNode, equals_to: IrNode, label: Ident, span: Span) -> Self {
        Self::new(
            IrKind::CompareJump {
                expr: Box::new(expr),
                equals_to: Box::new(equals_to),
                label,
            },
            span,
        )
    }

    pub fn jump(label: Ident, span: Span) -> Self {
        Self::new(IrKind::Jump { label }, span)
    }

    pub fn label(ident: Ident, span: Span) -> Self {
        Self::new(IrKind::Label { ident }, span)
    }

    pub fn lambda(ty: LambdaType, block: Block, span: Span) -> Self {
        Self::new(IrKind::Lambda { ty, block }, span)
    }

    pub fn block(block: Block, span: Span) -> Self {
        Self::new(IrKind::Block(block), span)
    }

    pub fn ret(expr: IrNode, span: Span) -> Self {
        Self::new(
            IrKind::Ret {
                expr: Box::new(expr),
            },
            span,
        )
    }

    pub fn use_package(mode: UseMode, package: Ident, imports: Vec<Ident>, span: Span) -> Self {
        Self::new(
            IrKind::Use {
                mode,
                package,
                imports,
            },
            span,
        )
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// The concrete value of an object node, if it carries one.
    pub fn as_object(&self) -> Option<&GDObject> {
        match &self.kind {
            IrKind::Object {
                payload: Payload::Object(object),
                ..
            } => Some(object),
            _ => None,
        }
    }

    /// The register this node refers to, if it is a register reference.
    pub fn as_register(&self) -> Option<Register> {
        self.as_object().and_then(Register::of_object)
    }

    /// Whether this node is a reference to a named value.
    pub fn is_named_reference(&self) -> bool {
        self.as_object()
            .is_some_and(|o| matches!(o, GDObject::IdObject(..)) && Register::of_object(o).is_none())
    }

    /// Mnemonic of the instruction this node emits, `None` for operands.
    pub fn mnemonic(&self) -> Option<&'static str> {
        use crate::cpu::OpCode;
        let op = match &self.kind {
            IrKind::Object { .. } | IrKind::Label { .. } => return None,
            IrKind::Set { .. } => OpCode::Set,
            IrKind::TypeAlias { .. } => OpCode::TypeAlias,
            IrKind::Mov { .. } => OpCode::Mov,
            IrKind::Op { .. } => OpCode::Operation,
            IrKind::CollectionOp {
                op: CollectionOperation::Add,
                ..
            } => OpCode::CAdd,
            IrKind::CollectionOp {
                op: CollectionOperation::Remove,
                ..
            } => OpCode::CRemove,
            IrKind::IGet { .. } => OpCode::IGet,
            IrKind::ISet { .. } => OpCode::CSet,
            IrKind::ILen { .. } => OpCode::ILen,
            IrKind::AGet { .. } => OpCode::AGet,
            IrKind::ASet { .. } => OpCode::ASet,
            IrKind::Cast { .. } => OpCode::CastObj,
            IrKind::Call { .. } => OpCode::Call,
            IrKind::TernaryIf { .. } => OpCode::Tif,
            IrKind::CompareJump { .. } => OpCode::CompareJump,
            IrKind::Jump { .. } => OpCode::Jump,
            IrKind::Lambda { .. } => OpCode::Lambda,
            IrKind::Block(_) => OpCode::BBegin,
            IrKind::Ret { .. } => OpCode::Ret,
            IrKind::Use { .. } => OpCode::Use,
        };
        Some(op.name())
    }
}
