//! AST node kinds and the inference slots filled by the static checker.

use std::cell::Cell;

use gdlang_core::{CollectionOperation, GDObject, Ident, Operation, Span, Typable, UseMode};

/// Index of a node in an [`Ast`](crate::Ast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Information the static checker attaches to a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inferred {
    /// Static type of the node.
    pub ty: Option<Typable>,
    /// Constant value, when the checker could compute one.
    pub object: Option<GDObject>,
    /// Resolved name for declarations and references.
    pub ident: Option<Ident>,
    /// Name the VM sees, when it differs from `ident`.
    pub runtime_ident: Option<Ident>,
    /// Type the VM sees, when it differs from `ty`.
    pub runtime_type: Option<Typable>,
}

/// An AST node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Enclosing node; `None` for file roots. A node referenced from several
    /// places (shared expressions) keeps its first parent.
    pub parent: Option<NodeId>,
    pub info: Inferred,
}

/// Node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A source file: top-level declarations in order.
    File { name: String, nodes: Vec<NodeId> },
    /// `{ ... }`
    Block { nodes: Vec<NodeId> },
    /// A literal; its value is the inferred object.
    Literal,
    /// A name reference.
    Ident { name: String },
    /// `(args) => { block }`; its type is the inferred lambda type.
    Lambda { block: NodeId },
    /// `func name(args) { ... }`
    FuncDecl {
        is_pub: bool,
        name: String,
        lambda: NodeId,
    },
    /// `(a, b)`
    Tuple { exprs: Vec<NodeId> },
    /// `{ x: 1, y: 2 }`; every attr is a [`NodeKind::StructAttr`].
    Struct { attrs: Vec<NodeId> },
    /// `name: expr` inside a struct literal.
    StructAttr { name: String, expr: NodeId },
    /// `[a, b]`
    Array { exprs: Vec<NodeId> },
    /// `return expr?`
    Return { expr: Option<NodeId> },
    /// `expr[index]` / `expr?[index]`
    Index {
        expr: NodeId,
        index: NodeId,
        nil_safe: bool,
    },
    /// `callee(args)`
    Call { callee: NodeId, args: Vec<NodeId> },
    /// `expr.name` / `expr?.name`
    Dot {
        expr: NodeId,
        name: String,
        nil_safe: bool,
    },
    /// `expr...` as a call argument.
    Spread { expr: NodeId },
    /// A group of declarations lowered in order.
    Sets { sets: Vec<NodeId> },
    /// `[pub] [const] name = expr`; `index` selects the element when `expr`
    /// is a shared expression.
    Set {
        is_pub: bool,
        is_const: bool,
        name: String,
        expr: NodeId,
        index: usize,
    },
    /// An expression evaluated once and destructured by several sets.
    SharedExpr {
        expr: NodeId,
        processed: Cell<bool>,
    },
    /// `lhs = rhs`
    UpdateSet { lhs: NodeId, rhs: NodeId },
    /// `[pub] type name = T`; the aliased type is the inferred type.
    TypeAlias { is_pub: bool, name: String },
    /// `expr as T`; `T` is the inferred type.
    Cast { expr: NodeId },
    /// `use a.b.c { x, y }`
    Use {
        path: Vec<String>,
        resolved: String,
        imports: Vec<String>,
        mode: UseMode,
    },
    /// `if conds { block } else if ... else { ... }`; every entry of
    /// `else_ifs` is itself an `If` without else branches.
    If {
        conds: Vec<NodeId>,
        block: NodeId,
        else_ifs: Vec<NodeId>,
        else_block: Option<NodeId>,
    },
    /// `cond ? then : els`
    Ternary {
        cond: NodeId,
        then: NodeId,
        els: NodeId,
    },
    /// `for sets; conds; { block }`
    ForIf {
        sets: Option<NodeId>,
        conds: Vec<NodeId>,
        block: NodeId,
    },
    /// `for key, value in expr { block }`; `key` and `value` are `Set` nodes.
    ForIn {
        key: Option<NodeId>,
        value: Option<NodeId>,
        expr: NodeId,
        block: NodeId,
    },
    /// `break`
    Break,
    /// `target << value` / `target >> value`
    CollectionMut {
        op: CollectionOperation,
        target: NodeId,
        value: NodeId,
    },
    /// `left op right`
    BinaryOp {
        op: Operation,
        left: NodeId,
        right: NodeId,
    },
    /// `op expr`
    UnaryOp { op: Operation, expr: NodeId },
    /// An expression evaluated for its effects.
    ExprStmt { expr: NodeId },
}

impl NodeKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::File { .. } => "file",
            NodeKind::Block { .. } => "block",
            NodeKind::Literal => "literal",
            NodeKind::Ident { .. } => "ident",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::FuncDecl { .. } => "func",
            NodeKind::Tuple { .. } => "tuple",
            NodeKind::Struct { .. } => "struct",
            NodeKind::StructAttr { .. } => "struct attr",
            NodeKind::Array { .. } => "array",
            NodeKind::Return { .. } => "return",
            NodeKind::Index { .. } => "index",
            NodeKind::Call { .. } => "call",
            NodeKind::Dot { .. } => "dot",
            NodeKind::Spread { .. } => "spread",
            NodeKind::Sets { .. } => "sets",
            NodeKind::Set { .. } => "set",
            NodeKind::SharedExpr { .. } => "shared expr",
            NodeKind::UpdateSet { .. } => "update set",
            NodeKind::TypeAlias { .. } => "type alias",
            NodeKind::Cast { .. } => "cast",
            NodeKind::Use { .. } => "use",
            NodeKind::If { .. } => "if",
            NodeKind::Ternary { .. } => "ternary",
            NodeKind::ForIf { .. } => "for",
            NodeKind::ForIn { .. } => "for-in",
            NodeKind::Break => "break",
            NodeKind::CollectionMut { .. } => "collection op",
            NodeKind::BinaryOp { .. } => "binary op",
            NodeKind::UnaryOp { .. } => "unary op",
            NodeKind::ExprStmt { .. } => "expr stmt",
        }
    }

    /// Whether this node is a loop `break` can target.
    pub fn is_loop(&self) -> bool {
        matches!(self, NodeKind::ForIf { .. } | NodeKind::ForIn { .. })
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::File { nodes, .. } | NodeKind::Block { nodes } => nodes.clone(),
            NodeKind::Literal
            | NodeKind::Ident { .. }
            | NodeKind::TypeAlias { .. }
            | NodeKind::Use { .. }
            | NodeKind::Break => Vec::new(),
            NodeKind::Lambda { block } => vec![*block],
            NodeKind::FuncDecl { lambda, .. } => vec![*lambda],
            NodeKind::Tuple { exprs } | NodeKind::Array { exprs } => exprs.clone(),
            NodeKind::Struct { attrs } => attrs.clone(),
            NodeKind::StructAttr { expr, .. }
            | NodeKind::Dot { expr, .. }
            | NodeKind::Spread { expr }
            | NodeKind::Set { expr, .. }
            | NodeKind::SharedExpr { expr, .. }
            | NodeKind::Cast { expr }
            | NodeKind::UnaryOp { expr, .. }
            | NodeKind::ExprStmt { expr } => vec![*expr],
            NodeKind::Return { expr } => expr.iter().copied().collect(),
            NodeKind::Index { expr, index, .. } => vec![*expr, *index],
            NodeKind::Call { callee, args } => {
                let mut out = vec![*callee];
                out.extend(args);
                out
            }
            NodeKind::Sets { sets } => sets.clone(),
            NodeKind::UpdateSet { lhs, rhs } => vec![*lhs, *rhs],
            NodeKind::If {
                conds,
                block,
                else_ifs,
                else_block,
            } => {
                let mut out = conds.clone();
                out.push(*block);
                out.extend(else_ifs);
                out.extend(else_block);
                out
            }
            NodeKind::Ternary { cond, then, els } => vec![*cond, *then, *els],
            NodeKind::ForIf { sets, conds, block } => {
                let mut out: Vec<NodeId> = sets.iter().copied().collect();
                out.extend(conds);
                out.push(*block);
                out
            }
            NodeKind::ForIn {
                key,
                value,
                expr,
                block,
            } => {
                let mut out: Vec<NodeId> = key.iter().chain(value.iter()).copied().collect();
                out.push(*expr);
                out.push(*block);
                out
            }
            NodeKind::CollectionMut { target, value, .. } => vec![*target, *value],
            NodeKind::BinaryOp { left, right, .. } => vec![*left, *right],
        }
    }
}
