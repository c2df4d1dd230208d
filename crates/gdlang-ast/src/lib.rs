//! GDLang typed AST.
//!
//! The scanner, parser and static checker live outside the compiler core;
//! this crate is the surface they hand over. An [`Ast`] is an index arena of
//! [`Node`]s, each carrying its [`Span`](gdlang_core::Span), a parent link and
//! the [`Inferred`] slots the checker fills before lowering starts.

mod arena;
mod builder;
mod node;

pub use arena::Ast;
pub use builder::AstBuilder;
pub use node::{Inferred, Node, NodeId, NodeKind};

/// A checked source file ready for lowering.
#[derive(Debug, Clone)]
pub struct Unit {
    /// The file's arena.
    pub ast: Ast,
    /// The `File` node at the root of the arena.
    pub root: NodeId,
}

impl Unit {
    pub fn new(ast: Ast, root: NodeId) -> Self {
        Self { ast, root }
    }

    /// File name recorded in the root node.
    pub fn name(&self) -> Option<&str> {
        match self.ast.get(self.root).map(|n| &n.kind) {
            Some(NodeKind::File { name, .. }) => Some(name),
            _ => None,
        }
    }
}
