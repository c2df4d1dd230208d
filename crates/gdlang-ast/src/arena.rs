//! The AST arena and its navigation helpers.

use gdlang_core::{GDObject, Ident, Span, Typable};

use crate::node::{Inferred, Node, NodeId, NodeKind};

/// An arena of AST nodes for one source file.
///
/// Nodes refer to each other by [`NodeId`]; parent links are plain indices,
/// so walking up the tree never borrows more than the arena itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and adopt its children.
    ///
    /// Children that already have a parent keep it.
    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            if let Some(node) = self.nodes.get_mut(child.index()) {
                node.parent.get_or_insert(id);
            }
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            info: Inferred::default(),
        });
        id
    }

    /// Get a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this arena.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Mutable access to the inference slots, for the static checker.
    pub fn info_mut(&mut self, id: NodeId) -> &mut Inferred {
        &mut self.nodes[id.index()].info
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ==========================================================================
    // Collaborator accessors
    // ==========================================================================

    pub fn position(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn inferred_type(&self, id: NodeId) -> Option<&Typable> {
        self.node(id).info.ty.as_ref()
    }

    pub fn inferred_object(&self, id: NodeId) -> Option<&GDObject> {
        self.node(id).info.object.as_ref()
    }

    pub fn inferred_ident(&self, id: NodeId) -> Option<&Ident> {
        self.node(id).info.ident.as_ref()
    }

    pub fn runtime_ident(&self, id: NodeId) -> Option<&Ident> {
        self.node(id).info.runtime_ident.as_ref()
    }

    pub fn runtime_type(&self, id: NodeId) -> Option<&Typable> {
        self.node(id).info.runtime_type.as_ref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Nearest ancestor satisfying `pred`.
    ///
    /// The walk stops at the first ancestor matching `stop`, which lets
    /// callers keep lookups inside the current lambda.
    pub fn parent_of_kind(
        &self,
        id: NodeId,
        pred: impl Fn(&NodeKind) -> bool,
        stop: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            let kind = self.kind(candidate);
            if pred(kind) {
                return Some(candidate);
            }
            if stop(kind) {
                return None;
            }
            current = self.parent(candidate);
        }
        None
    }

    /// The loop a `break` at `id` leaves, not crossing lambda boundaries.
    pub fn enclosing_loop(&self, id: NodeId) -> Option<NodeId> {
        self.parent_of_kind(id, NodeKind::is_loop, |k| {
            matches!(k, NodeKind::Lambda { .. })
        })
    }

    /// Iterate over all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }
}
