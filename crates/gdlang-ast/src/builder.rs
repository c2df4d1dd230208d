//! Programmatic AST construction.
//!
//! [`AstBuilder`] is what front ends (and tests) use to assemble an [`Ast`]
//! with the inference slots already filled, the way the static checker
//! leaves them for lowering.

use std::cell::Cell;

use gdlang_core::{
    CollectionOperation, FileId, GDObject, Ident, LambdaType, Operation, Span, StructField,
    Typable, UseMode,
};

use crate::arena::Ast;
use crate::node::{NodeId, NodeKind};

/// Builds an [`Ast`] node by node.
///
/// Every node gets the builder's current position; move it with [`AstBuilder::at`].
#[derive(Debug)]
pub struct AstBuilder {
    ast: Ast,
    file: FileId,
    line: u32,
    col: u32,
}

impl AstBuilder {
    /// Start a builder for `file`, positioned at 1:1.
    pub fn new(file: FileId) -> Self {
        Self {
            ast: Ast::new(),
            file,
            line: 1,
            col: 1,
        }
    }

    /// Move the position used for subsequent nodes.
    pub fn at(&mut self, line: u32, col: u32) -> &mut Self {
        self.line = line;
        self.col = col;
        self
    }

    fn span(&self) -> Span {
        Span::new(self.file, self.line, self.col, 1)
    }

    /// Add a raw node at the current position.
    pub fn node(&mut self, kind: NodeKind) -> NodeId {
        let span = self.span();
        self.ast.push(kind, span)
    }

    /// Set the inferred type of `id`.
    pub fn typed(&mut self, id: NodeId, ty: Typable) -> NodeId {
        self.ast.info_mut(id).ty = Some(ty);
        id
    }

    fn ty_of(&self, id: NodeId) -> Typable {
        self.ast.inferred_type(id).cloned().unwrap_or(Typable::Any)
    }

    fn named(&mut self, id: NodeId, name: &str) -> NodeId {
        self.ast.info_mut(id).ident = Ident::new(name).ok();
        id
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub fn literal(&mut self, object: GDObject) -> NodeId {
        let id = self.node(NodeKind::Literal);
        let info = self.ast.info_mut(id);
        info.ty = Some(object.ty());
        info.object = Some(object);
        id
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        let id = self.node(NodeKind::Ident {
            name: name.to_string(),
        });
        self.named(id, name)
    }

    /// A name reference whose value the checker already knows.
    pub fn ident_with_value(&mut self, name: &str, value: GDObject) -> NodeId {
        let id = self.ident(name);
        let info = self.ast.info_mut(id);
        info.ty = Some(value.ty());
        info.object = Some(value);
        id
    }

    pub fn array(&mut self, elem: Typable, exprs: Vec<NodeId>) -> NodeId {
        let id = self.node(NodeKind::Array { exprs });
        self.typed(id, Typable::array(elem))
    }

    pub fn tuple(&mut self, exprs: Vec<NodeId>) -> NodeId {
        let ty = Typable::Tuple(exprs.iter().map(|e| self.ty_of(*e)).collect());
        let id = self.node(NodeKind::Tuple { exprs });
        self.typed(id, ty)
    }

    pub fn structure(&mut self, fields: Vec<(&str, NodeId)>) -> NodeId {
        let mut attrs = Vec::with_capacity(fields.len());
        let mut layout = Vec::with_capacity(fields.len());
        for (name, expr) in fields {
            let ty = self.ty_of(expr);
            if let Ok(ident) = Ident::new(name) {
                layout.push(StructField {
                    ident,
                    ty: ty.clone(),
                });
            }
            let attr = self.node(NodeKind::StructAttr {
                name: name.to_string(),
                expr,
            });
            attrs.push(self.typed(attr, ty));
        }
        let id = self.node(NodeKind::Struct { attrs });
        self.typed(id, Typable::Struct(layout))
    }

    pub fn index(&mut self, expr: NodeId, index: NodeId, nil_safe: bool) -> NodeId {
        let elem = match self.ty_of(expr) {
            Typable::Array(sub) => *sub,
            _ => Typable::Any,
        };
        let id = self.node(NodeKind::Index {
            expr,
            index,
            nil_safe,
        });
        self.typed(id, elem)
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let ret = match self.ty_of(callee) {
            Typable::Lambda(lambda) => *lambda.ret,
            _ => Typable::Any,
        };
        let id = self.node(NodeKind::Call { callee, args });
        self.typed(id, ret)
    }

    pub fn dot(&mut self, expr: NodeId, name: &str, nil_safe: bool) -> NodeId {
        let id = self.node(NodeKind::Dot {
            expr,
            name: name.to_string(),
            nil_safe,
        });
        self.named(id, name)
    }

    pub fn spread(&mut self, expr: NodeId) -> NodeId {
        let ty = self.ty_of(expr);
        let id = self.node(NodeKind::Spread { expr });
        self.typed(id, ty)
    }

    pub fn lambda(&mut self, ty: LambdaType, block: NodeId) -> NodeId {
        let id = self.node(NodeKind::Lambda { block });
        self.typed(id, Typable::Lambda(ty))
    }

    /// `expr as ty`. `narrowed` is the value the checker folded the cast to,
    /// if any.
    pub fn cast(&mut self, expr: NodeId, ty: Typable, narrowed: Option<GDObject>) -> NodeId {
        let id = self.node(NodeKind::Cast { expr });
        self.ast.info_mut(id).object = narrowed;
        self.typed(id, ty)
    }

    pub fn ternary(&mut self, cond: NodeId, then: NodeId, els: NodeId) -> NodeId {
        let ty = self.ty_of(then);
        let id = self.node(NodeKind::Ternary { cond, then, els });
        self.typed(id, ty)
    }

    pub fn binary(&mut self, op: Operation, left: NodeId, right: NodeId) -> NodeId {
        let ty = match op {
            Operation::Less
            | Operation::LessEqual
            | Operation::Greater
            | Operation::GreaterEqual
            | Operation::Equal
            | Operation::NotEqual
            | Operation::And
            | Operation::Or => Typable::Bool,
            _ => self.ty_of(left),
        };
        let id = self.node(NodeKind::BinaryOp { op, left, right });
        self.typed(id, ty)
    }

    pub fn unary(&mut self, op: Operation, expr: NodeId) -> NodeId {
        let ty = self.ty_of(expr);
        let id = self.node(NodeKind::UnaryOp { op, expr });
        self.typed(id, ty)
    }

    pub fn shared(&mut self, expr: NodeId) -> NodeId {
        let ty = self.ty_of(expr);
        let id = self.node(NodeKind::SharedExpr {
            expr,
            processed: Cell::new(false),
        });
        self.typed(id, ty)
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.node(NodeKind::ExprStmt { expr })
    }

    pub fn block(&mut self, nodes: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Block { nodes })
    }

    pub fn ret(&mut self, expr: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Return { expr })
    }

    /// `name = expr` with the given static type.
    pub fn set(&mut self, name: &str, ty: Typable, expr: NodeId) -> NodeId {
        self.decl(false, false, name, ty, expr)
    }

    pub fn decl(
        &mut self,
        is_pub: bool,
        is_const: bool,
        name: &str,
        ty: Typable,
        expr: NodeId,
    ) -> NodeId {
        let id = self.node(NodeKind::Set {
            is_pub,
            is_const,
            name: name.to_string(),
            expr,
            index: 0,
        });
        self.typed(id, ty);
        self.named(id, name)
    }

    /// `name` bound to element `index` of a shared expression.
    pub fn destructure(&mut self, name: &str, ty: Typable, shared: NodeId, index: usize) -> NodeId {
        let id = self.node(NodeKind::Set {
            is_pub: false,
            is_const: false,
            name: name.to_string(),
            expr: shared,
            index,
        });
        self.typed(id, ty);
        self.named(id, name)
    }

    pub fn sets(&mut self, sets: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Sets { sets })
    }

    pub fn update(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.node(NodeKind::UpdateSet { lhs, rhs })
    }

    pub fn type_alias(&mut self, is_pub: bool, name: &str, ty: Typable) -> NodeId {
        let id = self.node(NodeKind::TypeAlias {
            is_pub,
            name: name.to_string(),
        });
        self.typed(id, ty)
    }

    /// `func name` with the given lambda type and body statements.
    pub fn func(&mut self, is_pub: bool, name: &str, ty: LambdaType, body: Vec<NodeId>) -> NodeId {
        let block = self.block(body);
        let lambda = self.lambda(ty.clone(), block);
        let id = self.node(NodeKind::FuncDecl {
            is_pub,
            name: name.to_string(),
            lambda,
        });
        self.typed(id, Typable::Lambda(ty));
        self.named(id, name)
    }

    pub fn use_package(
        &mut self,
        path: &[&str],
        resolved: &str,
        imports: &[&str],
        mode: UseMode,
    ) -> NodeId {
        self.node(NodeKind::Use {
            path: path.iter().map(|s| s.to_string()).collect(),
            resolved: resolved.to_string(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            mode,
        })
    }

    /// `if conds { block }` followed by `else if` nodes and an optional else block.
    pub fn if_chain(
        &mut self,
        conds: Vec<NodeId>,
        block: NodeId,
        else_ifs: Vec<NodeId>,
        else_block: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::If {
            conds,
            block,
            else_ifs,
            else_block,
        })
    }

    /// An `else if` branch for [`AstBuilder::if_chain`].
    pub fn else_if(&mut self, conds: Vec<NodeId>, block: NodeId) -> NodeId {
        self.if_chain(conds, block, Vec::new(), None)
    }

    pub fn for_if(&mut self, sets: Option<NodeId>, conds: Vec<NodeId>, block: NodeId) -> NodeId {
        self.node(NodeKind::ForIf { sets, conds, block })
    }

    pub fn for_in(
        &mut self,
        key: Option<NodeId>,
        value: Option<NodeId>,
        expr: NodeId,
        block: NodeId,
    ) -> NodeId {
        self.node(NodeKind::ForIn {
            key,
            value,
            expr,
            block,
        })
    }

    pub fn brk(&mut self) -> NodeId {
        self.node(NodeKind::Break)
    }

    pub fn collection(&mut self, op: CollectionOperation, target: NodeId, value: NodeId) -> NodeId {
        self.node(NodeKind::CollectionMut { op, target, value })
    }

    pub fn file(&mut self, name: &str, nodes: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::File {
            name: name.to_string(),
            nodes,
        })
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn finish(self) -> Ast {
        self.ast
    }
}
