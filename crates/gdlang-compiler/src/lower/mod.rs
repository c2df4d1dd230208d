//! AST to IR lowering.
//!
//! The [`Evaluator`] walks a checked AST and appends IR to a target
//! [`Block`]. Each rule returns an optional result node: expressions give
//! back the operand their parent consumes (a literal object, a named
//! reference, or [`Register::RPop`] when the value was left on the VM's
//! result stack), statements give back nothing.
//!
//! Rules live next to the constructs they handle:
//! - `literals` - literals, names, tuple/struct/array literals
//! - `calls` - calls, indexing, attribute access, spreads
//! - `sets` - declarations, shared expressions, assignment, type aliases
//! - `lambda` - lambdas, functions, returns, nested blocks
//! - `if_stmt` - if/else-if/else chains and ternaries
//! - `for_stmt` - the loop template, for-if, for-in and break
//! - `operators` - unary/binary operators, collection ops, casts
//! - `package` - `use` statements
//!
//! Lowering stops at the first error.

mod calls;
mod for_stmt;
mod if_stmt;
mod lambda;
mod literals;
mod operators;
mod package;
mod sets;

use gdlang_ast::{Ast, NodeId, NodeKind};
use gdlang_core::{Ident, InternalError, Span, Typable};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::cpu::Register;
use crate::ident_gen::IdentSource;
use crate::ir::{Block, IrNode};

type Result<T> = std::result::Result<T, InternalError>;

/// Lowers one AST arena into IR.
pub struct Evaluator<'a> {
    ast: &'a Ast,
    idents: &'a mut dyn IdentSource,
    /// End label of every loop lowered so far, for `break`.
    loop_ends: FxHashMap<NodeId, Ident>,
}

impl<'a> Evaluator<'a> {
    pub fn new(ast: &'a Ast, idents: &'a mut dyn IdentSource) -> Self {
        Self {
            ast,
            idents,
            loop_ends: FxHashMap::default(),
        }
    }

    /// Lower a `File` node's declarations, in order, into `out`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn eval_file(&mut self, root: NodeId, out: &mut Block) -> Result<()> {
        let ast = self.ast;
        let NodeKind::File { name, nodes } = ast.kind(root) else {
            return Err(self.unknown(root));
        };
        let before = out.len();
        for &node in nodes {
            self.eval(node, out)?;
        }
        debug!(file = %name, nodes = out.len() - before, "lowered file");
        Ok(())
    }

    /// Lower one node into `out`, returning its result operand if it has one.
    pub fn eval(&mut self, id: NodeId, out: &mut Block) -> Result<Option<IrNode>> {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::File { .. } => {
                self.eval_file(id, out)?;
                Ok(None)
            }
            NodeKind::Block { .. } => self.eval_block(id, out),
            NodeKind::Literal => self.eval_literal(id).map(Some),
            NodeKind::Ident { name } => self.eval_ident(id, name).map(Some),
            NodeKind::Lambda { block } => self.eval_lambda(id, *block, out).map(Some),
            NodeKind::FuncDecl {
                is_pub,
                name,
                lambda,
            } => self.eval_func(id, *is_pub, name, *lambda, out),
            NodeKind::Tuple { exprs } | NodeKind::Array { exprs } => {
                self.eval_iterable(id, exprs, out).map(Some)
            }
            NodeKind::Struct { attrs } => self.eval_struct(id, attrs, out).map(Some),
            NodeKind::StructAttr { expr, .. } => self.eval(*expr, out),
            NodeKind::Return { expr } => self.eval_return(id, *expr, out),
            NodeKind::Index {
                expr,
                index,
                nil_safe,
            } => self.eval_index(id, *expr, *index, *nil_safe, out).map(Some),
            NodeKind::Call { callee, args } => self.eval_call(id, *callee, args, out).map(Some),
            NodeKind::Dot {
                expr,
                name,
                nil_safe,
            } => self.eval_dot(id, *expr, name, *nil_safe, out).map(Some),
            NodeKind::Spread { expr } => self.eval_spread(id, *expr, out).map(Some),
            NodeKind::Sets { sets } => {
                for &set in sets {
                    self.eval(set, out)?;
                }
                Ok(None)
            }
            NodeKind::Set { .. } => self.eval_set(id, out),
            NodeKind::SharedExpr { .. } => self.eval_shared_whole(id, out).map(Some),
            NodeKind::UpdateSet { lhs, rhs } => self.eval_update(id, *lhs, *rhs, out),
            NodeKind::TypeAlias { is_pub, name } => self.eval_type_alias(id, *is_pub, name, out),
            NodeKind::Cast { expr } => self.eval_cast(id, *expr, out).map(Some),
            NodeKind::Use { .. } => self.eval_use(id, out),
            NodeKind::If { .. } => self.eval_if(id, out),
            NodeKind::Ternary { cond, then, els } => {
                self.eval_ternary(id, *cond, *then, *els, out).map(Some)
            }
            NodeKind::ForIf { sets, conds, block } => {
                self.eval_for_if(id, *sets, conds, *block, out)
            }
            NodeKind::ForIn {
                key,
                value,
                expr,
                block,
            } => self.eval_for_in(id, *key, *value, *expr, *block, out),
            NodeKind::Break => self.eval_break(id, out),
            NodeKind::CollectionMut { op, target, value } => {
                self.eval_collection(id, *op, *target, *value, out)
            }
            NodeKind::BinaryOp { op, left, right } => {
                self.eval_binary(id, *op, *left, *right, out).map(Some)
            }
            NodeKind::UnaryOp { op, expr } => self.eval_unary(id, *op, *expr, out).map(Some),
            NodeKind::ExprStmt { expr } => {
                self.eval(*expr, out)?;
                Ok(None)
            }
        }
    }

    /// Lower an expression that must produce a value.
    pub fn eval_value(&mut self, id: NodeId, out: &mut Block) -> Result<IrNode> {
        self.eval(id, out)?.ok_or_else(|| InternalError::NoValue {
            kind: self.ast.kind(id).name(),
            span: self.span(id),
        })
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    fn span(&self, id: NodeId) -> Span {
        self.ast.position(id)
    }

    fn fresh(&mut self) -> Ident {
        self.idents.fresh()
    }

    fn unknown(&self, id: NodeId) -> InternalError {
        InternalError::UnknownNode {
            kind: self.ast.kind(id).name(),
            span: self.span(id),
        }
    }

    /// The type the VM sees for `id`.
    fn type_of(&self, id: NodeId, what: &'static str) -> Result<Typable> {
        self.ast
            .runtime_type(id)
            .or_else(|| self.ast.inferred_type(id))
            .cloned()
            .ok_or(InternalError::MissingInference {
                what,
                span: self.span(id),
            })
    }

    /// The name the VM sees for `id`, falling back to the source name.
    fn ident_of(&self, id: NodeId, name: &str) -> Result<Ident> {
        match self
            .ast
            .runtime_ident(id)
            .or_else(|| self.ast.inferred_ident(id))
        {
            Some(ident) => Ok(ident.clone()),
            None => Ident::new(name),
        }
    }

    fn rpop() -> IrNode {
        IrNode::register(Register::RPop, Span::NONE)
    }
}
