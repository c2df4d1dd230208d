//! Lambdas, function declarations, returns and nested blocks.

use gdlang_ast::{NodeId, NodeKind};
use gdlang_core::{GDObject, InternalError, Typable};

use crate::ir::{Block, Discoverable, IrNode};

use super::{Evaluator, Result};

impl<'a> Evaluator<'a> {
    /// Lower the statements of a `Block` node into a new IR block.
    pub(super) fn eval_body(&mut self, block: NodeId) -> Result<Block> {
        let ast = self.ast;
        let NodeKind::Block { nodes } = ast.kind(block) else {
            return Err(self.unknown(block));
        };
        let mut body = Block::new();
        for &node in nodes {
            self.eval(node, &mut body)?;
        }
        Ok(body)
    }

    /// `{ ... }` as a statement.
    pub(super) fn eval_block(&mut self, id: NodeId, out: &mut Block) -> Result<Option<IrNode>> {
        let body = self.eval_body(id)?;
        out.push(IrNode::block(body, self.span(id)));
        Ok(None)
    }

    /// A lambda is pushed as an instruction; its closure lands on the
    /// result stack.
    pub(super) fn eval_lambda(
        &mut self,
        id: NodeId,
        block: NodeId,
        out: &mut Block,
    ) -> Result<IrNode> {
        let ty = match self.type_of(id, "lambda type")? {
            Typable::Lambda(ty) => ty,
            _ => {
                return Err(InternalError::MissingInference {
                    what: "lambda type",
                    span: self.span(id),
                });
            }
        };
        let body = self.eval_body(block)?;
        out.push(IrNode::lambda(ty, body, self.span(id)));
        Ok(Self::rpop())
    }

    /// `func name(...) { ... }` binds a const to the lambda.
    pub(super) fn eval_func(
        &mut self,
        id: NodeId,
        is_pub: bool,
        name: &str,
        lambda: NodeId,
        out: &mut Block,
    ) -> Result<Option<IrNode>> {
        let block = self.lambda_block(lambda)?;
        let value = self.eval_lambda(lambda, block, out)?;
        let ident = self.ident_of(id, name)?;
        let ty = self.type_of(id, "function type")?;
        out.push(IrNode::set(
            Discoverable::new(is_pub, true, ident),
            ty,
            value,
            self.span(id),
        ));
        Ok(None)
    }

    fn lambda_block(&self, lambda: NodeId) -> Result<NodeId> {
        match self.ast.kind(lambda) {
            NodeKind::Lambda { block } => Ok(*block),
            _ => Err(self.unknown(lambda)),
        }
    }

    pub(super) fn eval_return(
        &mut self,
        id: NodeId,
        expr: Option<NodeId>,
        out: &mut Block,
    ) -> Result<Option<IrNode>> {
        let span = self.span(id);
        let value = match expr {
            Some(expr) => self.eval_value(expr, out)?,
            None => IrNode::object(GDObject::Nil, span),
        };
        out.push(IrNode::ret(value, span));
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use gdlang_ast::AstBuilder;
    use gdlang_core::{FileId, GDObject, Ident, LambdaArg, LambdaType, Operation, Typable};

    use crate::ir::IrKind;

    fn unary_int() -> LambdaType {
        LambdaType::new(
            vec![LambdaArg {
                ident: Ident::new("n").unwrap(),
                ty: Typable::Int,
            }],
            Typable::Int,
            false,
        )
    }

    #[test]
    fn func_binds_const_lambda() {
        let mut b = AstBuilder::new(FileId(1));
        let n = b.ident("n");
        let one = b.literal(GDObject::Int(1));
        let sum = b.binary(Operation::Add, n, one);
        let ret = b.ret(Some(sum));
        let f = b.func(true, "inc", unary_int(), vec![ret]);
        let ast = b.finish();

        let (block, result) = lower(&ast, f);
        assert!(result.is_none());
        assert_eq!(
            lines(&block),
            vec![
                "lambda (n: int) => int (2 nodes)",
                "set pub const inc (n: int) => int RPop",
            ]
        );
        match &block.iter().next().unwrap().kind {
            IrKind::Lambda { block, .. } => {
                let body: Vec<String> = block.iter().map(|n| n.to_string()).collect();
                assert_eq!(body, vec!["op add $n Int(1)", "ret RPop"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bare_return_is_nil() {
        let mut b = AstBuilder::new(FileId(1));
        let ret = b.ret(None);
        let ast = b.finish();

        let (block, _) = lower(&ast, ret);
        assert_eq!(lines(&block), vec!["ret nil"]);
    }

    #[test]
    fn lambda_expression_yields_rpop() {
        let mut b = AstBuilder::new(FileId(1));
        let body = b.block(vec![]);
        let lambda = b.lambda(LambdaType::new(vec![], Typable::Nil, false), body);
        let ast = b.finish();

        let (block, result) = lower(&ast, lambda);
        assert_eq!(lines(&block), vec!["lambda () => nil (0 nodes)"]);
        assert_eq!(result.unwrap().to_string(), "RPop");
    }

    #[test]
    fn nested_block_statement() {
        let mut b = AstBuilder::new(FileId(1));
        let v = b.literal(GDObject::Int(1));
        let set = b.set("x", Typable::Int, v);
        let inner = b.block(vec![set]);
        let ast = b.finish();

        let (block, result) = lower(&ast, inner);
        assert!(result.is_none());
        assert_eq!(lines(&block), vec!["begin (1 nodes)"]);
    }
}
