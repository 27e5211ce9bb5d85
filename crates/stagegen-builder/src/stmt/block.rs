//! Nested blocks.

use stagegen_core::Span;

use super::{Result, Stmt, build_block};
use crate::ast;
use crate::context::BlockCtx;

/// `{ ... }`.
///
/// The block's scope is created when the block is built, so its lifetime
/// matches the emitted block rather than the builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStmt {
    body: Vec<Stmt>,
    origin: Span,
}

impl BlockStmt {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self {
            body,
            origin: Span::NONE,
        }
    }

    pub fn origin(mut self, origin: Span) -> Self {
        self.origin = origin;
        self
    }

    pub fn add(mut self, stmt: impl Into<Stmt>) -> Self {
        self.body.push(stmt.into());
        self
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.body
    }

    pub(super) fn build_inner(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Block> {
        let mut inner = ctx.child("block", self.origin);
        build_block(&self.body, &mut inner)
    }

    pub(super) fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        self.build_inner(ctx).map(ast::Stmt::Block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use stagegen_core::BuildError;

    #[test]
    fn nested_block_may_shadow() {
        let mut pkg = Package::default();
        let outer = pkg.define_var("x", 1, true, Span::NONE).unwrap();
        let inner = pkg.define_var("x", "shadow", true, Span::NONE).unwrap();
        let body = vec![Stmt::from(outer), BlockStmt::new(vec![inner.into()]).into()];
        let root = pkg.root();
        let mut ctx = BlockCtx::new(&mut pkg, root);
        let mut func = ctx.child("func", Span::NONE);
        let block = build_block(&body, &mut func).unwrap();
        assert_eq!(block.stmts.len(), 2);
        let ast::Stmt::Block(inner) = &block.stmts[1] else {
            panic!("expected a nested block");
        };
        assert_eq!(inner.stmts.len(), 1);
    }

    #[test]
    fn same_scope_redeclaration_fails() {
        let mut pkg = Package::default();
        let a = pkg.define_var("x", 1, true, Span::point(1, 1)).unwrap();
        let b = pkg.define_var("x", 2, true, Span::point(2, 1)).unwrap();
        let block = BlockStmt::new(vec![a.into(), b.into()]);
        let root = pkg.root();
        let mut ctx = BlockCtx::new(&mut pkg, root);
        assert!(matches!(
            Stmt::from(block).build(&mut ctx),
            Err(BuildError::VariableRedeclaration { .. })
        ));
    }
}
