//! Assignment statements.

use stagegen_core::Span;

use super::Result;
use crate::assign::{Tuple, check_assignable};
use crate::ast;
use crate::context::BlockCtx;
use crate::node::Expr;
use crate::package::Package;

/// `lhs... = rhs...`.
///
/// Targets must be reference nodes ([`Var::reference`](crate::Var::reference),
/// [`Package::index_ref`], ...). The check runs when the statement is built.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    lhs: Vec<Expr>,
    rhs: Vec<Expr>,
    origin: Span,
}

impl AssignStmt {
    pub fn new(origin: Span) -> Self {
        Self {
            lhs: Vec::new(),
            rhs: Vec::new(),
            origin,
        }
    }

    pub fn lhs(mut self, lhs: Vec<Expr>) -> Self {
        self.lhs = lhs;
        self
    }

    pub fn rhs(mut self, rhs: Vec<Expr>) -> Self {
        self.rhs = rhs;
        self
    }

    pub(super) fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        let types = ctx.types();
        check_assignable(types, &self.lhs, Tuple::of(&self.rhs, types), self.origin)?;
        Ok(ast::Stmt::Assign {
            lhs: self.lhs.iter().map(|e| e.src.clone()).collect(),
            tok: ast::AssignTok::Assign,
            rhs: self.rhs.iter().map(|e| e.src.clone()).collect(),
        })
    }
}

impl Package {
    /// An empty assignment; fill it with [`AssignStmt::lhs`] and
    /// [`AssignStmt::rhs`].
    pub fn assign(&self, origin: Span) -> AssignStmt {
        AssignStmt::new(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stmt;
    use stagegen_core::BuildError;

    #[test]
    fn swap() {
        let mut pkg = Package::default();
        let a = pkg.define_var("a", 1, true, Span::NONE).unwrap();
        let b = pkg.define_var("b", 2, true, Span::NONE).unwrap();
        let swap = pkg
            .assign(Span::NONE)
            .lhs(vec![a.reference(), b.reference()])
            .rhs(vec![b.val(), a.val()]);
        let root = pkg.root();
        let mut ctx = BlockCtx::new(&mut pkg, root);
        let out = Stmt::from(swap).build(&mut ctx).unwrap();
        assert_eq!(
            out,
            ast::Stmt::Assign {
                lhs: vec![ast::Expr::ident("a"), ast::Expr::ident("b")],
                tok: ast::AssignTok::Assign,
                rhs: vec![ast::Expr::ident("b"), ast::Expr::ident("a")],
            }
        );
    }

    #[test]
    fn check_runs_at_build() {
        let mut pkg = Package::default();
        let a = pkg.define_var("a", 1, true, Span::NONE).unwrap();
        let text = pkg.new_expr("x");
        let at = Span::point(3, 1);
        let stmt = pkg.assign(at).lhs(vec![a.reference()]).rhs(vec![text]);
        let root = pkg.root();
        let mut ctx = BlockCtx::new(&mut pkg, root);
        let err = Stmt::from(stmt).build(&mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::CannotAssign { .. }));
    }
}
