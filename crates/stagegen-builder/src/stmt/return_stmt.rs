//! Return statements.

use stagegen_core::{BuildError, Span};

use super::Result;
use crate::assign::{Tuple, check_values};
use crate::ast;
use crate::context::BlockCtx;
use crate::node::Expr;
use crate::package::Package;

/// `return results...`, checked against the enclosing function's results.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    results: Vec<Expr>,
    origin: Span,
}

impl ReturnStmt {
    pub(super) fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        let types = ctx.types();
        let Some(sig) = ctx.func_signature().and_then(|s| types.signature_of(s)) else {
            return Err(BuildError::InvalidOperation {
                expr: "return".into(),
                reason: "return outside function".into(),
                span: self.origin,
            });
        };
        let results = Tuple::of(&self.results, types);
        check_values(types, &sig.results, results, self.origin)?;
        let srcs = self.results.iter().map(|e| e.src.clone()).collect();
        Ok(ast::Stmt::Return(srcs))
    }
}

impl Package {
    pub fn return_stmt(&self, results: Vec<Expr>, origin: Span) -> ReturnStmt {
        ReturnStmt { results, origin }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stmt;

    #[test]
    fn outside_function() {
        let mut pkg = Package::default();
        let stmt = pkg.return_stmt(vec![], Span::point(1, 1));
        let root = pkg.root();
        let mut ctx = BlockCtx::new(&mut pkg, root);
        let err = Stmt::from(stmt).build(&mut ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "at 1:1: invalid operation return (return outside function)"
        );
    }

    #[test]
    fn results_are_checked() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let error = pkg.types().error();
        let sig = pkg.types_mut().signature(vec![], vec![int, error], false);
        let ok = pkg.return_stmt(vec![pkg.new_expr(1), pkg.nil()], Span::NONE);
        let short = pkg.return_stmt(vec![pkg.new_expr(1)], Span::NONE);
        let wrong = pkg.return_stmt(vec![pkg.new_expr("x"), pkg.nil()], Span::NONE);
        let root = pkg.root();
        let mut ctx = BlockCtx::new(&mut pkg, root).in_func(sig);
        assert_eq!(
            Stmt::from(ok).build(&mut ctx).unwrap(),
            ast::Stmt::Return(vec![
                ast::Expr::BasicLit(stagegen_core::ConstValue::Int(1)),
                ast::Expr::ident("nil"),
            ])
        );
        assert!(matches!(
            Stmt::from(short).build(&mut ctx),
            Err(BuildError::AssignMismatch { lhs: 2, rhs: 1, .. })
        ));
        assert!(matches!(
            Stmt::from(wrong).build(&mut ctx),
            Err(BuildError::CannotAssign { .. })
        ));
    }
}
