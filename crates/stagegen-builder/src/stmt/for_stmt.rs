//! Three-clause loops and the counted loop.

use stagegen_core::{BasicKind, BinaryOp, BuildError, Span};

use super::if_stmt::check_condition;
use super::{Result, Stmt, build_block};
use crate::ast;
use crate::context::BlockCtx;
use crate::node::{Expr, Operand, Var};
use crate::package::Package;

/// `for init; cond; post { body }`; every clause is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    init: Option<Box<Stmt>>,
    cond: Option<Expr>,
    post: Option<Box<Stmt>>,
    body: Vec<Stmt>,
    origin: Span,
}

impl ForStmt {
    pub fn new(origin: Span) -> Self {
        Self {
            init: None,
            cond: None,
            post: None,
            body: Vec::new(),
            origin,
        }
    }

    pub fn init(mut self, init: impl Into<Stmt>) -> Self {
        self.init = Some(Box::new(init.into()));
        self
    }

    pub fn cond(mut self, cond: Expr) -> Self {
        self.cond = Some(cond);
        self
    }

    pub fn post(mut self, post: impl Into<Stmt>) -> Self {
        self.post = Some(Box::new(post.into()));
        self
    }

    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }

    pub fn add(mut self, stmt: impl Into<Stmt>) -> Self {
        self.body.push(stmt.into());
        self
    }

    pub(super) fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        let mut scope = ctx.child("for", self.origin);
        let init = self.init.as_ref().map(|s| s.build(&mut scope)).transpose()?;
        if let Some(cond) = &self.cond {
            check_condition(&scope, cond, "for statement")?;
        }
        let post = match self.post.as_deref() {
            Some(Stmt::Var(v)) => {
                return Err(BuildError::InvalidOperation {
                    expr: v.name().to_owned(),
                    reason: "cannot declare in post statement of for loop".into(),
                    span: v.span().or(self.origin),
                });
            }
            Some(s) => Some(s.build(&mut scope)?),
            None => None,
        };
        let mut inner = scope.child("for body", self.origin);
        let body = build_block(&self.body, &mut inner)?;
        Ok(ast::Stmt::For(Box::new(ast::ForStmt {
            init,
            cond: self.cond.as_ref().map(|c| c.src.clone()),
            post,
            body,
        })))
    }
}

impl Package {
    /// An empty three-clause loop.
    pub fn for_stmt(&self, origin: Span) -> ForStmt {
        ForStmt::new(origin)
    }

    /// `for name := 0; name < n; name++ {}`.
    ///
    /// Returns the loop together with its counter so the body can refer to
    /// it. The counter takes `n`'s type when `n` is a typed integer.
    pub fn times(
        &mut self,
        n: impl Into<Operand>,
        name: &str,
        origin: Span,
    ) -> Result<(ForStmt, Var)> {
        let n = self.value_operand(n)?;
        let info = self.types.basic_info(n.typ);
        let counter = if self.types.is_untyped(n.typ) {
            let int = n.val.as_ref().and_then(|v| v.representable(BasicKind::Int));
            if int.is_none() {
                return Err(not_a_count(&n, self.types.type_string(n.typ), origin));
            }
            self.define_var(name, 0, true, origin)?
        } else if info.is_integer() {
            if n.typ == self.types.int() {
                self.define_var(name, 0, true, origin)?
            } else {
                self.new_var(name, Some(n.typ), Some(0.into()), false, origin)?
            }
        } else {
            return Err(not_a_count(&n, self.types.type_string(n.typ), origin));
        };

        let cond = self.binary_op(counter.val(), BinaryOp::Less, n, origin)?;
        let post = self.inc_dec(counter.reference(), true, origin);
        let stmt = ForStmt::new(origin).init(counter.clone());
        Ok((stmt.cond(cond).post(post), counter))
    }
}

fn not_a_count(n: &Expr, typ: String, origin: Span) -> BuildError {
    BuildError::TypeMismatch {
        message: format!("loop count {} (type {typ}) is not an integer", n.src),
        span: n.origin.or(origin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(pkg: &mut Package, stmt: ForStmt) -> Result<ast::Stmt> {
        let root = pkg.root();
        let mut ctx = BlockCtx::new(pkg, root);
        Stmt::from(stmt).build(&mut ctx)
    }

    #[test]
    fn counted_loop_shape() {
        let mut pkg = Package::default();
        let (lp, i) = pkg.times(3, "i", Span::NONE).unwrap();
        assert_eq!(i.typ(), pkg.types().int());
        let body = pkg
            .call("println", vec![(&i).into()], false, Span::NONE)
            .unwrap();
        let ast::Stmt::For(out) = build(&mut pkg, lp.add(body)).unwrap() else {
            panic!("expected a for statement");
        };
        assert_eq!(
            out.init,
            Some(ast::Stmt::Assign {
                lhs: vec![ast::Expr::ident("i")],
                tok: ast::AssignTok::Define,
                rhs: vec![ast::Expr::BasicLit(stagegen_core::ConstValue::Int(0))],
            })
        );
        assert_eq!(out.cond.map(|c| c.to_string()).as_deref(), Some("i < 3"));
        assert_eq!(
            out.post,
            Some(ast::Stmt::IncDec {
                x: ast::Expr::ident("i"),
                inc: true,
            })
        );
        assert_eq!(out.body.stmts.len(), 1);
    }

    #[test]
    fn counter_follows_typed_count() {
        let mut pkg = Package::default();
        let int64 = pkg.types().basic(BasicKind::Int64);
        let n = Expr::new(ast::Expr::ident("n"), int64, Span::NONE);
        let (_, i) = pkg.times(n, "i", Span::NONE).unwrap();
        assert_eq!(i.typ(), int64);
        assert!(!i.is_auto());
    }

    #[test]
    fn count_must_be_integer() {
        let mut pkg = Package::default();
        assert!(pkg.times(2.5, "i", Span::NONE).is_err());
        assert!(pkg.times("three", "i", Span::NONE).is_err());
        assert!(pkg.times(2.0, "i", Span::NONE).is_ok());
    }

    #[test]
    fn non_boolean_condition() {
        let mut pkg = Package::default();
        let cond = pkg.new_expr(1);
        let lp = pkg.for_stmt(Span::point(2, 1)).cond(cond);
        let err = build(&mut pkg, lp).unwrap_err();
        assert!(matches!(err, BuildError::NonBoolean { .. }));
    }

    #[test]
    fn post_cannot_declare() {
        let mut pkg = Package::default();
        let j = pkg.define_var("j", 0, true, Span::NONE).unwrap();
        let lp = pkg.for_stmt(Span::NONE).post(j);
        let err = build(&mut pkg, lp).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOperation { .. }));
    }

    #[test]
    fn body_may_shadow_counter() {
        let mut pkg = Package::default();
        let (lp, _) = pkg.times(2, "i", Span::NONE).unwrap();
        let shadow = pkg.define_var("i", "x", true, Span::NONE).unwrap();
        assert!(build(&mut pkg, lp.add(shadow)).is_ok());
    }

    #[test]
    fn empty_loop_is_allowed() {
        let mut pkg = Package::default();
        let lp = pkg.for_stmt(Span::NONE);
        let ast::Stmt::For(out) = build(&mut pkg, lp).unwrap() else {
            panic!("expected a for statement");
        };
        assert!(out.init.is_none());
        assert!(out.cond.is_none() && out.post.is_none());
    }
}
