//! Statement builders.
//!
//! A statement is assembled first and checked later: each builder collects
//! its parts, and [`Stmt::build`] finalizes it against a [`BlockCtx`],
//! creating whatever scopes the construct opens and running the checks that
//! need them. Building the same statement twice derives its output afresh
//! from the current parts.
//!
//! - [`AssignStmt`] - `a, b = x, y`
//! - [`BlockStmt`] - `{ ... }` in a fresh scope
//! - [`IfStmt`] - `if init; cond { ... } else ...`
//! - [`ForStmt`] - `for init; cond; post { ... }`, and the counted loop
//! - [`RangeStmt`] - `for k, v := range xs { ... }`
//! - [`ReturnStmt`] - `return a, b`

mod assign_stmt;
mod block;
mod for_stmt;
mod foreach_stmt;
mod if_stmt;
mod return_stmt;
mod var_decl;

pub use assign_stmt::AssignStmt;
pub use block::BlockStmt;
pub use for_stmt::ForStmt;
pub use foreach_stmt::RangeStmt;
pub use if_stmt::IfStmt;
pub use return_stmt::ReturnStmt;

use stagegen_core::{BuildError, BuildProperty, Span};

use crate::ast;
use crate::context::BlockCtx;
use crate::node::{Expr, Var};
use crate::package::Package;

type Result<T> = std::result::Result<T, BuildError>;

/// Any statement a body can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(AssignStmt),
    Block(BlockStmt),
    If(IfStmt),
    For(ForStmt),
    Range(RangeStmt),
    /// The declaring statement of a variable.
    Var(Var),
    /// An expression evaluated for its effect.
    Expr(Expr),
    IncDec(IncDecStmt),
    Return(ReturnStmt),
}

impl Stmt {
    /// Finalizes the statement in `ctx`.
    pub fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        match self {
            Stmt::Assign(s) => s.build(ctx),
            Stmt::Block(s) => s.build(ctx),
            Stmt::If(s) => s.build(ctx),
            Stmt::For(s) => s.build(ctx),
            Stmt::Range(s) => s.build(ctx),
            Stmt::Var(v) => var_decl::build(v, ctx),
            Stmt::Expr(e) => build_expr_stmt(e, ctx),
            Stmt::IncDec(s) => s.build(ctx),
            Stmt::Return(s) => s.build(ctx),
        }
    }
}

/// Finalizes `stmts` in order into a block, in the scope of `ctx`.
pub(crate) fn build_block(stmts: &[Stmt], ctx: &mut BlockCtx<'_>) -> Result<ast::Block> {
    let stmts = stmts.iter().map(|s| s.build(ctx)).collect::<Result<Vec<_>>>()?;
    Ok(ast::Block { stmts })
}

fn build_expr_stmt(e: &Expr, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
    if e.is_invalid(ctx.types()) {
        return Err(BuildError::InvalidOperand {
            expr: e.src.to_string(),
            reason: "has invalid type",
            span: e.origin,
        });
    }
    let config = ctx.package().config();
    let strict = config.enabled(BuildProperty::StrictExprStmt);
    if strict && !matches!(e.src, ast::Expr::Call { .. }) {
        return Err(BuildError::InvalidOperand {
            expr: e.src.to_string(),
            reason: "is evaluated but not used",
            span: e.origin,
        });
    }
    Ok(ast::Stmt::Expr(e.src.clone()))
}

macro_rules! impl_from_stmt {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Stmt {
                fn from(s: $ty) -> Self {
                    Stmt::$variant(s)
                }
            }
        )*
    };
}

impl_from_stmt! {
    Assign(AssignStmt),
    Block(BlockStmt),
    If(IfStmt),
    For(ForStmt),
    Range(RangeStmt),
    Var(Var),
    Expr(Expr),
    IncDec(IncDecStmt),
    Return(ReturnStmt),
}

// ============================================================================
// Increment / decrement
// ============================================================================

/// `x++` or `x--`.
#[derive(Debug, Clone, PartialEq)]
pub struct IncDecStmt {
    x: Expr,
    inc: bool,
    origin: Span,
}

impl IncDecStmt {
    fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        let types = ctx.types();
        let Some(target) = types.ref_target(self.x.typ) else {
            return Err(BuildError::Unassignable {
                expr: self.x.src.to_string(),
                span: self.origin,
            });
        };
        if !types.basic_info(target).is_numeric() {
            return Err(BuildError::NoOperator {
                op: if self.inc { "++" } else { "--" }.to_owned(),
                expr: self.x.src.to_string(),
                typ: types.type_string(target),
                span: self.origin,
            });
        }
        Ok(ast::Stmt::IncDec {
            x: self.x.src.clone(),
            inc: self.inc,
        })
    }
}

impl Package {
    /// `x++` (or `x--` when `inc` is false); `x` must be a reference.
    pub fn inc_dec(&self, x: Expr, inc: bool, origin: Span) -> IncDecStmt {
        IncDecStmt { x, inc, origin }
    }
}
