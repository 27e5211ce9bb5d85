//! If statements.
//!
//! ```text
//! if init; cond {      <- one "if" scope: init, cond and body
//!     body
//! } else ...           <- else branch opens its own scope inside it
//! ```

use stagegen_core::{BuildError, Span};

use super::{BlockStmt, Result, Stmt, build_block};
use crate::ast;
use crate::context::BlockCtx;
use crate::node::Expr;
use crate::package::Package;

/// `if init; cond { body } else ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    init: Option<Box<Stmt>>,
    cond: Option<Expr>,
    body: Vec<Stmt>,
    else_branch: Option<Box<Stmt>>,
    origin: Span,
}

impl IfStmt {
    pub fn new(origin: Span) -> Self {
        Self {
            init: None,
            cond: None,
            body: Vec::new(),
            else_branch: None,
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

    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }

    pub fn add(mut self, stmt: impl Into<Stmt>) -> Self {
        self.body.push(stmt.into());
        self
    }

    /// Sets the else branch. A single `If` chains, a single block is used as
    /// is, anything else is wrapped in a block; an empty list clears it.
    pub fn else_branch(mut self, list: Vec<Stmt>) -> Self {
        self.else_branch = match <[Stmt; 1]>::try_from(list) {
            Ok([one @ (Stmt::If(_) | Stmt::Block(_))]) => Some(Box::new(one)),
            Ok([one]) => Some(Box::new(BlockStmt::new(vec![one]).into())),
            Err(list) if list.is_empty() => None,
            Err(list) => Some(Box::new(BlockStmt::new(list).into())),
        };
        self
    }

    pub(super) fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        let mut scope = ctx.child("if", self.origin);
        let init = self.init.as_ref().map(|s| s.build(&mut scope)).transpose()?;
        let cond = self.cond.as_ref().ok_or(BuildError::MissingPart {
            part: "condition",
            construct: "if statement",
            span: self.origin,
        })?;
        check_condition(&scope, cond, "if statement")?;
        let body = build_block(&self.body, &mut scope)?;
        let else_branch = match self.else_branch.as_deref() {
            Some(Stmt::Block(b)) => Some(ast::Stmt::Block(b.build_inner(&mut scope)?)),
            Some(other) => Some(other.build(&mut scope)?),
            None => None,
        };
        Ok(ast::Stmt::If(Box::new(ast::IfStmt {
            init,
            cond: cond.src.clone(),
            body,
            else_branch,
        })))
    }
}

impl Package {
    /// An empty if statement; a condition must be set before it is built.
    pub fn if_stmt(&self, origin: Span) -> IfStmt {
        IfStmt::new(origin)
    }
}

/// Conditions must be boolean-typed single values.
pub(super) fn check_condition(
    ctx: &BlockCtx<'_>,
    cond: &Expr,
    construct: &'static str,
) -> Result<()> {
    let types = ctx.types();
    let single = types.tuple_elems(cond.typ).is_none()
        && types.ref_target(cond.typ).is_none()
        && types.denoted(cond.typ).is_none();
    if single && types.basic_info(cond.typ).is_boolean() {
        return Ok(());
    }
    Err(BuildError::NonBoolean {
        expr: cond.src.to_string(),
        typ: types.type_string(cond.typ),
        construct,
        span: cond.origin,
    })
}
