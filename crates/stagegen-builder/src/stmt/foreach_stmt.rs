//! Range loops.

use stagegen_core::{BuildError, Kind, Span};

use super::{Result, Stmt, build_block};
use crate::ast;
use crate::context::BlockCtx;
use crate::node::{Expr, Var, VarForm};
use crate::package::Package;
use crate::scope::Symbol;

/// `for key, value := range x { body }`.
///
/// Built by [`Package::for_each`]. With `auto` the loop variables are
/// declared by the loop; otherwise they are assigned to existing variables
/// of the same names.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    key: Option<Var>,
    value: Option<Var>,
    auto: bool,
    x: Expr,
    body: Vec<Stmt>,
    origin: Span,
}

impl RangeStmt {
    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }

    pub fn add(mut self, stmt: impl Into<Stmt>) -> Self {
        self.body.push(stmt.into());
        self
    }

    pub(super) fn build(&self, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
        let tok = if self.auto {
            ast::AssignTok::Define
        } else {
            for var in self.key.iter().chain(&self.value) {
                check_existing(ctx, var)?;
            }
            ast::AssignTok::Assign
        };

        let mut scope = ctx.child("range", self.origin);
        if self.auto {
            for var in self.key.iter().chain(&self.value) {
                scope.declare_var(var.name(), var.typ(), var.span())?;
            }
        }
        let mut inner = scope.child("range body", self.origin);
        let body = build_block(&self.body, &mut inner)?;

        let key = match (&self.key, &self.value) {
            (Some(k), _) => Some(k.name().to_owned()),
            (None, Some(_)) => Some("_".to_owned()),
            (None, None) => None,
        };
        Ok(ast::Stmt::Range(Box::new(ast::RangeStmt {
            key,
            value: self.value.as_ref().map(|v| v.name().to_owned()),
            tok,
            x: self.x.src.clone(),
            body,
        })))
    }
}

/// A loop variable assigned rather than declared must name a variable that
/// can hold the slot's type.
fn check_existing(ctx: &BlockCtx<'_>, var: &Var) -> Result<()> {
    let Some(Symbol::Var { typ, .. }) = ctx.lookup(var.name()) else {
        return Err(BuildError::UndefinedIdentifier {
            name: var.name().to_owned(),
            span: var.span(),
        });
    };
    let types = ctx.types();
    if !types.assignable_to(var.typ(), *typ) {
        return Err(BuildError::CannotAssign {
            from: types.type_string(var.typ()),
            to: types.type_string(*typ),
            span: var.span(),
        });
    }
    Ok(())
}

impl Package {
    /// Iterates the sequence `x`.
    ///
    /// Returns the loop and its key (`int`) and value (element type)
    /// variables; an empty name omits the variable. Only Sequence operands
    /// are handled.
    pub fn for_each(
        &mut self,
        key: &str,
        value: &str,
        auto: bool,
        x: &Expr,
        origin: Span,
    ) -> Result<(RangeStmt, Option<Var>, Option<Var>)> {
        self.check_operand(x)?;
        let kind = self.types.kind(x.typ);
        if kind != Kind::Sequence {
            let typ = self.types.type_string(x.typ);
            return Err(BuildError::NotSupported {
                what: format!("range over {} (type {typ})", x.src),
                span: x.origin.or(origin),
            });
        }
        let Some(elem) = self.types.elem(x.typ) else {
            let typ = self.types.type_string(x.typ);
            return Err(BuildError::Other {
                message: format!("sequence {typ} has no element type"),
                span: origin,
            });
        };

        let int = self.types.int();
        let types = &mut self.types;
        let mut declare = |name: &str, typ| {
            (!name.is_empty()).then(|| Var::new(name, typ, types, VarForm::Range, origin, auto))
        };
        let key = declare(key, int);
        let value = declare(value, elem);
        let stmt = RangeStmt {
            key: key.clone(),
            value: value.clone(),
            auto,
            x: x.clone(),
            body: Vec::new(),
            origin,
        };
        Ok((stmt, key, value))
    }
}
