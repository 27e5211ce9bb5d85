//! Variable declarations.
//!
//! A [`Var`] is created up front so its views can be used while the rest of
//! the body is assembled; it enters a scope only when its declaring
//! statement is finalized.

use stagegen_core::{BuildError, Span, TypeId};

use super::{AssignStmt, Result};
use crate::assign::{Tuple, check_values};
use crate::ast;
use crate::context::BlockCtx;
use crate::node::{Operand, Var, VarForm};
use crate::package::Package;

impl Package {
    /// `name := val`.
    ///
    /// The variable takes the default type of `val`; untyped nil has none
    /// and is rejected.
    pub fn define_var(
        &mut self,
        name: &str,
        val: impl Into<Operand>,
        auto: bool,
        origin: Span,
    ) -> Result<Var> {
        let val = self.new_expr(val);
        if self.types.tuple_elems(val.typ).is_some() {
            let any = self.types.any();
            let vals = Tuple::of(std::slice::from_ref(&val), &self.types);
            check_values(&self.types, &[any], vals, origin)?;
        }
        if val.is_untyped_nil(&self.types) {
            return Err(BuildError::InvalidOperation {
                expr: format!("{name} := {}", val.src),
                reason: "use of untyped nil".into(),
                span: origin,
            });
        }
        self.check_operand(&val)?;
        let typ = self.types.default_type(val.typ);
        let form = VarForm::Define(val);
        Ok(Var::new(name, typ, &mut self.types, form, origin, auto))
    }

    /// `var name T = val`.
    ///
    /// At least one of `typ` and `val` is required. With both, `val` must be
    /// assignable to `typ`; with only `val`, the variable takes its default
    /// type.
    pub fn new_var(
        &mut self,
        name: &str,
        typ: Option<TypeId>,
        val: Option<Operand>,
        auto: bool,
        origin: Span,
    ) -> Result<Var> {
        let val = val.map(|v| self.new_expr(v));
        let typ = match (typ, &val) {
            (None, None) => {
                return Err(BuildError::MissingPart {
                    part: "type or value",
                    construct: "variable declaration",
                    span: origin,
                });
            }
            (Some(t), Some(v)) => {
                let vals = Tuple::of(std::slice::from_ref(v), &self.types);
                check_values(&self.types, &[t], vals, origin)?;
                t
            }
            (Some(t), None) => t,
            (None, Some(v)) => {
                if v.is_untyped_nil(&self.types) {
                    return Err(BuildError::InvalidOperation {
                        expr: format!("var {name} = {}", v.src),
                        reason: "use of untyped nil".into(),
                        span: origin,
                    });
                }
                self.check_operand(v)?;
                self.types.default_type(v.typ)
            }
        };
        let form = VarForm::Declare {
            typ: (!auto).then(|| self.types.type_string(typ)),
            value: val,
        };
        Ok(Var::new(name, typ, &mut self.types, form, origin, auto))
    }

    /// `var = append(var, arg)`.
    pub fn append_to(
        &mut self,
        var: &Var,
        arg: impl Into<Operand>,
        origin: Span,
    ) -> Result<AssignStmt> {
        let grown = self.call("append", vec![var.val().into(), arg.into()], false, origin)?;
        let stmt = self.assign(origin).lhs(vec![var.reference()]);
        Ok(stmt.rhs(vec![grown]))
    }
}

/// Declares `v` in the current scope and emits its declaring statement.
pub(super) fn build(v: &Var, ctx: &mut BlockCtx<'_>) -> Result<ast::Stmt> {
    let Some(stmt) = v.stmt() else {
        return Err(BuildError::InvalidOperation {
            expr: v.name().to_owned(),
            reason: "variable has no declaring statement".into(),
            span: v.span(),
        });
    };
    ctx.declare_var(v.name(), v.typ(), v.span())?;
    tracing::trace!(name = v.name(), scope = ctx.scope().index(), "declared");
    Ok(stmt)
}
