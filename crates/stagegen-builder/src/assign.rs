//! Assignability checker.
//!
//! Shared by assignments, declarations with initializers and returns. The
//! right-hand side is a [`Tuple`]: either a list of single-valued
//! expressions, or one multi-valued call whose results are expanded in
//! place.
//!
//! Arity is always checked before any slot, so a count mismatch is reported
//! ahead of a type mismatch; slots are then checked left to right and the
//! first failure wins.

use stagegen_core::{BuildError, Span, TypeId, TypeUniverse};

use crate::node::Expr;

type Result<T> = std::result::Result<T, BuildError>;

/// The right-hand side of an assignment-like construct.
#[derive(Debug, Clone, Copy)]
pub enum Tuple<'a> {
    /// One value per expression.
    Exprs(&'a [Expr]),
    /// A single call producing several values.
    Call(&'a Expr),
}

impl<'a> Tuple<'a> {
    /// Classifies `rhs`: a lone expression of tuple type expands.
    pub fn of(rhs: &'a [Expr], types: &TypeUniverse) -> Self {
        match rhs {
            [only] if types.tuple_elems(only.typ).is_some_and(|e| e.len() > 1) => Tuple::Call(only),
            _ => Tuple::Exprs(rhs),
        }
    }

    /// Number of values after expansion.
    pub fn arity(&self, types: &TypeUniverse) -> usize {
        match self {
            Tuple::Exprs(list) => list.len(),
            Tuple::Call(call) => types.tuple_elems(call.typ).map_or(1, <[_]>::len),
        }
    }
}

/// Checks that each value of `rhs` can be stored into the matching target of
/// `lhs`.
pub fn check_assignable(
    types: &TypeUniverse,
    lhs: &[Expr],
    rhs: Tuple<'_>,
    origin: Span,
) -> Result<()> {
    let targets: Vec<TypeId> = lhs.iter().map(|l| l.typ).collect();
    check_into(types, lhs, &targets, rhs, origin, true)
}

/// Like [`check_assignable`] for targets that are plain types rather than
/// reference nodes (declared variables, function results).
pub fn check_values(
    types: &TypeUniverse,
    targets: &[TypeId],
    rhs: Tuple<'_>,
    origin: Span,
) -> Result<()> {
    check_into(types, &[], targets, rhs, origin, false)
}

fn check_into(
    types: &TypeUniverse,
    lhs: &[Expr],
    targets: &[TypeId],
    rhs: Tuple<'_>,
    origin: Span,
    need_ref: bool,
) -> Result<()> {
    let nl = targets.len();
    let nr = rhs.arity(types);
    if nl != nr {
        return Err(match rhs {
            Tuple::Call(call) => BuildError::CallAssignMismatch {
                lhs: nl,
                caller: call.caller(),
                rhs: nr,
                span: origin,
            },
            Tuple::Exprs(_) => BuildError::AssignMismatch {
                lhs: nl,
                rhs: nr,
                span: origin,
            },
        });
    }

    for i in 0..nl {
        let target = if need_ref {
            let l = &lhs[i];
            match types.ref_target(l.typ) {
                Some(t) => t,
                None => {
                    return Err(BuildError::Unassignable {
                        expr: l.src.to_string(),
                        span: l.origin.or(origin),
                    });
                }
            }
        } else {
            targets[i]
        };

        let (from, value, text, span) = match rhs {
            Tuple::Exprs(list) => {
                let r = &list[i];
                let unusable = r.typ == types.invalid()
                    || types.tuple_elems(r.typ).is_some()
                    || types.ref_target(r.typ).is_some()
                    || types.denoted(r.typ).is_some();
                if unusable {
                    return Err(BuildError::InvalidOperand {
                        expr: r.src.to_string(),
                        reason: "cannot be used as a value",
                        span: r.origin.or(origin),
                    });
                }
                (r.typ, r.val.as_ref(), r.src.to_string(), r.origin.or(origin))
            }
            Tuple::Call(call) => {
                let elems = types.tuple_elems(call.typ).unwrap_or_default();
                (elems[i], None, call.src.to_string(), origin)
            }
        };

        if !types.assignable_value(from, value, target) {
            tracing::trace!(%text, "assignment slot {i} rejected");
            return Err(BuildError::CannotAssign {
                from: types.type_string(from),
                to: types.type_string(target),
                span,
            });
        }
    }
    Ok(())
}
