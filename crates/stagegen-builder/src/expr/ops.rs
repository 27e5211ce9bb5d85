//! Binary and unary operators.
//!
//! Operand types are unified first (an untyped constant takes the type of
//! the other side, two untyped constants take the wider untyped kind), then
//! the operator is checked against the unified type. Comparisons yield an
//! untyped bool. When both operands are constants and
//! [`BuildProperty::FoldConstants`] is on, the result carries the folded
//! value.

use stagegen_core::{
    BasicKind, BinaryOp, BuildError, BuildProperty, ConstValue, Span, Type, TypeId, UnaryOp,
};

use super::Result;
use crate::ast;
use crate::node::{Expr, Operand};
use crate::package::Package;

/// Rank of untyped numeric kinds; the wider kind wins when both sides are
/// untyped.
fn untyped_rank(kind: BasicKind) -> u8 {
    match kind {
        BasicKind::UntypedInt => 1,
        BasicKind::UntypedFloat => 2,
        _ => 0,
    }
}

impl Package {
    /// `x op y`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn binary_op(
        &mut self,
        x: impl Into<Operand>,
        op: BinaryOp,
        y: impl Into<Operand>,
        origin: Span,
    ) -> Result<Expr> {
        let x = self.value_operand(x)?;
        let y = self.value_operand(y)?;
        let src = ast::Expr::Binary {
            op,
            x: Box::new(x.src.clone()),
            y: Box::new(y.src.clone()),
        };

        if op.is_shift() {
            return self.shift(x, op, y, src, origin);
        }

        let operand_t = self.unify(&x, &y, &src, origin)?;
        self.check_operator(op, operand_t, &x, &y, &src, origin)?;

        let typ = if op.is_comparison() {
            self.types.basic(BasicKind::UntypedBool)
        } else {
            operand_t
        };

        if matches!(op, BinaryOp::Div | BinaryOp::Rem)
            && self.types.basic_info(operand_t).is_integer()
            && y.val.as_ref().is_some_and(ConstValue::is_zero)
        {
            return Err(BuildError::DivisionByZero { span: origin });
        }

        let val = self.fold(op, &x, &y, typ, origin)?;
        Ok(Expr::new(src, typ, origin).with_value(val))
    }

    /// The common operand type of `x` and `y`.
    fn unify(&self, x: &Expr, y: &Expr, src: &ast::Expr, origin: Span) -> Result<TypeId> {
        let (xu, yu) = (self.types.is_untyped(x.typ), self.types.is_untyped(y.typ));
        let nil = self.types.basic(BasicKind::UntypedNil);
        let ok = match (xu, yu) {
            (false, false) => self.types.identical(x.typ, y.typ),
            (true, false) => self.types.assignable_value(x.typ, x.val.as_ref(), y.typ),
            (false, true) => self.types.assignable_value(y.typ, y.val.as_ref(), x.typ),
            (true, true) => {
                let (xk, yk) = (self.types.basic_kind(x.typ), self.types.basic_kind(y.typ));
                match (xk, yk) {
                    (Some(a), Some(b)) if a == b => true,
                    (Some(a), Some(b)) => untyped_rank(a) > 0 && untyped_rank(b) > 0,
                    _ => false,
                }
            }
        };
        if !ok {
            return Err(BuildError::TypeMismatch {
                message: format!(
                    "invalid operation: {src} (mismatched types {} and {})",
                    self.types.display(x.typ),
                    self.types.display(y.typ)
                ),
                span: origin,
            });
        }
        Ok(match (xu, yu) {
            (false, _) => x.typ,
            (true, false) => y.typ,
            (true, true) if x.typ == nil => y.typ,
            (true, true) => {
                let (xk, yk) = (self.types.basic_kind(x.typ), self.types.basic_kind(y.typ));
                match (xk, yk) {
                    (Some(a), Some(b)) if untyped_rank(b) > untyped_rank(a) => y.typ,
                    _ => x.typ,
                }
            }
        })
    }

    fn check_operator(
        &self,
        op: BinaryOp,
        t: TypeId,
        x: &Expr,
        y: &Expr,
        src: &ast::Expr,
        origin: Span,
    ) -> Result<()> {
        let info = self.types.basic_info(t);
        let nil = self.types.basic(BasicKind::UntypedNil);
        let allowed = match op {
            _ if op.is_logical() => info.is_boolean(),
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let against_nil = x.typ == nil || y.typ == nil;
                if against_nil {
                    t != nil
                } else {
                    self.types.comparable(t)
                }
            }
            _ if op.is_ordering() => info.is_ordered(),
            BinaryOp::Add => info.is_numeric() || info.is_string(),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => info.is_numeric(),
            _ => info.is_integer(),
        };
        if allowed {
            return Ok(());
        }
        let culprit = if x.typ == t { x } else { y };
        Err(BuildError::NoOperator {
            op: op.as_str().to_owned(),
            expr: src.to_string(),
            typ: self.types.type_string(culprit.typ),
            span: origin,
        })
    }

    fn shift(&self, x: Expr, op: BinaryOp, y: Expr, src: ast::Expr, origin: Span) -> Result<Expr> {
        let x_int = match &x.val {
            Some(v) if self.types.is_untyped(x.typ) => v.as_int().is_some(),
            _ => self.types.basic_info(x.typ).is_integer(),
        };
        if !x_int {
            return Err(BuildError::NoOperator {
                op: op.as_str().to_owned(),
                expr: src.to_string(),
                typ: self.types.type_string(x.typ),
                span: origin,
            });
        }
        let count_ok = match &y.val {
            Some(v) => v.as_int().is_some_and(|s| s >= 0),
            None => self.types.basic_info(y.typ).is_integer(),
        };
        if !count_ok {
            return Err(BuildError::InvalidOperation {
                expr: src.to_string(),
                reason: format!("shift count {y} must be a non-negative integer"),
                span: origin,
            });
        }

        let typ = match (&x.val, &y.val) {
            (Some(_), None) if self.types.is_untyped(x.typ) => self.types.int(),
            (Some(_), Some(_)) if self.types.is_untyped(x.typ) => {
                self.types.basic(BasicKind::UntypedInt)
            }
            _ => x.typ,
        };
        let val = self.fold(op, &x, &y, typ, origin)?;
        Ok(Expr::new(src, typ, origin).with_value(val))
    }

    /// Folds a binary operation over two constants, checking the result fits
    /// a typed result type.
    fn fold(
        &self,
        op: BinaryOp,
        x: &Expr,
        y: &Expr,
        typ: TypeId,
        origin: Span,
    ) -> Result<Option<ConstValue>> {
        if !self.config().enabled(BuildProperty::FoldConstants) {
            return Ok(None);
        }
        let (Some(a), Some(b)) = (&x.val, &y.val) else {
            return Ok(None);
        };
        let Some(v) = a.fold_binary(op, b, origin)? else {
            return Ok(None);
        };
        self.fit_constant(v, typ, origin).map(Some)
    }

    fn fit_constant(&self, v: ConstValue, typ: TypeId, origin: Span) -> Result<ConstValue> {
        match self.types.basic_kind(typ) {
            Some(kind) if !kind.info().is_untyped() => {
                v.representable(kind).ok_or_else(|| BuildError::ConstantOverflow {
                    value: v.to_string(),
                    typ: kind.name().to_owned(),
                    span: origin,
                })
            }
            _ => Ok(v),
        }
    }

    /// `op x`.
    ///
    /// `&x` takes an assignment target and yields a pointer to its type;
    /// `<-x` receives from a channel.
    pub fn unary_op(&mut self, op: UnaryOp, x: &Expr, origin: Span) -> Result<Expr> {
        let src = ast::Expr::Unary {
            op,
            x: Box::new(x.src.clone()),
        };

        if op == UnaryOp::Addr {
            let Some(target) = self.types.ref_target(x.typ) else {
                return Err(BuildError::InvalidOperation {
                    expr: src.to_string(),
                    reason: format!("cannot take address of {}", x.src),
                    span: origin,
                });
            };
            let typ = self.types.pointer(target);
            return Ok(Expr::new(src, typ, origin));
        }

        self.check_operand(x)?;
        let info = self.types.basic_info(x.typ);
        let typ = match op {
            UnaryOp::Neg | UnaryOp::Plus if info.is_numeric() => x.typ,
            UnaryOp::Not if info.is_boolean() => x.typ,
            UnaryOp::BitNot if info.is_integer() => x.typ,
            UnaryOp::Recv => match self.types.get(self.types.underlying(x.typ)) {
                Type::Chan { elem, .. } => *elem,
                _ => return Err(self.no_unary(op, x, &src, origin)),
            },
            _ => return Err(self.no_unary(op, x, &src, origin)),
        };

        let fold = self.config().enabled(BuildProperty::FoldConstants);
        let val = match &x.val {
            Some(v) if fold => match v.fold_unary(op) {
                Some(folded) => Some(self.fit_constant(folded, typ, origin)?),
                None => None,
            },
            _ => None,
        };
        Ok(Expr::new(src, typ, origin).with_value(val))
    }

    fn no_unary(&self, op: UnaryOp, x: &Expr, src: &ast::Expr, origin: Span) -> BuildError {
        BuildError::NoOperator {
            op: op.as_str().to_owned(),
            expr: src.to_string(),
            typ: self.types.type_string(x.typ),
            span: origin,
        }
    }
}
