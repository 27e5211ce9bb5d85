//! Calls, conversions and builtins.
//!
//! [`Package::call`] resolves its callee first:
//!
//! - a builtin name dispatches to the per-builtin typing below
//! - a type (name or Type-as-value node) makes the call a conversion `T(x)`
//! - anything else must have a function type
//!
//! A call whose only argument is itself a multi-valued call spreads that
//! call's results over the parameters.

use stagegen_core::{BasicKind, BuildError, ConstValue, Kind, SignatureType, Span, Type, TypeId};

use super::Result;
use crate::ast;
use crate::builtins::Builtin;
use crate::node::{Expr, Operand};
use crate::package::Package;
use crate::scope::Symbol;

/// What a call invokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A name resolved in the package scope.
    Name(String),
    Expr(Expr),
}

impl From<&str> for Callee {
    fn from(name: &str) -> Self {
        Callee::Name(name.to_owned())
    }
}

impl From<String> for Callee {
    fn from(name: String) -> Self {
        Callee::Name(name)
    }
}

impl From<Expr> for Callee {
    fn from(e: Expr) -> Self {
        Callee::Expr(e)
    }
}

impl From<&Expr> for Callee {
    fn from(e: &Expr) -> Self {
        Callee::Expr(e.clone())
    }
}

/// A single argument after spreading: its type, constant value and text.
struct Arg {
    typ: TypeId,
    val: Option<ConstValue>,
    text: String,
}

impl Package {
    /// `fun(args...)`, or `fun(args...)` with the last argument spread when
    /// `ellipsis` is set.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(
        &mut self,
        callee: impl Into<Callee>,
        args: Vec<Operand>,
        ellipsis: bool,
        origin: Span,
    ) -> Result<Expr> {
        let args: Vec<Expr> = args.into_iter().map(|a| self.new_expr(a)).collect();
        let fun = match callee.into() {
            Callee::Name(name) => {
                let root = self.root();
                match self.lookup(root, &name).cloned() {
                    Some(Symbol::Builtin(b)) => return self.call_builtin(b, args, ellipsis, origin),
                    Some(Symbol::TypeName { typ }) => return self.convert(typ, &name, args, origin),
                    Some(Symbol::Func { typ, .. } | Symbol::Var { typ, .. }) => {
                        Expr::new(ast::Expr::ident(&name), typ, origin)
                    }
                    Some(Symbol::Package(_)) => {
                        return Err(BuildError::InvalidOperand {
                            expr: name,
                            reason: "is a package, not a function",
                            span: origin,
                        });
                    }
                    None => return Err(BuildError::UndefinedIdentifier { name, span: origin }),
                }
            }
            Callee::Expr(e) => e,
        };

        if let Some(t) = self.types.denoted(fun.typ) {
            let name = fun.src.to_string();
            return self.convert(t, &name, args, origin);
        }
        self.check_operand(&fun)?;
        let Some(sig) = self.types.signature_of(fun.typ).cloned() else {
            return Err(BuildError::NotCallable {
                expr: fun.src.to_string(),
                typ: self.types.type_string(fun.typ),
                span: origin,
            });
        };

        let name = fun.src.to_string();
        let spread = self.spread_args(&args)?;
        self.check_call_args(&sig, &name, &spread, ellipsis, origin)?;

        let typ = match sig.results.as_slice() {
            [one] => *one,
            results => self.types.tuple(results.to_vec()),
        };
        let src = ast::Expr::Call {
            fun: Box::new(fun.src),
            args: args.into_iter().map(Expr::into_src).collect(),
            ellipsis,
        };
        Ok(Expr::new(src, typ, origin))
    }

    /// Flattens a lone multi-valued argument into its components.
    fn spread_args(&self, args: &[Expr]) -> Result<Vec<Arg>> {
        if let [only] = args {
            if let Some(elems) = self.types.tuple_elems(only.typ) {
                if elems.len() > 1 {
                    let text = only.src.to_string();
                    return Ok(elems
                        .iter()
                        .map(|&typ| Arg {
                            typ,
                            val: None,
                            text: text.clone(),
                        })
                        .collect());
                }
            }
        }
        args.iter()
            .map(|a| {
                self.check_operand(a)?;
                Ok(Arg {
                    typ: a.typ,
                    val: a.val.clone(),
                    text: a.src.to_string(),
                })
            })
            .collect()
    }

    fn check_call_args(
        &self,
        sig: &SignatureType,
        name: &str,
        args: &[Arg],
        ellipsis: bool,
        origin: Span,
    ) -> Result<()> {
        let np = sig.params.len();
        let count_error = |got: usize| BuildError::ArgumentCountMismatch {
            what: if got < np { "not enough" } else { "too many" },
            name: name.to_owned(),
            expected: np,
            got,
            span: origin,
        };

        if ellipsis && !sig.variadic {
            return Err(BuildError::InvalidOperation {
                expr: name.to_owned(),
                reason: "cannot use ... in call to non-variadic function".into(),
                span: origin,
            });
        }
        let params: Vec<TypeId> = if sig.variadic && np > 0 && !ellipsis {
            if args.len() + 1 < np {
                return Err(count_error(args.len()));
            }
            let fixed = &sig.params[..np - 1];
            let last = sig.params[np - 1];
            let elem = self.types.elem(last).unwrap_or(self.types.invalid());
            fixed
                .iter()
                .copied()
                .chain(std::iter::repeat(elem))
                .take(args.len())
                .collect()
        } else {
            if args.len() != np {
                return Err(count_error(args.len()));
            }
            sig.params.clone()
        };

        for (arg, &param) in args.iter().zip(&params) {
            let val = arg.val.as_ref();
            if !self.types.assignable_value(arg.typ, val, param) {
                return Err(BuildError::TypeMismatch {
                    message: format!(
                        "cannot use {} (type {}) as {} value in argument to {name}",
                        arg.text,
                        self.types.display(arg.typ),
                        self.types.display(param)
                    ),
                    span: origin,
                });
            }
        }
        Ok(())
    }

    /// `T(x)`.
    fn convert(&mut self, to: TypeId, name: &str, args: Vec<Expr>, origin: Span) -> Result<Expr> {
        let got = args.len();
        let Ok([x]) = <[Expr; 1]>::try_from(args) else {
            return Err(BuildError::ArgumentCountMismatch {
                what: if got == 0 { "not enough" } else { "too many" },
                name: format!("conversion to {name}"),
                expected: 1,
                got,
                span: origin,
            });
        };
        self.check_operand(&x)?;
        if !self.types.convertible(x.typ, x.val.as_ref(), to) {
            return Err(BuildError::InvalidOperation {
                expr: format!("{name}({})", x.src),
                reason: format!(
                    "cannot convert {} (type {}) to type {}",
                    x.src,
                    self.types.display(x.typ),
                    self.types.display(to)
                ),
                span: origin,
            });
        }
        let val = match (&x.val, self.types.basic_kind(to)) {
            (Some(v), Some(kind)) => v.representable(kind),
            _ => None,
        };
        let src = ast::Expr::Call {
            fun: Box::new(self.type_expr(to)),
            args: vec![x.src],
            ellipsis: false,
        };
        Ok(Expr::new(src, to, origin).with_value(val))
    }

    // ========================================================================
    // Builtins
    // ========================================================================

    fn call_builtin(
        &mut self,
        b: Builtin,
        args: Vec<Expr>,
        ellipsis: bool,
        origin: Span,
    ) -> Result<Expr> {
        let (min, max) = b.arity();
        if args.len() < min || max.is_some_and(|m| args.len() > m) {
            let short = args.len() < min;
            return Err(BuildError::ArgumentCountMismatch {
                what: if short { "not enough" } else { "too many" },
                name: b.name().to_owned(),
                expected: if short { min } else { max.unwrap_or(min) },
                got: args.len(),
                span: origin,
            });
        }
        if ellipsis && b != Builtin::Append {
            return Err(BuildError::InvalidOperation {
                expr: b.name().to_owned(),
                reason: format!("invalid use of ... with built-in {}", b.name()),
                span: origin,
            });
        }

        let (typ, val) = match b {
            Builtin::Len | Builtin::Cap => self.builtin_len(b, &args[0], origin)?,
            Builtin::Append => (self.builtin_append(&args, ellipsis, origin)?, None),
            Builtin::Make => (self.builtin_make(&args, origin)?, None),
            Builtin::New => {
                let t = self.type_arg(b, &args[0], origin)?;
                (self.types.pointer(t), None)
            }
            Builtin::Print | Builtin::Println | Builtin::Panic => {
                for a in &args {
                    self.check_operand(a)?;
                }
                (self.types.tuple(vec![]), None)
            }
            Builtin::Delete => {
                self.builtin_delete(&args, origin)?;
                (self.types.tuple(vec![]), None)
            }
        };

        let src = ast::Expr::Call {
            fun: Box::new(ast::Expr::ident(b.name())),
            args: args.into_iter().map(Expr::into_src).collect(),
            ellipsis,
        };
        Ok(Expr::new(src, typ, origin).with_value(val))
    }

    fn builtin_len(
        &self,
        b: Builtin,
        x: &Expr,
        origin: Span,
    ) -> Result<(TypeId, Option<ConstValue>)> {
        self.check_operand(x)?;
        let kind = x.kind(&self.types);
        let ok = match (b, kind) {
            (_, Kind::Sequence | Kind::FixedArray | Kind::Channel) => true,
            (Builtin::Len, Kind::TextString | Kind::Map) => true,
            (_, Kind::Pointer) => self
                .types
                .elem(x.typ)
                .is_some_and(|e| self.types.kind(e) == Kind::FixedArray),
            _ => false,
        };
        if !ok {
            return Err(BuildError::InvalidOperation {
                expr: format!("{}({})", b.name(), x.src),
                reason: format!(
                    "invalid argument {} (type {}) for built-in {}",
                    x.src,
                    self.types.display(x.typ),
                    b.name()
                ),
                span: origin,
            });
        }
        let val = match (&x.val, b) {
            (Some(ConstValue::String(s)), Builtin::Len) => Some(ConstValue::Int(s.len() as i128)),
            _ => None,
        };
        Ok((self.types.int(), val))
    }

    fn builtin_append(&self, args: &[Expr], ellipsis: bool, origin: Span) -> Result<TypeId> {
        let s = &args[0];
        self.check_operand(s)?;
        let Type::Slice(elem) = self.types.get(self.types.underlying(s.typ)) else {
            return Err(BuildError::InvalidOperation {
                expr: format!("append({})", s.src),
                reason: format!(
                    "first argument to append must be a slice; have {} (type {})",
                    s.src,
                    self.types.display(s.typ)
                ),
                span: origin,
            });
        };
        let elem = *elem;

        let rest = &args[1..];
        if ellipsis {
            let [tail] = rest else {
                return Err(BuildError::InvalidOperation {
                    expr: "append".into(),
                    reason: "can only use ... with final argument".into(),
                    span: origin,
                });
            };
            self.check_operand(tail)?;
            let types = &self.types;
            let is_text = types.basic_info(tail.typ).is_string();
            let into_bytes = types.basic_kind(elem) == Some(BasicKind::Uint8);
            let fits = types.assignable_value(tail.typ, tail.val.as_ref(), s.typ);
            if !(is_text && into_bytes) && !fits {
                return Err(self.arg_mismatch(tail, s.typ, "append", origin));
            }
            return Ok(s.typ);
        }
        for a in rest {
            self.check_operand(a)?;
            if !self.types.assignable_value(a.typ, a.val.as_ref(), elem) {
                return Err(self.arg_mismatch(a, elem, "append", origin));
            }
        }
        Ok(s.typ)
    }

    fn builtin_make(&self, args: &[Expr], origin: Span) -> Result<TypeId> {
        let t = self.type_arg(Builtin::Make, &args[0], origin)?;
        let sizes = &args[1..];
        let (min, max) = match self.types.kind(t) {
            Kind::Sequence => (1, 2),
            Kind::Map | Kind::Channel => (0, 1),
            _ => {
                let typ = self.types.display(t);
                return Err(BuildError::InvalidOperation {
                    expr: format!("make({})", args[0].src),
                    reason: format!("cannot make {typ}; type must be slice, map, or channel"),
                    span: origin,
                });
            }
        };
        if sizes.len() < min || sizes.len() > max {
            let short = sizes.len() < min;
            return Err(BuildError::ArgumentCountMismatch {
                what: if short { "not enough" } else { "too many" },
                name: format!("make({})", self.types.display(t)),
                expected: if short { min + 1 } else { max + 1 },
                got: args.len(),
                span: origin,
            });
        }
        for size in sizes {
            self.check_operand(size)?;
            let ok = match &size.val {
                Some(v) => v.as_int().is_some_and(|n| n >= 0),
                None => self.types.basic_info(size.typ).is_integer(),
            };
            if !ok {
                return Err(BuildError::TypeMismatch {
                    message: format!(
                        "cannot use {} (type {}) as size argument in make",
                        size.src,
                        self.types.display(size.typ)
                    ),
                    span: origin,
                });
            }
        }
        if let [len, cap] = sizes {
            let int = |e: &Expr| e.val.as_ref().and_then(ConstValue::as_int);
            if let (Some(l), Some(c)) = (int(len), int(cap)) {
                if l > c {
                    return Err(BuildError::InvalidOperation {
                        expr: format!("make({}, {}, {})", args[0].src, len.src, cap.src),
                        reason: "len larger than cap in make".into(),
                        span: origin,
                    });
                }
            }
        }
        Ok(t)
    }

    fn builtin_delete(&self, args: &[Expr], origin: Span) -> Result<()> {
        let (m, key) = (&args[0], &args[1]);
        self.check_operand(m)?;
        self.check_operand(key)?;
        let Type::Map { key: key_t, .. } = self.types.get(self.types.underlying(m.typ)) else {
            return Err(BuildError::InvalidOperation {
                expr: format!("delete({}, {})", m.src, key.src),
                reason: format!(
                    "first argument to delete must be a map; have {} (type {})",
                    m.src,
                    self.types.display(m.typ)
                ),
                span: origin,
            });
        };
        let key_val = key.val.as_ref();
        if !self.types.assignable_value(key.typ, key_val, *key_t) {
            return Err(self.arg_mismatch(key, *key_t, "delete", origin));
        }
        Ok(())
    }

    /// The type denoted by a Type-as-value argument.
    fn type_arg(&self, b: Builtin, arg: &Expr, origin: Span) -> Result<TypeId> {
        self.types.denoted(arg.typ).ok_or_else(|| BuildError::InvalidOperand {
            expr: format!("{}({})", b.name(), arg.src),
            reason: "expects a type as its first argument",
            span: origin,
        })
    }

    fn arg_mismatch(&self, arg: &Expr, want: TypeId, builtin: &str, origin: Span) -> BuildError {
        BuildError::TypeMismatch {
            message: format!(
                "cannot use {} (type {}) as {} value in argument to {builtin}",
                arg.src,
                self.types.display(arg.typ),
                self.types.display(want)
            ),
            span: origin,
        }
    }

    // ========================================================================
    // Allocation sugar
    // ========================================================================

    /// `make(T, n)`.
    pub fn make(&mut self, t: TypeId, n: impl Into<Operand>, origin: Span) -> Result<Expr> {
        let typ = self.typ(t);
        self.call("make", vec![typ.into(), n.into()], false, origin)
    }

    /// `make(T, n, cap)`.
    pub fn make_cap(
        &mut self,
        t: TypeId,
        n: impl Into<Operand>,
        cap: impl Into<Operand>,
        origin: Span,
    ) -> Result<Expr> {
        let typ = self.typ(t);
        let args = vec![typ.into(), n.into(), cap.into()];
        self.call("make", args, false, origin)
    }
}
