//! Expression builder.
//!
//! Every operation here is a method on [`Package`] that takes existing nodes
//! and returns a new one. The container operations dispatch on the operand's
//! [`Kind`]:
//!
//! - [`Package::elem`] - dereference; Pointer only
//! - [`Package::index`] - Sequence, FixedArray, TextString, Map
//! - [`Package::slice`] - Sequence, TextString, FixedArray, pointer to FixedArray
//! - [`Package::select`] - field of a Record or pointer to Record
//!
//! Operators live in `ops`, calls and builtins in `calls`.

mod calls;
mod ops;

pub use calls::Callee;

use stagegen_core::{BuildError, Kind, Span, Type, TypeId};

use crate::ast;
use crate::node::{Expr, Operand};
use crate::package::Package;

type Result<T> = std::result::Result<T, BuildError>;

impl Package {
    /// Rejects nodes that cannot be used as a single value.
    pub(crate) fn check_operand(&self, e: &Expr) -> Result<()> {
        let reason = match self.types.get(e.typ) {
            Type::Invalid => "has invalid type",
            Type::Tuple(elems) if elems.is_empty() => "(no value) used as value",
            Type::Tuple(_) => "is a multiple-value expression in single-value context",
            Type::Ref(_) => "is an assignment target, not a value",
            Type::TypeOf(_) => "is a type, not an expression",
            _ => return Ok(()),
        };
        Err(BuildError::InvalidOperand {
            expr: e.src.to_string(),
            reason,
            span: e.origin,
        })
    }

    /// Converts an operand and checks it is a usable value.
    pub(crate) fn value_operand(&self, op: impl Into<Operand>) -> Result<Expr> {
        let e = self.new_expr(op);
        self.check_operand(&e)?;
        Ok(e)
    }

    // ========================================================================
    // Dereference
    // ========================================================================

    /// `*x`: the value a pointer points to.
    pub fn elem(&self, x: &Expr, origin: Span) -> Result<Expr> {
        let pointee = self.pointee(x, origin)?;
        let src = ast::Expr::Star(Box::new(x.src.clone()));
        Ok(Expr::new(src, pointee, origin))
    }

    /// `*x` as an assignment target.
    pub fn elem_ref(&mut self, x: &Expr, origin: Span) -> Result<Expr> {
        let pointee = self.pointee(x, origin)?;
        let typ = self.types.ref_of(pointee);
        let src = ast::Expr::Star(Box::new(x.src.clone()));
        Ok(Expr::new(src, typ, origin))
    }

    fn pointee(&self, x: &Expr, origin: Span) -> Result<TypeId> {
        self.check_operand(x)?;
        match self.types.get(self.types.underlying(x.typ)) {
            Type::Pointer(e) => Ok(*e),
            _ => {
                let typ = self.types.display(x.typ);
                Err(BuildError::InvalidOperation {
                    expr: format!("*{}", x.src),
                    reason: format!("cannot indirect {} of type {typ}", x.src),
                    span: origin,
                })
            }
        }
    }

    // ========================================================================
    // Index
    // ========================================================================

    /// `v[key]`.
    ///
    /// With `two_value` on a map, the result is the pair `(elem, bool)`
    /// reporting whether the key is present. A key of the wrong type does
    /// not abort: the result degrades to Invalid and the diagnostic is
    /// recorded on the package.
    pub fn index(
        &mut self,
        two_value: bool,
        v: &Expr,
        args: Vec<Operand>,
        origin: Span,
    ) -> Result<Expr> {
        let (elem, src) = self.index_parts(v, args, origin)?;
        let elem = match elem {
            Some(elem) if two_value => {
                if v.kind(&self.types) != Kind::Map {
                    return Err(BuildError::InvalidOperation {
                        expr: src.to_string(),
                        reason: "comma-ok index requires a map".into(),
                        span: origin,
                    });
                }
                let b = self.types.bool();
                self.types.tuple(vec![elem, b])
            }
            Some(elem) => elem,
            None => self.types.invalid(),
        };
        Ok(Expr::new(src, elem, origin))
    }

    /// `v[key]` as an assignment target; sequences, arrays and maps only.
    pub fn index_ref(&mut self, v: &Expr, key: impl Into<Operand>, origin: Span) -> Result<Expr> {
        if v.kind(&self.types) == Kind::TextString {
            return Err(BuildError::Unassignable {
                expr: format!("{}[...]", v.src),
                span: origin,
            });
        }
        let (elem, src) = self.index_parts(v, vec![key.into()], origin)?;
        let typ = match elem {
            Some(elem) => self.types.ref_of(elem),
            None => self.types.invalid(),
        };
        Ok(Expr::new(src, typ, origin))
    }

    /// Resolves key and element types; `None` for the element means the key
    /// check degraded the result.
    fn index_parts(
        &mut self,
        v: &Expr,
        args: Vec<Operand>,
        origin: Span,
    ) -> Result<(Option<TypeId>, ast::Expr)> {
        self.check_operand(v)?;
        let (key_t, elem_t) = match self.types.get(self.types.underlying(v.typ)) {
            Type::Slice(e) | Type::Array { elem: e, .. } => (self.types.int(), *e),
            Type::Map { key, value } => (*key, *value),
            Type::Basic(k) if k.info().is_string() => (self.types.int(), self.types.byte()),
            _ => {
                return Err(BuildError::NotSupported {
                    what: format!(
                        "indexing {} of type {} (generic instantiation)",
                        v.src,
                        self.types.display(v.typ)
                    ),
                    span: origin,
                });
            }
        };

        let arity = args.len();
        let Ok([arg]) = <[Operand; 1]>::try_from(args) else {
            return Err(BuildError::InvalidOperation {
                expr: v.src.to_string(),
                reason: format!("index expects exactly one argument, got {arity}"),
                span: origin,
            });
        };
        let key = self.value_operand(arg)?;
        let src = ast::Expr::Index {
            x: Box::new(v.src.clone()),
            index: Box::new(key.src.clone()),
        };

        let is_int_key = key_t == self.types.int() && !matches!(v.kind(&self.types), Kind::Map);
        let key_val = key.val.as_ref();
        let ok = if is_int_key {
            self.integer_index(&key, origin)?
        } else {
            self.types.assignable_value(key.typ, key_val, key_t)
        };
        if !ok {
            self.degrade(BuildError::TypeMismatch {
                message: format!(
                    "cannot use {} (type {}) as {} value in index",
                    key.src,
                    self.types.display(key.typ),
                    self.types.display(key_t)
                ),
                span: origin,
            });
            return Ok((None, src));
        }
        Ok((Some(elem_t), src))
    }

    /// Whether `key` is a valid integer index; negative constants are a hard
    /// error.
    fn integer_index(&self, key: &Expr, origin: Span) -> Result<bool> {
        if let Some(v) = &key.val {
            return match v.as_int() {
                Some(i) if i < 0 => Err(BuildError::InvalidOperation {
                    expr: key.src.to_string(),
                    reason: "index must not be negative".into(),
                    span: origin,
                }),
                Some(_) => Ok(self.types.basic_info(key.typ).is_numeric()),
                None => Ok(false),
            };
        }
        Ok(self.types.basic_info(key.typ).is_integer())
    }

    // ========================================================================
    // Slice
    // ========================================================================

    /// `v[i:j]`, or `v[i:j:k]` when `k` is given.
    ///
    /// Arrays and pointers to arrays reslice to a slice of the element type;
    /// strings reject the 3-index form.
    pub fn slice(
        &mut self,
        v: &Expr,
        i: Option<Operand>,
        j: Option<Operand>,
        k: Option<Operand>,
        origin: Span,
    ) -> Result<Expr> {
        self.check_operand(v)?;
        let three = k.is_some();
        let low = i.map(|op| self.slice_index(op)).transpose()?;
        let high = j.map(|op| self.slice_index(op)).transpose()?;
        let max = k.map(|op| self.slice_index(op)).transpose()?;
        let src = ast::Expr::Slice {
            x: Box::new(v.src.clone()),
            low: low.map(Box::new),
            high: high.map(Box::new),
            max: max.map(Box::new),
        };

        if three && matches!(&src, ast::Expr::Slice { high: None, .. }) {
            return Err(BuildError::InvalidOperation {
                expr: src.to_string(),
                reason: "middle index required in 3-index slice".into(),
                span: origin,
            });
        }

        let typ = match self.types.get(self.types.underlying(v.typ)).clone() {
            Type::Slice(_) => v.typ,
            Type::Basic(kind) if kind.info().is_string() => {
                if three {
                    return Err(BuildError::InvalidOperation {
                        expr: src.to_string(),
                        reason: "3-index slice of string".into(),
                        span: origin,
                    });
                }
                self.types.default_type(v.typ)
            }
            Type::Array { elem, .. } => self.types.slice(elem),
            Type::Pointer(p) => match self.types.get(self.types.underlying(p)).clone() {
                Type::Array { elem, .. } => self.types.slice(elem),
                _ => return Err(self.cannot_slice(&src, v.typ, origin)),
            },
            _ => return Err(self.cannot_slice(&src, v.typ, origin)),
        };
        Ok(Expr::new(src, typ, origin))
    }

    fn slice_index(&self, op: Operand) -> Result<ast::Expr> {
        let e = self.value_operand(op)?;
        let info = self.types.basic_info(e.typ);
        let integral = match &e.val {
            Some(v) => v.as_int().is_some_and(|i| i >= 0),
            None => info.is_integer(),
        };
        if !integral {
            return Err(BuildError::InvalidOperation {
                expr: e.src.to_string(),
                reason: format!("invalid slice index (type {})", self.types.display(e.typ)),
                span: e.origin,
            });
        }
        Ok(e.src)
    }

    fn cannot_slice(&self, src: &ast::Expr, typ: TypeId, origin: Span) -> BuildError {
        BuildError::CannotSlice {
            expr: src.to_string(),
            typ: self.types.type_string(typ),
            span: origin,
        }
    }

    // ========================================================================
    // Field selection
    // ========================================================================

    /// `x.field` on a struct or pointer to struct.
    pub fn select(&self, x: &Expr, field: &str, origin: Span) -> Result<Expr> {
        let (typ, src) = self.field(x, field, origin)?;
        Ok(Expr::new(src, typ, origin))
    }

    /// `x.field` as an assignment target.
    pub fn select_ref(&mut self, x: &Expr, field: &str, origin: Span) -> Result<Expr> {
        let (typ, src) = self.field(x, field, origin)?;
        let typ = self.types.ref_of(typ);
        Ok(Expr::new(src, typ, origin))
    }

    fn field(&self, x: &Expr, field: &str, origin: Span) -> Result<(TypeId, ast::Expr)> {
        self.check_operand(x)?;
        let record = match self.types.get(self.types.underlying(x.typ)) {
            Type::Pointer(e) => *e,
            _ => x.typ,
        };
        let src = ast::Expr::Selector {
            x: Box::new(x.src.clone()),
            sel: field.to_owned(),
        };
        match self.types.lookup_field(record, field) {
            Some((_, typ)) => Ok((typ, src)),
            None => Err(BuildError::UnknownField {
                expr: src.to_string(),
                typ: self.types.type_string(x.typ),
                field: field.to_owned(),
                span: origin,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagegen_core::{BasicKind, Field};

    fn var(name: &str, typ: TypeId) -> Expr {
        Expr::new(ast::Expr::ident(name), typ, Span::NONE)
    }

    #[test]
    fn elem_requires_pointer() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let ptr = pkg.types_mut().pointer(int);
        let p = var("p", ptr);
        let e = pkg.elem(&p, Span::NONE).unwrap();
        assert_eq!(e.typ(), int);
        assert_eq!(e.to_string(), "*p");

        let n = var("n", int);
        assert!(matches!(
            pkg.elem(&n, Span::point(1, 1)),
            Err(BuildError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn index_sequence_and_string() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let ints = pkg.types_mut().slice(int);
        let xs = var("xs", ints);
        let e = pkg.index(false, &xs, vec![0.into()], Span::NONE).unwrap();
        assert_eq!(e.typ(), int);
        assert_eq!(e.to_string(), "xs[0]");

        let string = pkg.types().string();
        let s = var("s", string);
        let b = pkg.index(false, &s, vec![1.into()], Span::NONE).unwrap();
        assert_eq!(b.typ(), pkg.types().byte());
    }

    #[test]
    fn index_fixed_array() {
        let mut pkg = Package::default();
        let string = pkg.types().string();
        let arr = pkg.types_mut().array(string, 3);
        let a = var("arr", arr);
        let e = pkg.index(false, &a, vec![1.into()], Span::NONE).unwrap();
        assert_eq!(e.typ(), string);
        assert_eq!(e.kind(pkg.types()), Kind::TextString);
        assert_eq!(e.to_string(), "arr[1]");
        assert!(pkg.diagnostics().is_empty());

        let at = Span::point(2, 5);
        let bad = pkg.index(false, &a, vec!["one".into()], at).unwrap();
        assert!(bad.is_invalid(pkg.types()));
        assert_eq!(pkg.diagnostics().len(), 1);
        assert!(pkg.check_operand(&bad).is_err());
    }

    #[test]
    fn index_through_named_wrapper() {
        let mut pkg = Package::default();
        let string = pkg.types().string();
        let int = pkg.types().int();
        let m = pkg.types_mut().map(string, int);
        let named = pkg.declare_type("Counts", m, Span::NONE).unwrap();
        let x = var("counts", named);
        let e = pkg.index(false, &x, vec!["a".into()], Span::NONE).unwrap();
        assert_eq!(e.typ(), int);
    }

    #[test]
    fn map_two_value_is_pair() {
        let mut pkg = Package::default();
        let string = pkg.types().string();
        let int = pkg.types().int();
        let m = pkg.types_mut().map(string, int);
        let x = var("m", m);
        let e = pkg.index(true, &x, vec!["k".into()], Span::NONE).unwrap();
        let pair = [int, pkg.types().bool()];
        assert_eq!(pkg.types().tuple_elems(e.typ()), Some(&pair[..]));
        assert_eq!(e.kind(pkg.types()), Kind::Invalid);
    }

    #[test]
    fn index_key_mismatch_degrades() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let ints = pkg.types_mut().slice(int);
        let xs = var("xs", ints);
        let at = Span::point(4, 2);
        let e = pkg.index(false, &xs, vec!["zero".into()], at).unwrap();
        assert!(e.is_invalid(pkg.types()));
        assert_eq!(pkg.diagnostics().len(), 1);
        assert!(pkg.check_operand(&e).is_err());
    }

    #[test]
    fn index_rejects_extra_args_and_generics() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let ints = pkg.types_mut().slice(int);
        let xs = var("xs", ints);
        let extra = vec![0.into(), 1.into()];
        assert!(pkg.index(false, &xs, extra, Span::NONE).is_err());

        let sig = pkg.types_mut().signature(vec![], vec![], false);
        let f = var("f", sig);
        assert!(matches!(
            pkg.index(false, &f, vec![0.into()], Span::NONE),
            Err(BuildError::NotSupported { .. })
        ));
    }

    #[test]
    fn three_index_slice_of_string_is_hard_error() {
        let mut pkg = Package::default();
        let string = pkg.types().string();
        let s = var("s", string);
        let (lo, hi, max) = (Some(0.into()), Some(1.into()), Some(2.into()));
        let err = pkg.slice(&s, lo, hi, max, Span::point(3, 7)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "at 3:7: invalid operation s[0:1:2] (3-index slice of string)"
        );
        let (lo, hi) = (Some(0.into()), Some(1.into()));
        let ok = pkg.slice(&s, lo, hi, None, Span::NONE).unwrap();
        assert_eq!(ok.typ(), string);
    }

    #[test]
    fn array_reslices_to_sequence() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let arr = pkg.types_mut().array(int, 4);
        let ints = pkg.types_mut().slice(int);
        let a = var("a", arr);
        let hi = Some(2.into());
        let e = pkg.slice(&a, None, hi, None, Span::NONE).unwrap();
        assert_eq!(e.typ(), ints);
        assert_eq!(e.to_string(), "a[:2]");

        let parr = pkg.types_mut().pointer(arr);
        let p = var("p", parr);
        let lo = Some(1.into());
        let e = pkg.slice(&p, lo, None, None, Span::NONE).unwrap();
        assert_eq!(e.kind(pkg.types()), Kind::Sequence);
    }

    #[test]
    fn slicing_unsupported_kind() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let n = var("n", int);
        let at = Span::point(1, 2);
        let err = pkg.slice(&n, None, None, None, at).unwrap_err();
        assert_eq!(err.to_string(), "at 1:2: cannot slice n[:] (type int)");
    }

    #[test]
    fn select_through_pointer() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let string = pkg.types().string();
        let fields = vec![Field::new("id", int), Field::new("name", string)];
        let body = pkg.types_mut().struct_of(fields);
        let user = pkg.declare_type("User", body, Span::NONE).unwrap();
        let ptr = pkg.types_mut().pointer(user);
        let u = var("u", ptr);
        let name = pkg.select(&u, "name", Span::NONE).unwrap();
        assert_eq!(name.typ(), string);
        assert_eq!(name.to_string(), "u.name");
        let r = pkg.select_ref(&u, "id", Span::NONE).unwrap();
        assert!(r.is_ref(pkg.types()));
        assert!(matches!(
            pkg.select(&u, "email", Span::NONE),
            Err(BuildError::UnknownField { .. })
        ));
    }

    #[test]
    fn select_promoted_field() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let string = pkg.types().string();
        let body = pkg.types_mut().struct_of(vec![Field::new("ID", int)]);
        let base = pkg.declare_type("Base", body, Span::NONE).unwrap();
        let fields = vec![Field::embedded("Base", base), Field::new("Name", string)];
        let outer = pkg.types_mut().struct_of(fields);
        let u = var("u", outer);

        let id = pkg.select(&u, "ID", Span::NONE).unwrap();
        assert_eq!(id.typ(), int);
        assert_eq!(id.to_string(), "u.ID");
        let b = pkg.select(&u, "Base", Span::NONE).unwrap();
        assert_eq!(b.typ(), base);
        let id_ref = pkg.select_ref(&u, "ID", Span::NONE).unwrap();
        assert!(id_ref.is_ref(pkg.types()));
    }

    #[test]
    fn operand_checks() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let t = pkg.typ(int);
        assert!(pkg.check_operand(&t).is_err());
        let untyped = pkg.types().basic(BasicKind::UntypedInt);
        let c = var("c", untyped);
        assert!(pkg.check_operand(&c).is_ok());
    }
}
