//! Value-carrying nodes.
//!
//! An [`Expr`] pairs its synthesized representation with a semantic type, an
//! optional constant value and the origin it was built for. A [`Var`] is a
//! declared name with a fixed type; it hands out two expression views:
//!
//! - [`Var::val`] - an ordinary read of the variable
//! - [`Var::reference`] - a Reference-type view, usable only as an
//!   assignment target

use stagegen_core::{BasicKind, BuildError, ConstValue, Kind, Span, TypeId, TypeUniverse};

use crate::ast;

// ============================================================================
// Expr
// ============================================================================

/// An expression node.
///
/// Immutable once built apart from origin re-tagging.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub(crate) src: ast::Expr,
    pub(crate) typ: TypeId,
    pub(crate) val: Option<ConstValue>,
    pub(crate) origin: Span,
}

impl Expr {
    pub(crate) fn new(src: ast::Expr, typ: TypeId, origin: Span) -> Self {
        Self {
            src,
            typ,
            val: None,
            origin,
        }
    }

    pub(crate) fn with_value(mut self, val: Option<ConstValue>) -> Self {
        self.val = val;
        self
    }

    /// Re-tags the node with a new origin.
    pub fn origin(mut self, origin: Span) -> Self {
        self.origin = origin;
        self
    }

    pub fn set_origin(&mut self, origin: Span) {
        self.origin = origin;
    }

    pub fn span(&self) -> Span {
        self.origin
    }

    pub fn src(&self) -> &ast::Expr {
        &self.src
    }

    pub fn into_src(self) -> ast::Expr {
        self.src
    }

    pub fn typ(&self) -> TypeId {
        self.typ
    }

    /// The constant value, when the node is a compile-time constant.
    pub fn value(&self) -> Option<&ConstValue> {
        self.val.as_ref()
    }

    pub fn kind(&self, types: &TypeUniverse) -> Kind {
        types.kind(self.typ)
    }

    /// Whether construction degraded this node's type to Invalid.
    pub fn is_invalid(&self, types: &TypeUniverse) -> bool {
        self.typ == types.invalid()
    }

    /// Whether this node is the untyped `nil`.
    pub fn is_untyped_nil(&self, types: &TypeUniverse) -> bool {
        types.basic_kind(self.typ) == Some(BasicKind::UntypedNil)
    }

    /// Whether this node is an assignment target.
    pub fn is_ref(&self, types: &TypeUniverse) -> bool {
        types.ref_target(self.typ).is_some()
    }

    /// Number of fields of a Record-kind node.
    pub fn num_field(&self, types: &TypeUniverse) -> Result<usize, BuildError> {
        types
            .struct_fields(self.typ)
            .map(<[_]>::len)
            .ok_or_else(|| BuildError::InvalidOperation {
                expr: self.src.to_string(),
                reason: format!("{} is not a struct", types.display(self.typ)),
                span: self.origin,
            })
    }

    /// The string value of a constant string node.
    pub fn const_text(&self) -> Option<&str> {
        self.val.as_ref().and_then(ConstValue::as_str)
    }

    /// Name of the function called by this node.
    pub fn caller(&self) -> String {
        match self.src.callee() {
            Some(fun) => fun.to_string(),
            None => "the function call".into(),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.src)
    }
}

// ============================================================================
// Var
// ============================================================================

/// How a variable is introduced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum VarForm {
    /// `name := value`
    Define(Expr),
    /// `var name T = value`
    Declare {
        typ: Option<String>,
        value: Option<Expr>,
    },
    /// Bound by a range clause.
    Range,
    /// A function parameter.
    Param,
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub(crate) name: String,
    pub(crate) typ: TypeId,
    pub(crate) ref_typ: TypeId,
    pub(crate) form: VarForm,
    pub(crate) origin: Span,
    pub(crate) auto: bool,
}

impl Var {
    pub(crate) fn new(
        name: impl Into<String>,
        typ: TypeId,
        types: &mut TypeUniverse,
        form: VarForm,
        origin: Span,
        auto: bool,
    ) -> Self {
        Self {
            name: name.into(),
            typ,
            ref_typ: types.ref_of(typ),
            form,
            origin,
            auto,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typ(&self) -> TypeId {
        self.typ
    }

    pub fn span(&self) -> Span {
        self.origin
    }

    /// Whether the variable's type was inferred rather than spelled out.
    pub fn is_auto(&self) -> bool {
        self.auto
    }

    /// A read of the variable.
    pub fn val(&self) -> Expr {
        Expr::new(ast::Expr::ident(&self.name), self.typ, self.origin)
    }

    /// The variable as an assignment target.
    pub fn reference(&self) -> Expr {
        Expr::new(ast::Expr::ident(&self.name), self.ref_typ, self.origin)
    }

    /// The declaring statement, for variables that have one.
    pub fn stmt(&self) -> Option<ast::Stmt> {
        match &self.form {
            VarForm::Define(value) => Some(ast::Stmt::Assign {
                lhs: vec![ast::Expr::ident(&self.name)],
                tok: ast::AssignTok::Define,
                rhs: vec![value.src.clone()],
            }),
            VarForm::Declare { typ, value } => Some(ast::Stmt::VarDecl {
                name: self.name.clone(),
                typ: typ.clone(),
                value: value.as_ref().map(|v| v.src.clone()),
            }),
            VarForm::Range | VarForm::Param => None,
        }
    }
}

// ============================================================================
// Operand
// ============================================================================

/// Anything usable where an expression is expected: an existing node or a
/// Rust literal, which becomes an untyped constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expr),
    Const(ConstValue),
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Expr(e)
    }
}

impl From<&Expr> for Operand {
    fn from(e: &Expr) -> Self {
        Operand::Expr(e.clone())
    }
}

impl From<&Var> for Operand {
    fn from(v: &Var) -> Self {
        Operand::Expr(v.val())
    }
}

impl From<ConstValue> for Operand {
    fn from(v: ConstValue) -> Self {
        Operand::Const(v)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Const(ConstValue::Int(v as i128))
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Const(ConstValue::Int(v as i128))
    }
}

impl From<usize> for Operand {
    fn from(v: usize) -> Self {
        Operand::Const(ConstValue::Int(v as i128))
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Const(ConstValue::float(v))
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Const(ConstValue::Bool(v))
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Const(ConstValue::String(v.to_owned()))
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Const(ConstValue::String(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_views_share_fixed_type() {
        let mut types = TypeUniverse::new();
        let int = types.int();
        let at = Span::point(1, 1);
        let v = Var::new("n", int, &mut types, VarForm::Param, at, true);
        assert_eq!(v.val().typ(), int);
        assert_eq!(types.ref_target(v.reference().typ()), Some(int));
        assert!(v.reference().is_ref(&types));
        assert!(!v.val().is_ref(&types));
        assert!(v.stmt().is_none());
    }

    #[test]
    fn caller_falls_back() {
        let types = TypeUniverse::new();
        let call = Expr::new(
            ast::Expr::Call {
                fun: Box::new(ast::Expr::ident("divmod")),
                args: vec![],
                ellipsis: false,
            },
            types.int(),
            Span::NONE,
        );
        assert_eq!(call.caller(), "divmod");
        let other = Expr::new(ast::Expr::ident("x"), types.int(), Span::NONE);
        assert_eq!(other.caller(), "the function call");
    }

    #[test]
    fn origin_retag() {
        let types = TypeUniverse::new();
        let e = Expr::new(ast::Expr::ident("x"), types.int(), Span::NONE).origin(Span::point(7, 3));
        assert_eq!(e.span(), Span::point(7, 3));
    }

    #[test]
    fn num_field_requires_record() {
        let types = TypeUniverse::new();
        let e = Expr::new(ast::Expr::ident("x"), types.int(), Span::NONE);
        assert!(e.num_field(&types).is_err());
    }
}
