//! Function assembly.
//!
//! A [`Signature`] owns the parameter scope; every [`Func`] built on it gets
//! a fresh body scope nested inside. The body is a plain statement list that
//! can be replaced or extended at any time, and [`Func::decl`] /
//! [`Func::lit`] finalize it against the package. Finalizing resets the body
//! scope first, so a second call re-derives the same output from the current
//! body.

use bitflags::bitflags;
use stagegen_core::{BuildError, Kind, Span, TypeId};

use crate::ast;
use crate::context::BlockCtx;
use crate::node::Expr;
use crate::package::Package;
use crate::scope::{ScopeId, Symbol};
use crate::stmt::{Stmt, build_block};

type Result<T> = std::result::Result<T, BuildError>;

bitflags! {
    /// Declaration markers carried through to the output.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FuncFlags: u8 {
        /// The function implements an operator.
        const OPERATOR = 1 << 0;
        /// The function shadows an inherited one.
        const SHADOW   = 1 << 1;
        /// The function is bound to a class.
        const CLASS    = 1 << 2;
    }
}

// ============================================================================
// Signature
// ============================================================================

/// A function type with named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    typ: TypeId,
    params: Vec<(String, TypeId)>,
    scope: ScopeId,
    repr: ast::FuncType,
}

impl Signature {
    /// The interned signature type.
    pub fn typ(&self) -> TypeId {
        self.typ
    }

    pub fn params(&self) -> &[(String, TypeId)] {
        &self.params
    }

    /// The scope holding the parameters.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl Package {
    /// Declares a signature and a parameter scope under the package root.
    ///
    /// A variadic signature's last parameter must be a slice; it is rendered
    /// as `...T`.
    pub fn new_signature(
        &mut self,
        params: Vec<(&str, TypeId)>,
        results: Vec<TypeId>,
        variadic: bool,
    ) -> Result<Signature> {
        let last = params.last().map(|&(_, t)| self.types.kind(t));
        if variadic && last != Some(Kind::Sequence) {
            return Err(BuildError::InvalidOperation {
                expr: "func(...)".into(),
                reason: "variadic parameter must be a slice".into(),
                span: Span::NONE,
            });
        }

        let root = self.root();
        let scope = self.scopes.new_child(root, Span::NONE, "signature");
        let mut repr = ast::FuncType {
            params: Vec::with_capacity(params.len()),
            results: results.iter().map(|&t| self.types.type_string(t)).collect(),
            variadic,
        };
        for (i, &(name, typ)) in params.iter().enumerate() {
            if !name.is_empty() && name != "_" {
                let symbol = Symbol::Var {
                    typ,
                    span: Span::NONE,
                };
                if self.scopes.insert(scope, name, symbol).is_some() {
                    return Err(BuildError::DuplicateDefinition {
                        name: name.to_owned(),
                        span: Span::NONE,
                    });
                }
            }
            let rendered = match self.types.elem(typ) {
                Some(elem) if variadic && i + 1 == params.len() => {
                    format!("...{}", self.types.type_string(elem))
                }
                _ => self.types.type_string(typ),
            };
            repr.params.push(ast::Param {
                name: name.to_owned(),
                typ: rendered,
            });
        }

        let types: Vec<TypeId> = params.iter().map(|&(_, t)| t).collect();
        let typ = self.types.signature(types, results, variadic);
        Ok(Signature {
            typ,
            params: params.into_iter().map(|(n, t)| (n.to_owned(), t)).collect(),
            scope,
            repr,
        })
    }

    /// A named function in the package scope.
    pub fn new_func(
        &mut self,
        name: &str,
        sig: &Signature,
        flags: FuncFlags,
        origin: Span,
    ) -> Result<Func> {
        let root = self.root();
        if self.scopes.lookup_local(root, name).is_some() {
            return Err(BuildError::DuplicateDefinition {
                name: name.to_owned(),
                span: origin,
            });
        }
        let symbol = Symbol::Func {
            typ: sig.typ,
            span: origin,
        };
        self.scopes.insert(root, name, symbol);
        Ok(self.func_unit(Some(name.to_owned()), sig, flags, origin))
    }

    /// An anonymous function.
    pub fn func_lit(&mut self, sig: &Signature, origin: Span) -> Func {
        self.func_unit(None, sig, FuncFlags::empty(), origin)
    }

    fn func_unit(
        &mut self,
        name: Option<String>,
        sig: &Signature,
        flags: FuncFlags,
        origin: Span,
    ) -> Func {
        let label = match &name {
            Some(n) => format!("func {n}"),
            None => "func literal".to_owned(),
        };
        let scope = self.scopes.new_child(sig.scope, origin, label);
        Func {
            name,
            sig: sig.clone(),
            scope,
            body: Vec::new(),
            doc: None,
            flags,
            origin,
        }
    }
}

// ============================================================================
// Func
// ============================================================================

/// A function under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    name: Option<String>,
    sig: Signature,
    scope: ScopeId,
    body: Vec<Stmt>,
    doc: Option<String>,
    flags: FuncFlags,
    origin: Span,
}

impl Func {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn flags(&self) -> FuncFlags {
        self.flags
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    /// The body scope.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn doc(&mut self, doc: impl Into<String>) -> &mut Self {
        self.doc = Some(doc.into());
        self
    }

    /// Replaces the body.
    pub fn body(&mut self, stmts: Vec<Stmt>) -> &mut Self {
        self.body = stmts;
        self
    }

    pub fn body_add(&mut self, stmt: impl Into<Stmt>) -> &mut Self {
        self.body.push(stmt.into());
        self
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.body
    }

    /// A read of parameter `name`.
    pub fn param_val(&self, pkg: &Package, name: &str) -> Result<Expr> {
        let typ = self.param_type(pkg, name)?;
        Ok(Expr::new(ast::Expr::ident(name), typ, self.origin))
    }

    /// Parameter `name` as an assignment target.
    pub fn param_ref(&self, pkg: &mut Package, name: &str) -> Result<Expr> {
        let typ = self.param_type(pkg, name)?;
        let typ = pkg.types.ref_of(typ);
        Ok(Expr::new(ast::Expr::ident(name), typ, self.origin))
    }

    fn param_type(&self, pkg: &Package, name: &str) -> Result<TypeId> {
        match pkg.scopes.lookup_local(self.sig.scope, name) {
            Some(Symbol::Var { typ, .. }) => Ok(*typ),
            _ => Err(BuildError::UndefinedIdentifier {
                name: name.to_owned(),
                span: self.origin,
            }),
        }
    }

    fn build_body(&self, pkg: &mut Package) -> Result<ast::Block> {
        pkg.scopes.clear(self.scope);
        let mut ctx = BlockCtx::new(pkg, self.scope).in_func(self.sig.typ);
        build_block(&self.body, &mut ctx)
    }

    /// Finalizes a named function into a declaration.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn decl(&self, pkg: &mut Package) -> Result<ast::FuncDecl> {
        let Some(name) = &self.name else {
            return Err(BuildError::InvalidOperation {
                expr: "func literal".into(),
                reason: "an anonymous function has no declaration form".into(),
                span: self.origin,
            });
        };
        let body = self.build_body(pkg)?;
        tracing::debug!(name = %name, stmts = body.stmts.len(), "function finalized");
        Ok(ast::FuncDecl {
            doc: self.doc.clone(),
            name: name.clone(),
            typ: self.sig.repr.clone(),
            body,
            operator: self.flags.contains(FuncFlags::OPERATOR),
            shadow: self.flags.contains(FuncFlags::SHADOW),
            is_class: self.flags.contains(FuncFlags::CLASS),
        })
    }

    /// Finalizes the function into an anonymous literal.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn lit(&self, pkg: &mut Package) -> Result<ast::FuncLit> {
        let body = self.build_body(pkg)?;
        tracing::debug!(stmts = body.stmts.len(), "function literal finalized");
        Ok(ast::FuncLit {
            typ: self.sig.repr.clone(),
            body,
        })
    }

    /// The literal as an expression of the signature type.
    pub fn lit_expr(&self, pkg: &mut Package) -> Result<Expr> {
        let lit = ast::Expr::FuncLit(Box::new(self.lit(pkg)?));
        Ok(Expr::new(lit, self.sig.typ, self.origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagegen_core::BinaryOp;

    fn int_sig(pkg: &mut Package) -> Signature {
        let int = pkg.types().int();
        let sig = pkg.new_signature(vec![("n", int)], vec![int], false);
        sig.unwrap()
    }

    #[test]
    fn signature_declares_params() {
        let mut pkg = Package::default();
        let sig = int_sig(&mut pkg);
        assert_eq!(sig.params(), &[("n".to_owned(), pkg.types().int())]);
        assert!(pkg.lookup(sig.scope(), "n").is_some());
        assert!(pkg.lookup(pkg.root(), "n").is_none());
        assert_eq!(sig.repr.to_string(), "func(n int) int");
    }

    #[test]
    fn duplicate_params_rejected() {
        let mut pkg = Package::default();
        let int = pkg.types().int();
        let params = vec![("a", int), ("a", int)];
        let err = pkg.new_signature(params, vec![], false).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateDefinition { .. }));
        let blanks = vec![("_", int), ("_", int)];
        assert!(pkg.new_signature(blanks, vec![], false).is_ok());
    }

    #[test]
    fn variadic_renders_ellipsis() {
        let mut pkg = Package::default();
        let string = pkg.types().string();
        let any = pkg.types().any();
        let rest = pkg.types_mut().slice(any);
        let params = vec![("format", string), ("args", rest)];
        let sig = pkg.new_signature(params, vec![], true).unwrap();
        assert_eq!(sig.repr.to_string(), "func(format string, args ...any)");
        let plain = vec![("n", string)];
        assert!(pkg.new_signature(plain, vec![], true).is_err());
        assert!(pkg.new_signature(vec![], vec![], true).is_err());
    }

    #[test]
    fn duplicate_function_rejected() {
        let mut pkg = Package::default();
        let sig = int_sig(&mut pkg);
        let (flags, at) = (FuncFlags::empty(), Span::point(3, 1));
        pkg.new_func("inc", &sig, flags, Span::NONE).unwrap();
        let err = pkg.new_func("inc", &sig, flags, at).unwrap_err();
        assert_eq!(err.to_string(), "at 3:1: duplicate definition 'inc'");
    }

    #[test]
    fn decl_builds_body_against_params() {
        let mut pkg = Package::default();
        let sig = int_sig(&mut pkg);
        let flags = FuncFlags::OPERATOR;
        let mut f = pkg.new_func("inc", &sig, flags, Span::NONE).unwrap();
        let n = f.param_val(&pkg, "n").unwrap();
        let sum = pkg.binary_op(&n, BinaryOp::Add, 1, Span::NONE).unwrap();
        let ret = pkg.return_stmt(vec![sum], Span::NONE);
        f.doc("inc adds one.").body_add(ret);

        let decl = f.decl(&mut pkg).unwrap();
        assert_eq!(decl.name, "inc");
        assert_eq!(decl.doc.as_deref(), Some("inc adds one."));
        assert!(decl.operator && !decl.shadow && !decl.is_class);
        assert_eq!(decl.body.stmts, vec![ast::Stmt::Return(vec![sum_src()])]);
    }

    fn sum_src() -> ast::Expr {
        ast::Expr::Binary {
            op: BinaryOp::Add,
            x: Box::new(ast::Expr::ident("n")),
            y: Box::new(ast::Expr::BasicLit(stagegen_core::ConstValue::Int(1))),
        }
    }

    #[test]
    fn refinalizing_rederives_output() {
        let mut pkg = Package::default();
        let sig = pkg.new_signature(vec![], vec![], false).unwrap();
        let flags = FuncFlags::empty();
        let mut f = pkg.new_func("main", &sig, flags, Span::NONE).unwrap();
        let x = pkg.define_var("x", 1, true, Span::NONE).unwrap();
        f.body_add(x);
        let first = f.decl(&mut pkg).unwrap();
        let second = f.decl(&mut pkg).unwrap();
        assert_eq!(first, second);

        let print = pkg.call("println", vec![], false, Span::NONE).unwrap();
        f.body_add(print);
        assert_eq!(f.decl(&mut pkg).unwrap().body.stmts.len(), 2);
    }

    #[test]
    fn param_ref_is_assignable() {
        let mut pkg = Package::default();
        let sig = int_sig(&mut pkg);
        let f = pkg.func_lit(&sig, Span::NONE);
        let r = f.param_ref(&mut pkg, "n").unwrap();
        assert!(r.is_ref(pkg.types()));
        assert!(f.param_val(&pkg, "m").is_err());
        assert!(f.decl(&mut pkg).is_err());
    }

    #[test]
    fn literal_expression_has_signature_type() {
        let mut pkg = Package::default();
        let sig = pkg.new_signature(vec![], vec![], false).unwrap();
        let f = pkg.func_lit(&sig, Span::NONE);
        let e = f.lit_expr(&mut pkg).unwrap();
        assert_eq!(e.typ(), sig.typ());
        assert_eq!(e.kind(pkg.types()), Kind::Signature);
    }
}
