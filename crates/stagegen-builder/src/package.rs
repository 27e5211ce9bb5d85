//! The package: owner of every construction session's state.
//!
//! A [`Package`] holds the type universe, the scope tree rooted at the
//! package scope, the imported packages, the soft diagnostics accumulated so
//! far and the finalized declarations. All builder operations go through it
//! (or through a [`BlockCtx`](crate::BlockCtx) borrowing it), so exclusive
//! access to the package is exclusive access to the construction.

use rustc_hash::FxHashMap;
use stagegen_core::{
    BasicKind, BuildConfig, BuildError, BuildProperty, ConstValue, Span, TypeHash, TypeId,
    TypeUniverse,
};

use crate::ast;
use crate::builtins::Builtin;
use crate::node::{Expr, Operand};
use crate::scope::{ScopeId, ScopeTree, Symbol};

type Result<T> = std::result::Result<T, BuildError>;

/// Handle to an imported package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PkgRef(u32);

#[derive(Debug, Clone)]
struct Import {
    path: String,
    name: String,
    hash: TypeHash,
}

/// A package under construction.
#[derive(Debug)]
pub struct Package {
    pub(crate) types: TypeUniverse,
    pub(crate) scopes: ScopeTree,
    config: BuildConfig,
    diagnostics: Vec<BuildError>,
    imports: Vec<Import>,
    members: FxHashMap<TypeHash, TypeId>,
    decls: Vec<ast::FuncDecl>,
}

impl Default for Package {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

impl Package {
    /// An empty package with the predeclared names in its root scope.
    pub fn new(config: BuildConfig) -> Self {
        let types = TypeUniverse::new();
        let mut scopes = ScopeTree::new(format!("package {}", config.name));
        let root = scopes.root();

        for builtin in Builtin::ALL {
            scopes.insert(root, builtin.name(), Symbol::Builtin(builtin));
        }
        for kind in BasicKind::ALL {
            if !kind.info().is_untyped() {
                let typ = types.basic(kind);
                scopes.insert(root, kind.name(), Symbol::TypeName { typ });
            }
        }
        let aliases = [
            ("byte", types.byte()),
            ("rune", types.basic(BasicKind::Int32)),
            ("any", types.any()),
            ("error", types.error()),
        ];
        for (name, typ) in aliases {
            scopes.insert(root, name, Symbol::TypeName { typ });
        }

        Self {
            types,
            scopes,
            config,
            diagnostics: Vec::new(),
            imports: Vec::new(),
            members: FxHashMap::default(),
            decls: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeUniverse {
        &self.types
    }

    /// Mutable access for declaring composite and named types.
    pub fn types_mut(&mut self) -> &mut TypeUniverse {
        &mut self.types
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    /// The package scope.
    pub fn root(&self) -> ScopeId {
        self.scopes.root()
    }

    /// Resolves `name` from `scope` outward.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes.lookup(scope, name).map(|(_, symbol)| symbol)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Soft diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[BuildError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<BuildError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Records a soft diagnostic and returns the Invalid type for the
    /// degraded node.
    pub(crate) fn degrade(&mut self, err: BuildError) -> TypeId {
        tracing::warn!(%err, "type degraded to invalid");
        let max = self.config.property(BuildProperty::MaxDiagnostics);
        if max == 0 || self.diagnostics.len() < max {
            self.diagnostics.push(err);
        }
        self.types.invalid()
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Declares a named type in the package scope.
    pub fn declare_type(&mut self, name: &str, underlying: TypeId, origin: Span) -> Result<TypeId> {
        if self.scopes.lookup_local(self.root(), name).is_some() {
            return Err(BuildError::DuplicateDefinition {
                name: name.to_owned(),
                span: origin,
            });
        }
        let named = self.types.new_named(name, origin)?;
        self.types.set_underlying(named, underlying, origin)?;
        let root = self.root();
        let symbol = Symbol::TypeName { typ: named };
        self.scopes.insert(root, name, symbol);
        Ok(named)
    }

    /// Imports `path`; importing the same path twice yields the same handle.
    pub fn import(&mut self, path: &str) -> PkgRef {
        if let Some(i) = self.imports.iter().position(|imp| imp.path == path) {
            return PkgRef(i as u32);
        }
        let name = path.rsplit('/').next().unwrap_or(path).to_owned();
        let pkg = PkgRef(self.imports.len() as u32);
        let root = self.root();
        self.scopes.insert(root, name.clone(), Symbol::Package(pkg));
        self.imports.push(Import {
            path: path.to_owned(),
            hash: TypeHash::from_name(path),
            name,
        });
        pkg
    }

    /// Import path of an imported package.
    pub fn import_path(&self, pkg: PkgRef) -> &str {
        &self.imports[pkg.0 as usize].path
    }

    /// Records the type of an exported member of an imported package.
    pub fn declare_member(&mut self, pkg: PkgRef, name: &str, typ: TypeId) {
        let key = self.imports[pkg.0 as usize].hash.member(name);
        self.members.insert(key, typ);
    }

    /// A reference to `pkg.name`.
    pub fn member(&self, pkg: PkgRef, name: &str, origin: Span) -> Result<Expr> {
        let import = &self.imports[pkg.0 as usize];
        let Some(&typ) = self.members.get(&import.hash.member(name)) else {
            return Err(BuildError::UndefinedIdentifier {
                name: format!("{}.{name}", import.name),
                span: origin,
            });
        };
        let src = ast::Expr::Selector {
            x: Box::new(ast::Expr::ident(&import.name)),
            sel: name.to_owned(),
        };
        Ok(Expr::new(src, typ, origin))
    }

    /// A reference to a package-level name: a function, a type (as a
    /// Type-as-value) or a package variable.
    pub fn ident(&mut self, name: &str, origin: Span) -> Result<Expr> {
        let root = self.root();
        let symbol = self.scopes.lookup_local(root, name).cloned();
        match symbol {
            Some(Symbol::Func { typ, .. } | Symbol::Var { typ, .. }) => {
                Ok(Expr::new(ast::Expr::ident(name), typ, origin))
            }
            Some(Symbol::TypeName { typ }) => Ok(self.typ(typ).origin(origin)),
            Some(Symbol::Builtin(_)) => Err(BuildError::InvalidOperand {
                expr: name.to_owned(),
                reason: "(built-in) must be called",
                span: origin,
            }),
            Some(Symbol::Package(_)) => Err(BuildError::InvalidOperand {
                expr: name.to_owned(),
                reason: "is a package, not an expression",
                span: origin,
            }),
            None => Err(BuildError::UndefinedIdentifier {
                name: name.to_owned(),
                span: origin,
            }),
        }
    }

    // ========================================================================
    // Operands
    // ========================================================================

    /// Turns an operand into an expression node; literals become untyped
    /// constants.
    pub fn new_expr(&self, val: impl Into<Operand>) -> Expr {
        match val.into() {
            Operand::Expr(e) => e,
            Operand::Const(v) => {
                let kind = match &v {
                    ConstValue::Bool(_) => BasicKind::UntypedBool,
                    ConstValue::Int(_) => BasicKind::UntypedInt,
                    ConstValue::Float(_) => BasicKind::UntypedFloat,
                    ConstValue::String(_) => BasicKind::UntypedString,
                };
                let lit = ast::Expr::BasicLit(v.clone());
                let typ = self.types.basic(kind);
                Expr::new(lit, typ, Span::NONE).with_value(Some(v))
            }
        }
    }

    /// The untyped `nil` value.
    pub fn nil(&self) -> Expr {
        Expr::new(
            ast::Expr::ident("nil"),
            self.types.basic(BasicKind::UntypedNil),
            Span::NONE,
        )
    }

    /// A node denoting the type `t` itself.
    pub fn typ(&mut self, t: TypeId) -> Expr {
        let typ = self.types.type_of(t);
        Expr::new(self.type_expr(t), typ, Span::NONE)
    }

    /// The representation of `t` in type position.
    pub fn type_expr(&self, t: TypeId) -> ast::Expr {
        ast::Expr::TypeName(self.types.type_string(t))
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Appends a finalized declaration to the output.
    pub fn emit(&mut self, decl: ast::FuncDecl) {
        self.decls.push(decl);
    }

    pub fn decls(&self) -> &[ast::FuncDecl] {
        &self.decls
    }

    /// The finished output file.
    pub fn into_file(self) -> ast::File {
        ast::File {
            package: self.config.name,
            imports: self.imports.into_iter().map(|imp| imp.path).collect(),
            decls: self.decls,
        }
    }
}
