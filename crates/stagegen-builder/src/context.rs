//! Finalization context.
//!
//! A [`BlockCtx`] is the package plus the scope a statement is being
//! finalized in. Statements that open a lexical block derive a child context
//! with [`BlockCtx::child`], which creates the scope at that moment.

use stagegen_core::{BuildError, Span, TypeId, TypeUniverse};

use crate::package::Package;
use crate::scope::{ScopeId, Symbol};

/// The package and scope a statement is finalized against.
pub struct BlockCtx<'p> {
    pub(crate) pkg: &'p mut Package,
    scope: ScopeId,
    func: Option<TypeId>,
}

impl<'p> BlockCtx<'p> {
    pub fn new(pkg: &'p mut Package, scope: ScopeId) -> Self {
        Self {
            pkg,
            scope,
            func: None,
        }
    }

    /// Marks the context as the body of a function with signature `sig`.
    pub(crate) fn in_func(mut self, sig: TypeId) -> Self {
        self.func = Some(sig);
        self
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn package(&mut self) -> &mut Package {
        self.pkg
    }

    pub fn types(&self) -> &TypeUniverse {
        &self.pkg.types
    }

    /// Signature of the enclosing function, if any.
    pub fn func_signature(&self) -> Option<TypeId> {
        self.func
    }

    /// A context for a new child scope of this one.
    pub fn child(&mut self, label: &str, span: Span) -> BlockCtx<'_> {
        let scope = self.pkg.scopes.new_child(self.scope, span, label);
        BlockCtx {
            pkg: &mut *self.pkg,
            scope,
            func: self.func,
        }
    }

    /// Declares a variable in this scope; `_` declares nothing.
    pub fn declare_var(&mut self, name: &str, typ: TypeId, span: Span) -> Result<(), BuildError> {
        if name == "_" {
            return Ok(());
        }
        let symbol = Symbol::Var { typ, span };
        match self.pkg.scopes.insert(self.scope, name, symbol) {
            Some(old) => Err(BuildError::VariableRedeclaration {
                name: name.to_owned(),
                original_span: old.span(),
                new_span: span,
            }),
            None => Ok(()),
        }
    }

    /// Resolves `name` from this scope outward.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.pkg.lookup(self.scope, name)
    }
}
