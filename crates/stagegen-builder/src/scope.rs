//! Lexical scope chain.
//!
//! Scopes are records in a [`ScopeTree`] arena linked to their parent by
//! index. The package root is the only scope without a parent, and the chain
//! is only ever walked outward, so resolution always terminates at the root.
//!
//! Statement builders create their scopes when they are finalized, not when
//! they are constructed; the arena therefore grows with every finalization
//! pass and old scopes simply stop being referenced.

use rustc_hash::FxHashMap;
use stagegen_core::{Span, TypeId};

use crate::PkgRef;
use crate::builtins::Builtin;

// ============================================================================
// Types
// ============================================================================

/// Handle to a scope in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A declared name.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A variable or parameter.
    Var { typ: TypeId, span: Span },
    /// A package-level function.
    Func { typ: TypeId, span: Span },
    /// A type name.
    TypeName { typ: TypeId },
    /// A predeclared function.
    Builtin(Builtin),
    /// An imported package.
    Package(PkgRef),
}

impl Symbol {
    /// Where the symbol was declared, when it has an origin.
    pub fn span(&self) -> Span {
        match self {
            Symbol::Var { span, .. } | Symbol::Func { span, .. } => *span,
            _ => Span::NONE,
        }
    }
}

#[derive(Debug, Clone)]
struct ScopeData {
    parent: Option<ScopeId>,
    span: Span,
    label: String,
    symbols: FxHashMap<String, Symbol>,
}

/// Arena of scopes.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<ScopeData>,
}

// ============================================================================
// Implementation
// ============================================================================

impl ScopeTree {
    /// A tree holding only the root scope.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            scopes: vec![ScopeData {
                parent: None,
                span: Span::NONE,
                label: label.into(),
                symbols: FxHashMap::default(),
            }],
        }
    }

    /// The package scope.
    #[inline]
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Creates a child of `parent`.
    pub fn new_child(&mut self, parent: ScopeId, span: Span, label: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let label = label.into();
        tracing::trace!(parent = parent.0, id = id.0, %label, "new scope");
        self.scopes.push(ScopeData {
            parent: Some(parent),
            span,
            label,
            symbols: FxHashMap::default(),
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    pub fn label(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.index()].label
    }

    pub fn span(&self, scope: ScopeId) -> Span {
        self.scopes[scope.index()].span
    }

    /// Number of scopes ever created.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Number of links between `scope` and the root.
    pub fn depth(&self, scope: ScopeId) -> usize {
        let mut depth = 0;
        let mut cur = scope;
        while let Some(parent) = self.parent(cur) {
            depth += 1;
            cur = parent;
        }
        depth
    }

    /// Declares `name` in `scope`.
    ///
    /// On collision the existing symbol is kept and returned.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        symbol: Symbol,
    ) -> Option<Symbol> {
        let symbols = &mut self.scopes[scope.index()].symbols;
        let name = name.into();
        if let Some(old) = symbols.get(&name) {
            return Some(old.clone());
        }
        symbols.insert(name, symbol);
        None
    }

    /// Looks `name` up in `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[scope.index()].symbols.get(name)
    }

    /// Resolves `name` from `scope` outward; returns the declaring scope too.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &Symbol)> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            if let Some(symbol) = self.lookup_local(id, name) {
                return Some((id, symbol));
            }
            cur = self.parent(id);
        }
        None
    }

    /// Forgets every symbol declared directly in `scope`.
    pub fn clear(&mut self, scope: ScopeId) {
        self.scopes[scope.index()].symbols.clear();
    }

    /// Names declared directly in `scope`, sorted.
    pub fn names(&self, scope: ScopeId) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes[scope.index()]
            .symbols
            .keys()
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}
