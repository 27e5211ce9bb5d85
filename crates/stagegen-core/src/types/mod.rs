//! The host type system.
//!
//! All semantic types live in a [`TypeUniverse`] arena and are referred to by
//! [`TypeId`] handles, which are `Copy` and never deep-copied. Structural
//! types are hash-consed on creation, so two structurally identical unnamed
//! types always share a handle and type identity is handle equality. Named
//! types are nominal: each declaration gets its own handle, keyed by the
//! [`TypeHash`] of its qualified name.
//!
//! Two meta forms sit beside the ordinary types:
//!
//! - [`Type::Ref`] marks an expression as an assignment target.
//! - [`Type::TypeOf`] marks an expression that denotes a type.
//!
//! ## Modules
//!
//! - `basic` - predeclared basic kinds and their properties
//! - `kind` - structural classification ([`Kind`])
//! - `relation` - identity, assignability and conversion rules
//! - `display` - rendering types in host notation

mod basic;
mod display;
mod kind;
mod relation;

pub use basic::{BasicInfo, BasicKind};
pub use display::TypeDisplay;
pub use kind::{Kind, classify};

use rustc_hash::FxHashMap;

use crate::{BuildError, Span, TypeHash};

/// Handle to a type in a [`TypeUniverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Direction of a channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub typ: TypeId,
    /// Embedded fields promote their own fields into the enclosing struct.
    pub embedded: bool,
    pub tag: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, typ: TypeId) -> Self {
        Self {
            name: name.into(),
            typ,
            embedded: false,
            tag: None,
        }
    }

    /// An embedded field; `name` is the embedded type's name.
    pub fn embedded(name: impl Into<String>, typ: TypeId) -> Self {
        Self {
            embedded: true,
            ..Self::new(name, typ)
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A method in an interface or in a named type's method set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    /// A [`Type::Signature`] handle.
    pub sig: TypeId,
}

/// Parameter and result types of a function type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureType {
    pub params: Vec<TypeId>,
    pub results: Vec<TypeId>,
    /// The last parameter is a slice accepting a variable argument list.
    pub variadic: bool,
}

/// A declared type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    /// Qualified name (`pkg.Name`, or just `Name` for predeclared types).
    pub name: String,
    pub hash: TypeHash,
    /// Unset until the declaration is completed.
    pub underlying: Option<TypeId>,
    pub methods: Vec<Method>,
}

/// A semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Invalid,
    Basic(BasicKind),
    Pointer(TypeId),
    Slice(TypeId),
    Array { elem: TypeId, len: u64 },
    Map { key: TypeId, value: TypeId },
    Chan { elem: TypeId, dir: ChanDir },
    Signature(SignatureType),
    Struct(Vec<Field>),
    Interface(Vec<Method>),
    /// Results of a call returning zero or several values.
    Tuple(Vec<TypeId>),
    Named(NamedType),
    /// Reference-type: an assignable location holding the wrapped type.
    Ref(TypeId),
    /// Type-as-value: an expression denoting the wrapped type.
    TypeOf(TypeId),
}

/// Arena of every type known to a package.
#[derive(Debug, Clone)]
pub struct TypeUniverse {
    types: Vec<Type>,
    interned: FxHashMap<Type, TypeId>,
    named: FxHashMap<TypeHash, TypeId>,
    basics: Vec<TypeId>,
    invalid: TypeId,
    any: TypeId,
    error: TypeId,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverse {
    /// A universe holding the predeclared types.
    pub fn new() -> Self {
        let mut universe = TypeUniverse {
            types: Vec::new(),
            interned: FxHashMap::default(),
            named: FxHashMap::default(),
            basics: Vec::with_capacity(BasicKind::ALL.len()),
            invalid: TypeId(0),
            any: TypeId(0),
            error: TypeId(0),
        };
        universe.invalid = universe.intern(Type::Invalid);
        for kind in BasicKind::ALL {
            let id = universe.intern(Type::Basic(kind));
            universe.basics.push(id);
        }
        universe.any = universe.interface(Vec::new());

        // type error interface { Error() string }
        let string = universe.string();
        let error_sig = universe.signature(Vec::new(), vec![string], false);
        let error_iface = universe.interface(vec![Method {
            name: "Error".into(),
            sig: error_sig,
        }]);
        universe.error = universe.push(Type::Named(NamedType {
            name: "error".into(),
            hash: TypeHash::from_name("error"),
            underlying: Some(error_iface),
            methods: Vec::new(),
        }));
        let error_hash = TypeHash::from_name("error");
        universe.named.insert(error_hash, universe.error);
        universe
    }

    fn push(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = self.push(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    /// The type behind a handle.
    #[inline]
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// Number of types in the arena.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ========================================================================
    // Predeclared types
    // ========================================================================

    #[inline]
    pub fn invalid(&self) -> TypeId {
        self.invalid
    }

    #[inline]
    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics[kind as usize]
    }

    pub fn bool(&self) -> TypeId {
        self.basic(BasicKind::Bool)
    }

    pub fn int(&self) -> TypeId {
        self.basic(BasicKind::Int)
    }

    pub fn byte(&self) -> TypeId {
        self.basic(BasicKind::Uint8)
    }

    pub fn float64(&self) -> TypeId {
        self.basic(BasicKind::Float64)
    }

    pub fn string(&self) -> TypeId {
        self.basic(BasicKind::String)
    }

    /// The empty interface.
    pub fn any(&self) -> TypeId {
        self.any
    }

    pub fn error(&self) -> TypeId {
        self.error
    }

    // ========================================================================
    // Composite constructors
    // ========================================================================

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Slice(elem))
    }

    pub fn array(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.intern(Type::Array { elem, len })
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(Type::Map { key, value })
    }

    pub fn chan(&mut self, elem: TypeId, dir: ChanDir) -> TypeId {
        self.intern(Type::Chan { elem, dir })
    }

    pub fn signature(
        &mut self,
        params: Vec<TypeId>,
        results: Vec<TypeId>,
        variadic: bool,
    ) -> TypeId {
        self.intern(Type::Signature(SignatureType {
            params,
            results,
            variadic,
        }))
    }

    pub fn struct_of(&mut self, fields: Vec<Field>) -> TypeId {
        self.intern(Type::Struct(fields))
    }

    /// Interface types are canonicalized by method name order.
    pub fn interface(&mut self, mut methods: Vec<Method>) -> TypeId {
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        self.intern(Type::Interface(methods))
    }

    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(Type::Tuple(elems))
    }

    /// Reference-type wrapper of `t`.
    pub fn ref_of(&mut self, t: TypeId) -> TypeId {
        self.intern(Type::Ref(t))
    }

    /// Type-as-value wrapper of `t`.
    pub fn type_of(&mut self, t: TypeId) -> TypeId {
        self.intern(Type::TypeOf(t))
    }

    // ========================================================================
    // Named types
    // ========================================================================

    /// Declares a named type with no underlying type yet.
    pub fn new_named(&mut self, name: impl Into<String>, span: Span) -> Result<TypeId, BuildError> {
        let name = name.into();
        let hash = TypeHash::from_name(&name);
        if self.named.contains_key(&hash) {
            return Err(BuildError::DuplicateDefinition { name, span });
        }
        let id = self.push(Type::Named(NamedType {
            name,
            hash,
            underlying: None,
            methods: Vec::new(),
        }));
        self.named.insert(hash, id);
        Ok(id)
    }

    /// Finds a named type by qualified name.
    pub fn lookup_named(&self, name: &str) -> Option<TypeId> {
        self.named.get(&TypeHash::from_name(name)).copied()
    }

    fn named_mut(&mut self, id: TypeId) -> Option<&mut NamedType> {
        match &mut self.types[id.index()] {
            Type::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Completes a named type declaration.
    ///
    /// Rejects underlying types that lead back to `named` through other named
    /// types, so following underlying edges always terminates.
    pub fn set_underlying(
        &mut self,
        named: TypeId,
        underlying: TypeId,
        span: Span,
    ) -> Result<(), BuildError> {
        let mut cur = underlying;
        while let Type::Named(n) = self.get(cur) {
            if cur == named {
                return Err(BuildError::Other {
                    message: format!("invalid recursive type {}", n.name),
                    span,
                });
            }
            match n.underlying {
                Some(next) => cur = next,
                None => break,
            }
        }
        let name = self.type_string(named);
        let Some(n) = self.named_mut(named) else {
            return Err(BuildError::Other {
                message: format!("{name} is not a named type"),
                span,
            });
        };
        n.underlying = Some(underlying);
        Ok(())
    }

    /// Adds a method to a named type's method set.
    pub fn add_method(
        &mut self,
        named: TypeId,
        name: impl Into<String>,
        sig: TypeId,
        span: Span,
    ) -> Result<(), BuildError> {
        let name = name.into();
        let type_name = self.type_string(named);
        let Some(n) = self.named_mut(named) else {
            return Err(BuildError::Other {
                message: format!("cannot define methods on {type_name}"),
                span,
            });
        };
        if n.methods.iter().any(|m| m.name == name) {
            return Err(BuildError::DuplicateDefinition {
                name: format!("{type_name}.{name}"),
                span,
            });
        }
        n.methods.push(Method { name, sig });
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Follows named types to their structural form; unset declarations yield
    /// Invalid.
    pub fn underlying(&self, mut t: TypeId) -> TypeId {
        loop {
            match self.get(t) {
                Type::Named(n) => match n.underlying {
                    Some(u) => t = u,
                    None => return self.invalid,
                },
                _ => return t,
            }
        }
    }

    pub fn is_named(&self, t: TypeId) -> bool {
        matches!(self.get(t), Type::Named(_))
    }

    /// Element type of a pointer, slice, array, map or channel.
    pub fn elem(&self, t: TypeId) -> Option<TypeId> {
        match self.get(self.underlying(t)) {
            Type::Pointer(e) | Type::Slice(e) => Some(*e),
            Type::Array { elem, .. } | Type::Chan { elem, .. } => Some(*elem),
            Type::Map { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn basic_kind(&self, t: TypeId) -> Option<BasicKind> {
        match self.get(self.underlying(t)) {
            Type::Basic(k) => Some(*k),
            _ => None,
        }
    }

    /// Basic properties of `t`; empty for non-basic types.
    pub fn basic_info(&self, t: TypeId) -> BasicInfo {
        self.basic_kind(t)
            .map(BasicKind::info)
            .unwrap_or(BasicInfo::empty())
    }

    pub fn is_untyped(&self, t: TypeId) -> bool {
        self.basic_info(t).is_untyped()
    }

    pub fn signature_of(&self, t: TypeId) -> Option<&SignatureType> {
        match self.get(self.underlying(t)) {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn struct_fields(&self, t: TypeId) -> Option<&[Field]> {
        match self.get(self.underlying(t)) {
            Type::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// The struct an embedded field of type `t` promotes from, looking
    /// through one pointer.
    fn embedded_struct(&self, t: TypeId) -> Option<TypeId> {
        let t = match self.get(self.underlying(t)) {
            Type::Pointer(e) => *e,
            _ => t,
        };
        self.struct_fields(t).map(|_| t)
    }

    /// Resolves `name` on the struct `t`, including fields promoted through
    /// embedded fields.
    ///
    /// Returns the selector path ending in `name` and the field type. The
    /// shallowest match wins; two matches at the same depth are ambiguous and
    /// resolve to `None`.
    pub fn lookup_field(&self, t: TypeId, name: &str) -> Option<(Vec<String>, TypeId)> {
        let mut seen = vec![t];
        let mut level = vec![(Vec::new(), t)];
        while !level.is_empty() {
            let mut found = Vec::new();
            let mut next = Vec::new();
            for (path, t) in &level {
                let Some(fields) = self.struct_fields(*t) else {
                    continue;
                };
                for f in fields {
                    let mut path = path.clone();
                    path.push(f.name.clone());
                    if f.name == name {
                        found.push((path, f.typ));
                    } else if f.embedded {
                        if let Some(inner) = self.embedded_struct(f.typ) {
                            if !seen.contains(&inner) {
                                seen.push(inner);
                                next.push((path, inner));
                            }
                        }
                    }
                }
            }
            match found.len() {
                0 => level = next,
                1 => return found.pop(),
                _ => return None,
            }
        }
        None
    }

    /// The leaf fields of the struct `t` in declaration order, with embedded
    /// structs expanded in place. Each leaf carries its selector path.
    pub fn flat_fields(&self, t: TypeId) -> Option<Vec<(Vec<String>, &Field)>> {
        let mut out = Vec::new();
        self.flatten_into(t, &mut Vec::new(), &mut vec![t], &mut out)?;
        Some(out)
    }

    fn flatten_into<'a>(
        &'a self,
        t: TypeId,
        path: &mut Vec<String>,
        stack: &mut Vec<TypeId>,
        out: &mut Vec<(Vec<String>, &'a Field)>,
    ) -> Option<()> {
        for f in self.struct_fields(t)? {
            path.push(f.name.clone());
            let inner = f
                .embedded
                .then(|| self.embedded_struct(f.typ))
                .flatten()
                .filter(|inner| !stack.contains(inner));
            match inner {
                Some(inner) => {
                    stack.push(inner);
                    self.flatten_into(inner, path, stack, out)?;
                    stack.pop();
                }
                None => out.push((path.clone(), f)),
            }
            path.pop();
        }
        Some(())
    }

    /// Components of a tuple type.
    pub fn tuple_elems(&self, t: TypeId) -> Option<&[TypeId]> {
        match self.get(t) {
            Type::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    /// The pointee of a Reference-type.
    pub fn ref_target(&self, t: TypeId) -> Option<TypeId> {
        match self.get(t) {
            Type::Ref(inner) => Some(*inner),
            _ => None,
        }
    }

    /// The type denoted by a Type-as-value.
    pub fn denoted(&self, t: TypeId) -> Option<TypeId> {
        match self.get(t) {
            Type::TypeOf(inner) => Some(*inner),
            _ => None,
        }
    }

    /// Methods callable on a value of type `t`.
    ///
    /// Named types contribute their declared methods, pointers to named types
    /// their base's methods, and interfaces their method list.
    pub fn method_set(&self, t: TypeId) -> Vec<&Method> {
        let base = match self.get(t) {
            Type::Pointer(e) if self.is_named(*e) => *e,
            _ => t,
        };
        let mut methods: Vec<&Method> = match self.get(base) {
            Type::Named(n) => n.methods.iter().collect(),
            _ => Vec::new(),
        };
        if let Type::Interface(list) = self.get(self.underlying(base)) {
            methods.extend(list.iter());
        }
        methods
    }
}
