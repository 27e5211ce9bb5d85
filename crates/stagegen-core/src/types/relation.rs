//! Type relations: identity, assignability, conversion.

use super::{BasicKind, ChanDir, Kind, Type, TypeId, TypeUniverse};
use crate::ConstValue;

impl TypeUniverse {
    /// Type identity.
    ///
    /// Structural types are hash-consed and named types are nominal, so this
    /// is handle equality.
    #[inline]
    pub fn identical(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    /// The type an untyped constant defaults to; other types are unchanged.
    pub fn default_type(&self, t: TypeId) -> TypeId {
        match self.get(t) {
            Type::Basic(kind) => self.basic(kind.default_kind()),
            _ => t,
        }
    }

    /// Whether a value of type `from` may be assigned to a location of type
    /// `to`, without knowing the value.
    pub fn assignable_to(&self, from: TypeId, to: TypeId) -> bool {
        if from == self.invalid() || to == self.invalid() {
            return false;
        }
        if self.identical(from, to) {
            return true;
        }

        let from_u = self.underlying(from);
        let to_u = self.underlying(to);

        if let Type::Basic(kind) = self.get(from) {
            if kind.info().is_untyped() {
                return self.untyped_assignable(*kind, to);
            }
        }

        // identical underlying types, at least one side unnamed
        if from_u == to_u && (!self.is_named(from) || !self.is_named(to)) {
            return !matches!(self.get(from_u), Type::Invalid);
        }

        if matches!(self.get(to_u), Type::Interface(_)) {
            return self.implements(from, to);
        }

        // bidirectional channel into a directional one
        if let (Type::Chan { elem: fe, dir }, Type::Chan { elem: te, .. }) =
            (self.get(from_u), self.get(to_u))
        {
            let unnamed = !self.is_named(from) || !self.is_named(to);
            return *dir == ChanDir::Both && fe == te && unnamed;
        }
        false
    }

    fn untyped_assignable(&self, kind: BasicKind, to: TypeId) -> bool {
        let to_u = self.underlying(to);
        match self.get(to_u) {
            Type::Interface(methods) => kind == BasicKind::UntypedNil || methods.is_empty(),
            Type::Basic(target) => {
                let info = target.info();
                match kind {
                    BasicKind::UntypedBool => info.is_boolean(),
                    BasicKind::UntypedInt => info.is_numeric(),
                    BasicKind::UntypedFloat => info.is_float(),
                    BasicKind::UntypedString => info.is_string(),
                    _ => false,
                }
            }
            Type::Pointer(_)
            | Type::Slice(_)
            | Type::Map { .. }
            | Type::Chan { .. }
            | Type::Signature(_) => kind == BasicKind::UntypedNil,
            _ => false,
        }
    }

    /// Assignability with the value in hand: an untyped constant must also be
    /// representable in the target, so `1.0` fits an `int` while `1.5` does
    /// not.
    pub fn assignable_value(&self, from: TypeId, value: Option<&ConstValue>, to: TypeId) -> bool {
        match (value, self.get(from), self.basic_kind(to)) {
            (Some(v), Type::Basic(kind), Some(target)) if kind.info().is_untyped() => {
                v.representable(target).is_some()
            }
            _ => self.assignable_to(from, to),
        }
    }

    /// Whether `t` has every method of the interface `iface`.
    pub fn implements(&self, t: TypeId, iface: TypeId) -> bool {
        let Type::Interface(required) = self.get(self.underlying(iface)) else {
            return false;
        };
        if required.is_empty() {
            return t != self.invalid() && !self.is_untyped(t);
        }
        let have = self.method_set(t);
        required
            .iter()
            .all(|m| have.iter().any(|h| h.name == m.name && h.sig == m.sig))
    }

    /// Whether values of `t` support `==` and `!=`.
    pub fn comparable(&self, t: TypeId) -> bool {
        match self.get(self.underlying(t)) {
            Type::Basic(_) | Type::Pointer(_) | Type::Chan { .. } | Type::Interface(_) => true,
            Type::Struct(fields) => fields.iter().all(|f| self.comparable(f.typ)),
            Type::Array { elem, .. } => self.comparable(*elem),
            _ => false,
        }
    }

    /// Whether `t` is nil-comparable only (slices, maps, functions).
    pub fn nil_comparable(&self, t: TypeId) -> bool {
        matches!(self.kind(t), Kind::Sequence | Kind::Map | Kind::Signature)
    }

    /// Whether `from` converts explicitly to `to` (`T(x)`).
    pub fn convertible(&self, from: TypeId, value: Option<&ConstValue>, to: TypeId) -> bool {
        if self.assignable_value(from, value, to) {
            return true;
        }
        let (fu, tu) = (self.underlying(from), self.underlying(to));
        if fu == tu {
            return true;
        }
        let (fi, ti) = (self.basic_info(from), self.basic_info(to));
        if fi.is_numeric() && ti.is_numeric() {
            return true;
        }
        // integer to string, string <-> []byte
        if ti.is_string() && fi.is_integer() {
            return true;
        }
        let byte_slice = self.is_byte_slice(fu) || self.is_byte_slice(tu);
        byte_slice && (fi.is_string() || ti.is_string())
    }

    fn is_byte_slice(&self, t: TypeId) -> bool {
        match self.get(t) {
            Type::Slice(e) => self.basic_kind(*e) == Some(BasicKind::Uint8),
            _ => false,
        }
    }
}
