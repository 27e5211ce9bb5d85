//! Structural classification of types.

use super::{Type, TypeId, TypeUniverse};

/// Structural shape of a type.
///
/// Always recomputed from a [`TypeId`]; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Invalid,
    Basic,
    /// A basic type with the string property; indexes to bytes.
    TextString,
    Pointer,
    /// Dynamic array (slice).
    Sequence,
    Map,
    Signature,
    Record,
    AbstractInterface,
    Channel,
    FixedArray,
}

/// Classifies `t`, following named types to their underlying form.
///
/// Tuples, the meta wrappers and incomplete named types classify as
/// [`Kind::Invalid`].
pub fn classify(types: &TypeUniverse, mut t: TypeId) -> Kind {
    loop {
        return match types.get(t) {
            Type::Named(named) => match named.underlying {
                Some(u) => {
                    t = u;
                    continue;
                }
                None => Kind::Invalid,
            },
            Type::Basic(kind) if kind.info().is_string() => Kind::TextString,
            Type::Basic(_) => Kind::Basic,
            Type::Pointer(_) => Kind::Pointer,
            Type::Slice(_) => Kind::Sequence,
            Type::Array { .. } => Kind::FixedArray,
            Type::Map { .. } => Kind::Map,
            Type::Chan { .. } => Kind::Channel,
            Type::Signature(_) => Kind::Signature,
            Type::Struct(_) => Kind::Record,
            Type::Interface(_) => Kind::AbstractInterface,
            Type::Invalid | Type::Tuple(_) | Type::Ref(_) | Type::TypeOf(_) => Kind::Invalid,
        };
    }
}

impl TypeUniverse {
    /// Structural kind of `t`.
    #[inline]
    pub fn kind(&self, t: TypeId) -> Kind {
        classify(self, t)
    }
}
