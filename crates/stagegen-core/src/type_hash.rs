//! Deterministic identity for named types.
//!
//! Named types are nominal: two declarations with the same qualified name are
//! the same type. [`TypeHash`] turns a qualified name (`pkg.Name`) into a
//! 64-bit key so the universe can find an existing declaration with a single
//! map lookup, independent of declaration order. Members of imported
//! packages are keyed the same way.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
pub mod hash_constants {
    /// Separator between the package path and the type name.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for named type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;
}

/// A 64-bit hash identifying a named type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Hash of an already qualified name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_constants::TYPE))
    }

    /// Combine a package hash with a member name; used for package members
    /// that are not types.
    pub fn member(self, name: &str) -> Self {
        let tail = xxh64(name.as_bytes(), hash_constants::TYPE);
        TypeHash(self.0 ^ hash_constants::SEP ^ tail)
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let user = TypeHash::from_name("main.User");
        assert_eq!(user, TypeHash::from_name("main.User"));
        assert_ne!(user, TypeHash::from_name("main.Post"));
    }

    #[test]
    fn member_differs_from_type() {
        let pkg = TypeHash::from_name("sql");
        assert_ne!(pkg.member("Exec"), TypeHash::from_name("sql.Exec"));
        assert_ne!(pkg.member("Exec"), pkg.member("Panicf"));
    }
}
