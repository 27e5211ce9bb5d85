//! Predeclared basic types.

use bitflags::bitflags;

bitflags! {
    /// Properties of a basic type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BasicInfo: u16 {
        const BOOLEAN  = 1 << 0;
        const INTEGER  = 1 << 1;
        const UNSIGNED = 1 << 2;
        const FLOAT    = 1 << 3;
        const STRING   = 1 << 4;
        const UNTYPED  = 1 << 5;

        const ORDERED  = Self::INTEGER.bits() | Self::FLOAT.bits() | Self::STRING.bits();
        const NUMERIC  = Self::INTEGER.bits() | Self::FLOAT.bits();
        const CONST_TYPE = Self::BOOLEAN.bits() | Self::NUMERIC.bits() | Self::STRING.bits();
    }
}

impl BasicInfo {
    #[inline]
    pub fn is_boolean(self) -> bool {
        self.intersects(BasicInfo::BOOLEAN)
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        self.intersects(BasicInfo::INTEGER)
    }

    #[inline]
    pub fn is_unsigned(self) -> bool {
        self.intersects(BasicInfo::UNSIGNED)
    }

    #[inline]
    pub fn is_float(self) -> bool {
        self.intersects(BasicInfo::FLOAT)
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        self.intersects(BasicInfo::NUMERIC)
    }

    #[inline]
    pub fn is_string(self) -> bool {
        self.intersects(BasicInfo::STRING)
    }

    #[inline]
    pub fn is_ordered(self) -> bool {
        self.intersects(BasicInfo::ORDERED)
    }

    #[inline]
    pub fn is_untyped(self) -> bool {
        self.intersects(BasicInfo::UNTYPED)
    }
}

/// The predeclared basic types, plus the untyped constant kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    String,

    UntypedBool,
    UntypedInt,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    /// Every basic kind, in declaration order.
    pub const ALL: [BasicKind; 20] = [
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::String,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedFloat,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub fn info(self) -> BasicInfo {
        use BasicKind::*;
        match self {
            Bool => BasicInfo::BOOLEAN,
            Int | Int8 | Int16 | Int32 | Int64 => BasicInfo::INTEGER,
            Uint | Uint8 | Uint16 | Uint32 | Uint64 | Uintptr => {
                BasicInfo::INTEGER | BasicInfo::UNSIGNED
            }
            Float32 | Float64 => BasicInfo::FLOAT,
            String => BasicInfo::STRING,
            UntypedBool => BasicInfo::BOOLEAN | BasicInfo::UNTYPED,
            UntypedInt => BasicInfo::INTEGER | BasicInfo::UNTYPED,
            UntypedFloat => BasicInfo::FLOAT | BasicInfo::UNTYPED,
            UntypedString => BasicInfo::STRING | BasicInfo::UNTYPED,
            UntypedNil => BasicInfo::UNTYPED,
        }
    }

    /// The name used in rendered types and diagnostics.
    pub fn name(self) -> &'static str {
        use BasicKind::*;
        match self {
            Bool => "bool",
            Int => "int",
            Int8 => "int8",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            Uint => "uint",
            Uint8 => "uint8",
            Uint16 => "uint16",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Uintptr => "uintptr",
            Float32 => "float32",
            Float64 => "float64",
            String => "string",
            UntypedBool => "untyped bool",
            UntypedInt => "untyped int",
            UntypedFloat => "untyped float",
            UntypedString => "untyped string",
            UntypedNil => "untyped nil",
        }
    }

    /// Inclusive value range of an integer kind.
    pub fn int_range(self) -> Option<(i128, i128)> {
        use BasicKind::*;
        Some(match self {
            Int | Int64 => (i64::MIN as i128, i64::MAX as i128),
            Int8 => (i8::MIN as i128, i8::MAX as i128),
            Int16 => (i16::MIN as i128, i16::MAX as i128),
            Int32 => (i32::MIN as i128, i32::MAX as i128),
            Uint | Uint64 | Uintptr => (0, u64::MAX as i128),
            Uint8 => (0, u8::MAX as i128),
            Uint16 => (0, u16::MAX as i128),
            Uint32 => (0, u32::MAX as i128),
            UntypedInt => (i128::MIN, i128::MAX),
            _ => return None,
        })
    }

    /// The type an untyped constant takes when nothing else decides.
    pub fn default_kind(self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_kinds_carry_string_info() {
        assert!(BasicKind::String.info().is_string());
        assert!(BasicKind::UntypedString.info().is_string());
        assert!(!BasicKind::Int.info().is_string());
    }

    #[test]
    fn untyped_defaults() {
        assert_eq!(BasicKind::UntypedInt.default_kind(), BasicKind::Int);
        assert_eq!(BasicKind::UntypedFloat.default_kind(), BasicKind::Float64);
        assert_eq!(BasicKind::UntypedNil.default_kind(), BasicKind::UntypedNil);
    }

    #[test]
    fn unsigned_ranges() {
        assert_eq!(BasicKind::Uint8.int_range(), Some((0, 255)));
        assert!(BasicKind::Uint8.info().is_unsigned());
        assert_eq!(BasicKind::Float64.int_range(), None);
    }
}
