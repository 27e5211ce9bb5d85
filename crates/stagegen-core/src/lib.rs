//! Core types shared by the stagegen builder and its consumers.
//!
//! - [`TypeUniverse`] - the host type system, with [`classify`] and the
//!   assignability relation
//! - [`ConstValue`] - compile-time constants and folding
//! - [`BuildError`] - construction diagnostics
//! - [`BuildConfig`] - package configuration
//! - [`Span`] - source origins carried by nodes

pub mod config;
pub mod constant;
pub mod error;
pub mod ops;
pub mod span;
pub mod type_hash;
pub mod types;

pub use config::{BuildConfig, BuildProperty};
pub use constant::ConstValue;
pub use error::BuildError;
pub use ops::{BinaryOp, UnaryOp};
pub use span::Span;
pub use type_hash::TypeHash;
pub use types::{
    BasicInfo, BasicKind, ChanDir, Field, Kind, Method, NamedType, SignatureType, Type, TypeId,
    TypeUniverse, classify,
};

/// Result alias for construction.
pub type Result<T> = std::result::Result<T, BuildError>;
