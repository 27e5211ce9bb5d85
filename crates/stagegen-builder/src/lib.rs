//! Stagegen builder
//!
//! Constructs well-typed imperative program fragments: every node carries a
//! synthesized [`ast`] representation together with its semantic type, and
//! every builder call validates its operands before returning.
//!
//! ## Architecture
//!
//! - **Expressions** are built immediately through the [`Package`] and are
//!   checked on construction.
//! - **Statements** are assembled from parts and checked when finalized
//!   against a [`BlockCtx`], which is also when their scopes are created.
//! - **Functions** bind a [`Signature`] and flags to a statement body and
//!   finalize into an [`ast::FuncDecl`] or an [`ast::FuncLit`].
//!
//! ## Modules
//!
//! - [`ast`]: The synthesized low-level tree
//! - [`assign`]: Tuple-arity and per-slot assignability checks
//! - [`context`]: Finalization context
//! - [`expr`]: Index, slice, dereference, selection, operators and calls
//! - [`func`]: Signatures and function units
//! - [`scope`]: Lexical scope arena
//! - [`stmt`]: Statement builders

pub mod assign;
pub mod ast;
pub mod builtins;
pub mod context;
pub mod expr;
pub mod func;
mod node;
mod package;
pub mod scope;
pub mod stmt;

pub use assign::{Tuple, check_assignable, check_values};
pub use builtins::Builtin;
pub use context::BlockCtx;
pub use expr::Callee;
pub use func::{Func, FuncFlags, Signature};
pub use node::{Expr, Operand, Var};
pub use package::{Package, PkgRef};
pub use scope::{ScopeId, ScopeTree, Symbol};
pub use stmt::{AssignStmt, BlockStmt, ForStmt, IfStmt, IncDecStmt, RangeStmt, ReturnStmt, Stmt};

// Re-export the core for convenience
pub use stagegen_core::{BuildConfig, BuildError, BuildProperty, Kind, Span, TypeId, TypeUniverse};
