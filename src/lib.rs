//! Stagegen
//!
//! A builder for well-typed imperative program fragments, and staged
//! operations that run either live or as generated code through it.
//!
//! - [`core`]: host type system, constants, spans, errors, configuration
//! - [`builder`]: expressions, statements, scopes and function assembly
//! - [`staged`]: dual-mode operations over a shared capability set

pub use stagegen_builder as builder;
pub use stagegen_core as core;
pub use stagegen_staged as staged;

// Re-export main types
pub mod prelude {
    pub use stagegen_builder::{
        AssignStmt, BlockCtx, BlockStmt, Callee, Expr, ForStmt, Func, FuncFlags, IfStmt, Operand,
        Package, PkgRef, RangeStmt, ReturnStmt, Signature, Stmt, Var, ast,
    };
    pub use stagegen_core::{
        BinaryOp, BuildConfig, BuildError, BuildProperty, ConstValue, Kind, Span, TypeId,
        TypeUniverse, UnaryOp,
    };
    pub use stagegen_staged::{
        Class, Effects, ExecConfig, Executor, Generator, Interpreter, RecordingExecutor,
        StagedError, Value,
    };
}
