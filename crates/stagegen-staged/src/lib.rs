//! Stagegen staged operations
//!
//! Operations written once and run in two modes: interpreted directly on
//! live [`Value`]s, or turned into generated statements through the builder.
//!
//! ```text
//! Class::insert ──► Effects ─┬─► Interpreter ──► Executor
//!                            └─► Generator   ──► Package
//! ```
//!
//! Usage errors are detected before anything runs or is emitted, in both
//! modes. Conditions that depend on run-time data (empty input, mismatched
//! list lengths) are staged: the interpreter panics, the generator emits a
//! conditional panic.

pub mod effects;
pub mod error;
pub mod generate;
pub mod insert;
pub mod interp;
pub mod value;

pub use effects::{Effects, Runtime};
pub use error::{Result, StagedError};
pub use generate::Generator;
pub use insert::{Class, val_param, val_params};
pub use interp::{ExecConfig, Executor, Interpreter, RecordingExecutor};
pub use value::Value;
