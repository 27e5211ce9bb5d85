//! Errors raised by staged operations.
//!
//! ```text
//! StagedError
//! ├── Usage  - the operation was called with arguments it cannot handle
//! ├── Build  - the builder rejected a generated construct
//! ├── Panic  - the live interpreter reached a runtime panic
//! └── Exec   - the executor failed to run a statement
//! ```

use stagegen_core::BuildError;
use thiserror::Error;

/// Errors from a staged consumer, in either mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StagedError {
    /// Arguments the operation does not accept.
    #[error("{0}")]
    Usage(String),

    /// A construction error while generating code.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// A runtime panic raised while interpreting.
    #[error("panic: {0}")]
    Panic(String),

    /// The executor failed.
    #[error("exec: {0}")]
    Exec(String),
}

impl StagedError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        StagedError::Usage(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StagedError>;
