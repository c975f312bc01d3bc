//! Page Lifecycle Engine Error Hierarchy
//!
//! Defines error types for the lifecycle engine, categorized by subsystem:
//! template compilation, persisted state, and validator evaluation.

use std::path::PathBuf;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Template compilation and loading failures
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Persisted view-state restoration failures
    #[error(transparent)]
    State(#[from] StateError),

    /// Validator protocol failures
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Settings validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring the request to be abandoned
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Requested template path does not exist (recoverable, host may 404)
    #[error("Template not found: {path:?}")]
    NotFound { path: PathBuf },

    /// Malformed template source, with source location
    #[error("{path:?}({line},{column}): {message}")]
    Syntax {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },

    /// Structurally valid template referencing something unresolvable
    /// (bad validator operand, invalid pattern expression)
    #[error("{path:?}: {message}")]
    Reference { path: PathBuf, message: String },

    /// Cooperative abort via the caller's cancellation token.
    /// Not a failure; no partial artifact is produced.
    #[error("Compilation cancelled: {path:?}")]
    Cancelled { path: PathBuf },

    /// File provider I/O failures during source retrieval
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Persisted state shape does not match the control tree.
    /// Fatal for the affected subtree only.
    #[error("Corrupted state for control '{control}': {detail}")]
    Corruption { control: String, detail: String },

    /// Serialization failures for the view-state payload
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Validator target name does not resolve within its naming container
    #[error("Validator '{validator}' cannot find the control '{target}' to validate")]
    TargetNotFound { target: String, validator: String },

    /// Target resolved but its control kind exposes no validatable value
    #[error("Control '{target}' referenced by validator '{validator}' has no validation value")]
    PropertyNotFound { target: String, validator: String },

    /// Validator declared without a target control
    #[error("Validator '{validator}' has no target control set")]
    TargetBlank { validator: String },

    /// Custom rule references a callback that was never registered
    #[error("Validator '{validator}' references unknown callback '{callback}'")]
    CallbackNotFound { validator: String, callback: String },
}

// ============== Conversion Implementations ============== //
impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::State(StateError::Serialization(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Compile(CompileError::Io(e))
    }
}

impl Error {
    /// Whether this error is the cooperative cancellation signal rather
    /// than a real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Compile(CompileError::Cancelled { .. }))
    }
}
