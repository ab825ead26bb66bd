//! Error types for assembly operations.

use thiserror::Error;

/// Errors from the assembly manager.
///
/// Missing nodes and unresolvable geometry are reported through outcome
/// values, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// An operation ran before `initialize` or after `dispose`.
    #[error("assembly manager is not initialized (called {0})")]
    NotInitialized(&'static str),

    /// A configured duration cannot be represented as a [`std::time::Duration`].
    #[error("invalid animation duration: {0}")]
    InvalidDuration(String),
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, AssemblyError>;
