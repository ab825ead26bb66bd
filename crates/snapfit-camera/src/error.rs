//! Error types for camera choreography.

use thiserror::Error;

/// Errors from the camera director.
///
/// A missing focus node is reported as an outcome, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// An operation ran before `initialize` or after `dispose`.
    #[error("camera director is not initialized (called {0})")]
    NotInitialized(&'static str),

    /// Rejected cinematic settings.
    #[error("invalid cinematic settings: {0}")]
    InvalidSettings(String),
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;
