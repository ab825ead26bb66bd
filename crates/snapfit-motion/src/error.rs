//! Error types for the motion scheduler.

use thiserror::Error;

/// Errors from the motion scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// An easing name is not in the catalogue.
    #[error("unknown easing: {0}")]
    UnknownEasing(String),

    /// A driven future is waiting but no motion is left to tick.
    #[error("future is pending with no active motions")]
    Stalled,

    /// Frames were driven with a zero time step.
    #[error("frame step must be positive")]
    ZeroFrameStep,
}

/// Result type for motion operations.
pub type Result<T> = std::result::Result<T, MotionError>;
