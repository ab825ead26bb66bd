//! Errors surfaced by [`ManualStudio`](crate::ManualStudio).

use thiserror::Error;

use snapfit_assembly::AssemblyError;
use snapfit_camera::CameraError;
use snapfit_motion::MotionError;

/// Any hard failure of a studio operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StudioError {
    /// From the assembly manager.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    /// From the camera director.
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// From headless playback.
    #[error(transparent)]
    Motion(#[from] MotionError),
}

/// Result type for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;
