#![warn(missing_docs)]

//! Cinematic camera choreography for snapfit.
//!
//! [`CameraDirector`] moves a shared [`CameraRig`] through chained,
//! eased phases that keep a scene node in frame: align in front of it,
//! then approach until its bounding diagonal fills the view. Phases run
//! on the same [`snapfit_motion::MotionScheduler`] as part animations, so
//! both can play at once.

pub mod director;
pub mod error;
pub mod rig;
pub mod settings;

pub use director::{
    CameraDirector, CinematicOutcome, CurveOptions, FocusPlan, SequenceReport, SequenceStep,
};
pub use error::{CameraError, Result};
pub use rig::{CameraRig, SharedCamera};
pub use settings::CinematicSettings;
