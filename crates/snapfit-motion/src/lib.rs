#![warn(missing_docs)]

//! Tick-driven motion playback.
//!
//! [`MotionScheduler::animate`] interpolates anything a callback can
//! write: the callback receives linear and eased progress each frame,
//! which covers both plain position tweens and coupled camera moves where
//! the look-at point follows its own lerp. The returned [`MotionHandle`]
//! is a future that resolves once, as completed or cancelled.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use snapfit_motion::{drive_frames, AnimateOptions, Easing, MotionScheduler};
//!
//! let scheduler = MotionScheduler::new();
//! let x = Rc::new(Cell::new(0.0));
//! let sink = x.clone();
//! let handle = scheduler.animate(
//!     move |_, eased| sink.set(10.0 * eased),
//!     AnimateOptions::new(Duration::from_millis(500)).with_easing(Easing::CubicOut),
//! );
//! drive_frames(&scheduler, Duration::from_millis(16), handle).unwrap();
//! assert_eq!(x.get(), 10.0);
//! ```

pub mod drive;
pub mod easing;
pub mod error;
pub mod scheduler;

pub use drive::drive_frames;
pub use easing::Easing;
pub use error::{MotionError, Result};
pub use scheduler::{AnimateOptions, MotionHandle, MotionOutcome, MotionScheduler, PropertyKey};
