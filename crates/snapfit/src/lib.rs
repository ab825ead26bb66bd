#![warn(missing_docs)]

//! snapfit: geometry-driven assembly playback for product manuals.
//!
//! Given a moving part and a receiving part in a scene graph, snapfit
//! works out where the part goes without authored anchor points, animates
//! it there and back, and keeps the camera on the action.
//!
//! This crate re-exports the workspace crates and adds [`ManualStudio`],
//! which wires them to one scene.
//!
//! # Example
//!
//! ```rust
//! use snapfit::{AssembleOptions, AssemblyOutcome, ConfigStore, ManualStudio, DEFAULT_FRAME};
//! use snapfit::scene::{MeshGeometry, SceneGraph, SceneNode};
//! use snapfit::math::Point3;
//!
//! let quad = |x: f64| {
//!     MeshGeometry::quad([
//!         Point3::new(x - 0.25, -0.25, 0.0),
//!         Point3::new(x + 0.25, -0.25, 0.0),
//!         Point3::new(x + 0.25, 0.25, 0.0),
//!         Point3::new(x - 0.25, 0.25, 0.0),
//!     ])
//! };
//! let mut scene = SceneGraph::new();
//! let root = scene.root();
//! scene.add_child(root, SceneNode::new("Pin").with_geometry(quad(0.0))).unwrap();
//! scene.add_child(root, SceneNode::new("Socket").with_geometry(quad(2.0))).unwrap();
//!
//! let studio = ManualStudio::new(scene, ConfigStore::empty());
//! let outcome = studio
//!     .play(DEFAULT_FRAME, studio.assemble("Pin", "Socket", AssembleOptions::default()))
//!     .unwrap()
//!     .unwrap();
//! assert!(matches!(outcome, AssemblyOutcome::Completed { .. }));
//! ```

pub mod error;
pub mod studio;

pub use snapfit_assembly as assembly;
pub use snapfit_camera as camera;
pub use snapfit_config as config;
pub use snapfit_detect as detect;
pub use snapfit_math as math;
pub use snapfit_motion as motion;
pub use snapfit_scene as scene;

pub use error::{Result, StudioError};
pub use studio::{ManualStudio, DEFAULT_FRAME};

pub use snapfit_assembly::{
    AssembleOptions, AssemblyOutcome, DisassembleOptions, DisassemblyOutcome, StrategyTag,
};
pub use snapfit_camera::{CameraRig, CinematicOutcome, CinematicSettings, SequenceReport};
pub use snapfit_config::{AssemblyConfig, ConfigStore};
pub use snapfit_motion::{Easing, MotionScheduler};
