#![warn(missing_docs)]

//! Assembly configuration for snapfit.
//!
//! An [`AssemblyConfig`] is optional authored data keyed by an assembly
//! name. When it carries an insertion offset the resolver trusts it
//! outright; otherwise its groove-detection block tunes the geometric
//! tiers. [`ConfigStore`] loads configs once and caches them.

pub mod error;
pub mod model;
pub mod store;

pub use error::{ConfigError, Result};
pub use model::{AnimationParams, AssemblyConfig, GrooveDetection, Insertion};
pub use store::{ConfigSource, ConfigStore};
