#![warn(missing_docs)]

//! Plug-to-groove assembly for snapfit.
//!
//! [`AssemblyResolver`] decides where a moving part goes by trying three
//! tiers in order: the authored insertion offset of an assembly config,
//! vertex analysis of both meshes, and finally an inset face of the
//! receiving part's bounding box. [`AssemblyManager`] animates parts to
//! the resolved target and back, and draws groove highlights.

pub mod error;
pub mod manager;
pub mod policy;
pub mod resolver;
pub mod strategy;

pub use error::{AssemblyError, Result};
pub use manager::{
    AssembleOptions, AssemblyManager, AssemblyOutcome, DisassembleOptions, DisassemblyOutcome,
    ProgressFn, DEFAULT_DURATION, DEFAULT_EASING,
};
pub use policy::{fallback_anchor, select_nearest_hole, select_primary_plug, within_ceiling};
pub use resolver::{AssemblyAttempt, AssemblyResolver, Resolution};
pub use strategy::{
    BoundingBoxStrategy, DetectionStrategy, MetadataStrategy, ResolveContext, StrategyOutput,
    StrategyTag, VertexAnalysisStrategy,
};
