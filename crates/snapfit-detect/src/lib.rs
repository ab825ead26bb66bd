#![warn(missing_docs)]

//! Geometric analysis for locating plugs and grooves.
//!
//! Nothing here needs authored anchor points. Detectors read mesh buffers
//! from the scene graph and return world-space vertex samples or clusters.
//! A missing mesh, an empty buffer or an all-filtered mesh yields an empty
//! result, never an error; callers treat empty as "not found".
//!
//! - [`detect_by_normal_filter`] / [`detect_holes`]: faces aligned with a
//!   direction, for receiving walls.
//! - [`detect_by_depth_threshold`]: vertices recessed behind the front face.
//! - [`detect_plug_by_edge_analysis`]: leading feature-edge outline along an
//!   insertion direction.
//! - [`cluster`]: greedy grouping of samples into candidates.

pub mod cluster;
pub mod depth;
pub mod edges;
pub mod groove;
pub mod normal_filter;
pub mod plug;
pub mod sample;

pub use cluster::{cluster, cluster_samples, Cluster};
pub use depth::{
    classify_side, depth_threshold, detect_by_depth_threshold, DepthDetection, DepthProbe,
    DepthSample, Side,
};
pub use edges::{feature_edges, FeatureEdge};
pub use groove::{detect_facing_faces, detect_inner_groove_edges, inner_window};
pub use normal_filter::{detect_by_normal_filter, detect_holes};
pub use plug::{detect_plug_by_edge_analysis, plug_samples_by_edge_analysis};
pub use sample::VertexSample;
