//! Assembly config schema.
//!
//! Field names follow the camelCase JSON that manual authors already
//! write. Every field of the groove-detection block has a default, so an
//! empty object is a valid config.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use snapfit_math::{vec3_from_array, Axis, Vec3};

use crate::error::{ConfigError, Result};

/// One named assembly config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyConfig {
    /// Parameters for the geometric tiers.
    #[serde(default)]
    pub groove_detection: GrooveDetection,
    /// Authored insertion offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insertion: Option<Insertion>,
    /// Playback parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationParams>,
}

/// Groove and plug detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrooveDetection {
    /// Fraction of the hole box used as the inset window (0 to 1).
    pub inner_bound_ratio: f64,
    /// Direction the hole walls face.
    pub normal_filter: [f64; 3],
    /// Accepted deviation from `normal_filter`, as `1 - |cos|`.
    pub normal_tolerance: f64,
    /// Dihedral angle for feature edges (degrees).
    pub edge_angle_threshold: f64,
    /// Cluster radius for plug samples.
    pub plug_clustering_distance: f64,
    /// Cluster radius for hole samples.
    pub hole_clustering_distance: f64,
    /// Clusters with more members than this are not discrete features.
    ///
    /// The default of 500 is a fixed constant rather than a value derived
    /// from the mesh. A ceiling tied to the mesh's vertex count would
    /// reject every single-feature part, whose only cluster is the whole
    /// mesh. Authored configs lower it for dense models.
    pub max_vertices_threshold: usize,
    /// Direction the plug is inserted along.
    pub plug_search_direction: [f64; 3],
    /// Vertical axis of the model.
    pub up_axis: Axis,
}

impl Default for GrooveDetection {
    fn default() -> Self {
        Self {
            inner_bound_ratio: 0.3,
            normal_filter: [0.0, 0.0, 1.0],
            normal_tolerance: 0.2,
            edge_angle_threshold: 15.0,
            plug_clustering_distance: 1.0,
            hole_clustering_distance: 1.0,
            max_vertices_threshold: 500,
            plug_search_direction: [0.0, 0.0, -1.0],
            up_axis: Axis::Y,
        }
    }
}

impl GrooveDetection {
    /// Hole normal as a vector.
    pub fn normal_filter(&self) -> Vec3 {
        vec3_from_array(self.normal_filter)
    }

    /// Plug search direction as a vector.
    pub fn plug_search_direction(&self) -> Vec3 {
        vec3_from_array(self.plug_search_direction)
    }
}

/// Authored insertion data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insertion {
    /// Target local position of the moving part.
    pub offset: [f64; 3],
}

impl Insertion {
    /// The offset, if every component is finite.
    pub fn usable_offset(&self) -> Option<Vec3> {
        self.offset
            .iter()
            .all(|c| c.is_finite())
            .then(|| vec3_from_array(self.offset))
    }
}

/// Playback parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationParams {
    /// Duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Easing name, e.g. `"power2.inOut"` or `"easeOutCubic"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}

impl AssemblyConfig {
    /// The insertion offset when one is present and finite.
    pub fn insertion_offset(&self) -> Option<Vec3> {
        self.insertion.as_ref().and_then(Insertion::usable_offset)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let g = &self.groove_detection;
        if !(0.0..1.0).contains(&g.inner_bound_ratio) {
            return Err(ConfigError::Invalid(
                "innerBoundRatio must be in [0, 1)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&g.normal_tolerance) {
            return Err(ConfigError::Invalid(
                "normalTolerance must be in [0, 1]".into(),
            ));
        }
        if !(g.plug_clustering_distance >= 0.0) || !(g.hole_clustering_distance >= 0.0) {
            return Err(ConfigError::Invalid(
                "clustering distances must be non-negative".into(),
            ));
        }
        if !(g.edge_angle_threshold >= 0.0 && g.edge_angle_threshold <= 180.0) {
            return Err(ConfigError::Invalid(
                "edgeAngleThreshold must be between 0 and 180 degrees".into(),
            ));
        }
        if g.normal_filter().norm() <= f64::EPSILON {
            return Err(ConfigError::Invalid("normalFilter must be non-zero".into()));
        }
        if g.plug_search_direction().norm() <= f64::EPSILON {
            return Err(ConfigError::Invalid(
                "plugSearchDirection must be non-zero".into(),
            ));
        }
        if let Some(duration) = self.animation.as_ref().and_then(|a| a.duration) {
            if !(duration >= 0.0) || !duration.is_finite() {
                return Err(ConfigError::Invalid(
                    "animation duration must be finite and non-negative".into(),
                ));
            }
            if Duration::try_from_secs_f64(duration / 1000.0).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "animation duration {duration} ms is out of range"
                )));
            }
        }
        Ok(())
    }
}
