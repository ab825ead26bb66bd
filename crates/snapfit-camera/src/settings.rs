//! Cinematic tunables.

use std::time::Duration;

use snapfit_math::Vec3;
use snapfit_motion::Easing;

use crate::error::{CameraError, Result};

/// Timing and framing parameters for the camera director.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CinematicSettings {
    /// Duration of the alignment phase.
    pub align_duration: Duration,
    /// Easing of the alignment phase.
    pub align_easing: Easing,
    /// Duration of the approach phase.
    pub approach_duration: Duration,
    /// Easing of the approach phase.
    pub approach_easing: Easing,
    /// Alignment distance in multiples of the target's depth.
    pub front_offset_factor: f64,
    /// Fraction of the remaining look-at distance closed per alignment tick.
    pub align_look_lerp: f64,
    /// Fraction of the remaining look-at distance closed per approach tick.
    pub approach_look_lerp: f64,
    /// Framing margin: 1 fills the view exactly.
    pub zoom_ratio: f64,
    /// Direction, in the target's frame, the camera approaches from.
    pub approach_direction: Vec3,
    /// Pause between consecutive moves of a sequence.
    pub sequence_pause: Duration,
    /// Control point offset of the curved approach, in target diagonals.
    pub curve_bend_factor: f64,
    /// Default bend direction of the curved approach.
    pub curve_bend_direction: Vec3,
    /// Samples of the debug path polyline.
    pub debug_path_samples: usize,
}

impl Default for CinematicSettings {
    fn default() -> Self {
        Self {
            align_duration: Duration::from_millis(1000),
            align_easing: Easing::CubicInOut,
            approach_duration: Duration::from_millis(1500),
            approach_easing: Easing::CubicOut,
            front_offset_factor: 3.0,
            align_look_lerp: 0.05,
            approach_look_lerp: 0.1,
            zoom_ratio: 1.3,
            approach_direction: Vec3::z(),
            sequence_pause: Duration::from_millis(500),
            curve_bend_factor: 0.5,
            curve_bend_direction: -Vec3::y(),
            debug_path_samples: 48,
        }
    }
}

impl CinematicSettings {
    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.align_look_lerp) || !unit.contains(&self.approach_look_lerp) {
            return Err(CameraError::InvalidSettings(
                "look-at lerp factors must be in [0, 1]".into(),
            ));
        }
        if !(self.zoom_ratio > 0.0) || !(self.front_offset_factor > 0.0) {
            return Err(CameraError::InvalidSettings(
                "zoom ratio and front offset factor must be positive".into(),
            ));
        }
        if self.approach_direction.norm() < 1e-9 {
            return Err(CameraError::InvalidSettings(
                "approach direction must be non-zero".into(),
            ));
        }
        if self.debug_path_samples < 2 {
            return Err(CameraError::InvalidSettings(
                "debug path needs at least 2 samples".into(),
            ));
        }
        Ok(())
    }

    /// Zoom ratio for one-shot framing, by target size.
    pub fn adaptive_zoom(diagonal: f64) -> f64 {
        if diagonal < 5.0 {
            3.0
        } else if diagonal > 20.0 {
            1.5
        } else {
            2.0
        }
    }
}
