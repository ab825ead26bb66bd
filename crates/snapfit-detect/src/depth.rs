//! Depth-threshold probing for recessed geometry.
//!
//! Looking along a face direction, the frontmost vertices of a part form
//! its flat front face. Anything sufficiently far behind that face is
//! recessed, which is where grooves live.

use snapfit_math::{Aabb3, Axis, Vec3};
use snapfit_scene::{NodeId, SceneGraph};

use crate::sample::{mesh_views, VertexSample};

/// Fraction of the extent along the probe direction used as threshold.
pub const DEPTH_RATIO: f64 = 0.1;

/// Lower bound of the depth threshold.
pub const MIN_DEPTH_THRESHOLD: f64 = 0.001;

/// Which half of a part a recessed sample sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Below the box center on the secondary axis.
    Left,
    /// At or above the box center on the secondary axis.
    Right,
}

/// Side classification on the probe's secondary axis.
///
/// A coordinate exactly on the center falls to [`Side::Right`].
pub fn classify_side(coord: f64, center: f64) -> Side {
    if coord < center {
        Side::Left
    } else {
        Side::Right
    }
}

/// Depth threshold for a part spanning `extent` along the probe direction.
pub fn depth_threshold(extent: f64) -> f64 {
    (extent * DEPTH_RATIO).max(MIN_DEPTH_THRESHOLD)
}

/// A recessed vertex and the side it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSample {
    /// The vertex.
    pub sample: VertexSample,
    /// Its side relative to the mesh's local box center.
    pub side: Side,
}

/// Result of probing one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthProbe {
    /// Mesh node probed.
    pub mesh: NodeId,
    /// Projection of the frontmost vertex onto the local probe direction.
    pub front: f64,
    /// Depth a vertex must exceed to count as recessed.
    pub threshold: f64,
    /// Recessed vertices, in buffer order.
    pub samples: Vec<DepthSample>,
}

/// Result of probing every mesh under a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthDetection {
    /// One probe per mesh with vertices.
    pub probes: Vec<DepthProbe>,
}

impl DepthDetection {
    /// All recessed samples across probes.
    pub fn samples(&self) -> impl Iterator<Item = &DepthSample> + '_ {
        self.probes.iter().flat_map(|p| p.samples.iter())
    }

    /// Number of recessed samples.
    pub fn len(&self) -> usize {
        self.probes.iter().map(|p| p.samples.len()).sum()
    }

    /// True when no vertex is recessed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recessed samples on one side.
    pub fn count(&self, side: Side) -> usize {
        self.samples().filter(|s| s.side == side).count()
    }
}

/// Vertices lying deeper than the depth threshold behind the frontmost
/// face along `face_direction`.
///
/// The direction is interpreted in each mesh's local frame. The
/// threshold is [`DEPTH_RATIO`] of the mesh's extent along that direction,
/// floored at [`MIN_DEPTH_THRESHOLD`], so a flat mesh yields no samples
/// instead of dividing by zero.
pub fn detect_by_depth_threshold(
    scene: &SceneGraph,
    node: NodeId,
    face_direction: &Vec3,
) -> DepthDetection {
    let Some(dir) = face_direction.try_normalize(1e-12) else {
        return DepthDetection::default();
    };
    let (dominant, _) = Axis::dominant(&dir);
    let secondary = dominant.secondary();

    let mut detection = DepthDetection::default();
    for view in mesh_views(scene, node) {
        let geometry = view.geometry;
        let bounds = geometry.local_aabb();
        let center = bounds.center()[secondary.index()];
        let depths: Vec<(u32, f64)> = (0..geometry.num_vertices() as u32)
            .filter_map(|i| geometry.position(i).map(|p| (i, p.coords.dot(&dir))))
            .collect();
        let front = depths.iter().map(|&(_, d)| d).fold(f64::NEG_INFINITY, f64::max);
        let back = depths.iter().map(|&(_, d)| d).fold(f64::INFINITY, f64::min);
        let threshold = depth_threshold(front - back);

        let normals = geometry.normals_or_computed();
        let samples = depths
            .iter()
            .filter(|&&(_, d)| front - d > threshold)
            .filter_map(|&(i, _)| {
                let local = geometry.position(i)?;
                let sample = view.sample(i, &normals)?;
                Some(DepthSample {
                    sample,
                    side: classify_side(local[secondary.index()], center),
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "depth probe on {}: front {front:.4}, threshold {threshold:.4}, {} recessed",
            scene.name_of(view.id),
            samples.len()
        );
        detection.probes.push(DepthProbe {
            mesh: view.id,
            front,
            threshold,
            samples,
        });
    }
    detection
}

/// Extent of a box along an arbitrary direction.
pub fn extent_along(bounds: &Aabb3, dir: &Vec3) -> f64 {
    let projections = bounds.corners().map(|c| c.coords.dot(dir));
    let max = projections.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = projections.iter().copied().fold(f64::INFINITY, f64::min);
    (max - min).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use snapfit_math::Point3;
    use snapfit_scene::{MeshGeometry, SceneNode};

    fn scene_with(mesh: MeshGeometry) -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let id = scene
            .add_child(scene.root(), SceneNode::new("Panel").with_geometry(mesh))
            .unwrap();
        (scene, id)
    }

    #[test]
    fn test_back_vertices_are_recessed() {
        let (scene, id) = scene_with(MeshGeometry::cuboid(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 1.0),
        ));
        let detection = detect_by_depth_threshold(&scene, id, &Vec3::z());
        assert_eq!(detection.probes.len(), 1);
        assert_abs_diff_eq!(detection.probes[0].front, 1.0);
        assert_abs_diff_eq!(detection.probes[0].threshold, 0.1, epsilon = 1e-12);
        // Every vertex at z = 0: four on the back face and two on each side.
        assert_eq!(detection.len(), 12);
        assert!(detection.samples().all(|s| s.sample.position.z == 0.0));
        // Z probe classifies on X around the center x = 1.
        assert_eq!(detection.count(Side::Left), 6);
        assert_eq!(detection.count(Side::Right), 6);
    }

    #[test]
    fn test_flat_mesh_uses_floor() {
        let quad = MeshGeometry::quad([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        let (scene, id) = scene_with(quad);
        let detection = detect_by_depth_threshold(&scene, id, &Vec3::z());
        assert_abs_diff_eq!(detection.probes[0].threshold, MIN_DEPTH_THRESHOLD);
        assert!(detection.is_empty());
    }

    #[test]
    fn test_no_geometry_is_empty() {
        let mut scene = SceneGraph::new();
        let id = scene.add_child(scene.root(), SceneNode::new("Group")).unwrap();
        assert!(detect_by_depth_threshold(&scene, id, &Vec3::z()).probes.is_empty());
    }

    #[test]
    fn test_tie_falls_right() {
        assert_eq!(classify_side(1.0, 1.0), Side::Right);
        assert_eq!(classify_side(0.999, 1.0), Side::Left);
    }

    #[test]
    fn test_extent_along_diagonal() {
        let b = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 0.0));
        let d = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_abs_diff_eq!(extent_along(&b, &d), 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(depth_threshold(0.0), MIN_DEPTH_THRESHOLD);
    }
}
