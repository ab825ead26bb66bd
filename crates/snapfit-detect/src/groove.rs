//! Inner-bound groove edges and camera-facing faces.
//!
//! Both feed the highlight overlays rather than the resolver.

use snapfit_math::{Aabb3, Axis, Point3, Vec3};
use snapfit_scene::{NodeId, SceneGraph};

use crate::edges::feature_edges;
use crate::sample::mesh_views;

/// Dihedral angle used to outline grooves.
pub const GROOVE_EDGE_ANGLE: f64 = 25.0;

/// Minimum facing score for [`detect_facing_faces`].
pub const FACING_THRESHOLD: f64 = 0.1;

/// The central window of a local box used to look for grooves.
///
/// On the two axes other than `up` it spans `inner_ratio` of the box
/// around the center. On `up` it covers the upper half.
pub fn inner_window(bounds: &Aabb3, inner_ratio: f64, up: Axis) -> Aabb3 {
    let center = bounds.center();
    let size = bounds.size();
    let mut min = center;
    let mut max = center;
    for axis in Axis::ALL {
        let i = axis.index();
        if axis == up {
            max[i] = bounds.max[i];
        } else {
            min[i] = center[i] - size[i] * inner_ratio / 2.0;
            max[i] = center[i] + size[i] * inner_ratio / 2.0;
        }
    }
    Aabb3::new(min, max)
}

fn in_window(p: &Point3, center: &Point3, size: &Vec3, inner_ratio: f64, up: Axis) -> bool {
    Axis::ALL.iter().all(|&axis| {
        let i = axis.index();
        if axis == up {
            p[i] > center[i]
        } else {
            (p[i] - center[i]).abs() < size[i] * inner_ratio / 2.0
        }
    })
}

/// World-space feature edges whose first endpoint lies in the inner window
/// of its mesh's local box.
pub fn detect_inner_groove_edges(
    scene: &SceneGraph,
    node: NodeId,
    inner_ratio: f64,
    up: Axis,
) -> Vec<[Point3; 2]> {
    let mut segments = Vec::new();
    for view in mesh_views(scene, node) {
        let bounds = view.geometry.local_aabb();
        let (center, size) = (bounds.center(), bounds.size());
        for edge in feature_edges(view.geometry, GROOVE_EDGE_ANGLE) {
            let (Some(a), Some(b)) = (view.geometry.position(edge.a), view.geometry.position(edge.b))
            else {
                continue;
            };
            if in_window(&a, &center, &size, inner_ratio, up) {
                segments.push([view.world.apply_point(&a), view.world.apply_point(&b)]);
            }
        }
    }
    tracing::debug!("{} inner groove edges on {}", segments.len(), scene.name_of(node));
    segments
}

/// World-space triangles whose first-vertex normal faces against
/// `view_direction` by more than [`FACING_THRESHOLD`].
pub fn detect_facing_faces(
    scene: &SceneGraph,
    node: NodeId,
    view_direction: &Vec3,
) -> Vec<[Point3; 3]> {
    let Some(toward_camera) = view_direction.try_normalize(1e-12).map(|d| -d) else {
        return Vec::new();
    };
    let mut faces = Vec::new();
    for view in mesh_views(scene, node) {
        let normals = view.geometry.normals_or_computed();
        for tri in view.geometry.triangles() {
            let Some(sample) = view.sample(tri[0], &normals) else {
                continue;
            };
            if sample.normal.dot(&toward_camera) <= FACING_THRESHOLD {
                continue;
            }
            let corners = tri.map(|i| view.geometry.position(i).map(|p| view.world.apply_point(&p)));
            if let [Some(a), Some(b), Some(c)] = corners {
                faces.push([a, b, c]);
            }
        }
    }
    faces
}
