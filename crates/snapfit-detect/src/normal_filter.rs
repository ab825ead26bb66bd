//! Orientation-based vertex filtering.
//!
//! Used for hole detection: the receiving walls of a groove share an
//! orientation, so the faces roughly parallel (or anti-parallel) to a
//! configured direction mark where the plug goes.

use std::collections::HashSet;

use snapfit_math::Vec3;
use snapfit_scene::{NodeId, SceneGraph};

use crate::cluster::{cluster_samples, Cluster};
use crate::sample::{mesh_views, VertexSample};

/// Vertices of every triangle under `node` whose representative normal is
/// aligned with `target_normal`.
///
/// The representative normal of a triangle is the average of its three
/// vertex normals, rotated into world space. A triangle is kept when
/// `|dot(n, target)| > 1 - tolerance`, so a face and its back both pass.
/// Meshes without a normal buffer get smooth normals synthesized on the
/// fly. Each vertex is reported once, in order of first appearance.
pub fn detect_by_normal_filter(
    scene: &SceneGraph,
    node: NodeId,
    target_normal: &Vec3,
    tolerance: f64,
) -> Vec<VertexSample> {
    let Some(target) = target_normal.try_normalize(1e-12) else {
        tracing::debug!("normal filter called with a zero direction");
        return Vec::new();
    };
    let cutoff = 1.0 - tolerance;

    let mut samples = Vec::new();
    for view in mesh_views(scene, node) {
        let normals = view.geometry.normals_or_computed();
        let mut seen = HashSet::new();
        for tri in view.geometry.triangles() {
            let Some(avg) = average_normal(&normals, tri) else {
                continue;
            };
            let Some(world) = (view.rotation * avg).try_normalize(1e-12) else {
                continue;
            };
            if world.dot(&target).abs() <= cutoff {
                continue;
            }
            for index in tri {
                if seen.insert(index) {
                    samples.extend(view.sample(index, &normals));
                }
            }
        }
    }

    tracing::debug!(
        "normal filter on {} kept {} vertices",
        scene.name_of(node),
        samples.len()
    );
    samples
}

fn average_normal(normals: &[f32], tri: [u32; 3]) -> Option<Vec3> {
    let mut sum = Vec3::zeros();
    for i in tri {
        sum += snapfit_scene::read_vec3(normals, i)?;
    }
    Some(sum / 3.0)
}

/// Candidate holes: normal-filtered vertices grouped into clusters.
pub fn detect_holes(
    scene: &SceneGraph,
    node: NodeId,
    target_normal: &Vec3,
    tolerance: f64,
    cluster_distance: f64,
) -> Vec<Cluster> {
    let samples = detect_by_normal_filter(scene, node, target_normal, tolerance);
    cluster_samples(&samples, cluster_distance)
}
