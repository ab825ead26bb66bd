//! Plug detection by edge analysis.
//!
//! A plug is the part of a mesh that sticks out furthest along the
//! insertion direction. Its outline shows up as feature edges, so the
//! endpoints of those edges that sit in the leading band along the search
//! direction are taken as plug samples and clustered.

use std::collections::HashSet;

use snapfit_math::Vec3;
use snapfit_scene::{NodeId, SceneGraph};

use crate::cluster::{cluster_samples, Cluster};
use crate::depth::{depth_threshold, extent_along};
use crate::edges::{feature_edges, Welding};
use crate::sample::{mesh_views, VertexSample};

/// Feature-edge endpoints in the leading band along `search_direction`.
///
/// The direction is a world-space vector and is rotated into each mesh's
/// local frame. The band depth follows [`depth_threshold`] of the mesh's
/// extent along the direction. Coincident endpoints are reported once.
pub fn plug_samples_by_edge_analysis(
    scene: &SceneGraph,
    node: NodeId,
    search_direction: &Vec3,
    edge_angle_degrees: f64,
) -> Vec<VertexSample> {
    let Some(world_dir) = search_direction.try_normalize(1e-12) else {
        return Vec::new();
    };

    let mut samples = Vec::new();
    for view in mesh_views(scene, node) {
        let geometry = view.geometry;
        let dir = view.rotation.inverse() * world_dir;
        let band = depth_threshold(extent_along(&geometry.local_aabb(), &dir));

        let edges = feature_edges(geometry, edge_angle_degrees);
        let welding = Welding::new(geometry);
        let endpoints: Vec<(u32, f64)> = edges
            .iter()
            .flat_map(|e| [e.a, e.b])
            .filter_map(|i| geometry.position(i).map(|p| (i, p.coords.dot(&dir))))
            .collect();
        let Some(lead) = endpoints.iter().map(|&(_, d)| d).reduce(f64::max) else {
            continue;
        };

        let normals = geometry.normals_or_computed();
        let mut seen = HashSet::new();
        for &(i, d) in &endpoints {
            if d >= lead - band && seen.insert(welding.canonical(i)) {
                samples.extend(view.sample(i, &normals));
            }
        }
    }

    tracing::debug!(
        "edge analysis on {} found {} plug vertices",
        scene.name_of(node),
        samples.len()
    );
    samples
}

/// Candidate plugs: leading feature-edge endpoints grouped into clusters.
pub fn detect_plug_by_edge_analysis(
    scene: &SceneGraph,
    node: NodeId,
    search_direction: &Vec3,
    edge_angle_degrees: f64,
    cluster_distance: f64,
) -> Vec<Cluster> {
    let samples = plug_samples_by_edge_analysis(scene, node, search_direction, edge_angle_degrees);
    cluster_samples(&samples, cluster_distance)
}
