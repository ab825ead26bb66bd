//! Per-vertex samples produced by the detectors.

use snapfit_math::{Point3, Quat, Transform, Vec3};
use snapfit_scene::{read_vec3, MeshGeometry, NodeId, SceneGraph};

/// A vertex picked by a detector, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexSample {
    /// Mesh node the vertex belongs to.
    pub source: NodeId,
    /// Vertex index within the mesh buffers.
    pub index: u32,
    /// World-space position.
    pub position: Point3,
    /// World-space unit normal (zero if the vertex has none).
    pub normal: Vec3,
}

/// A mesh node together with everything needed to move its vertices to
/// world space.
pub(crate) struct MeshView<'a> {
    pub id: NodeId,
    pub geometry: &'a MeshGeometry,
    pub world: Transform,
    pub rotation: Quat,
}

impl MeshView<'_> {
    pub fn sample(&self, index: u32, normals: &[f32]) -> Option<VertexSample> {
        let local = self.geometry.position(index)?;
        let normal = read_vec3(normals, index)
            .map(|n| (self.rotation * n).try_normalize(1e-12).unwrap_or_else(Vec3::zeros))
            .unwrap_or_else(Vec3::zeros);
        Some(VertexSample {
            source: self.id,
            index,
            position: self.world.apply_point(&local),
            normal,
        })
    }
}

/// Mesh nodes under `node` that have at least one vertex.
pub(crate) fn mesh_views(scene: &SceneGraph, node: NodeId) -> Vec<MeshView<'_>> {
    scene
        .mesh_nodes(node)
        .into_iter()
        .filter_map(|id| {
            let geometry = scene.node(id)?.geometry.as_ref()?;
            if geometry.num_vertices() == 0 {
                tracing::debug!("mesh {} has no positions", scene.name_of(id));
                return None;
            }
            Some(MeshView {
                id,
                geometry,
                world: scene.world_transform(id),
                rotation: scene.world_rotation(id),
            })
        })
        .collect()
}
