//! JSON scene descriptions.
//!
//! A host-side stand-in for asset import: a nested list of named nodes
//! with transforms and optional mesh buffers.

use serde::{Deserialize, Serialize};
use snapfit_math::{vec3_from_array, Quat};

use crate::error::{Result, SceneError};
use crate::graph::{LocalTransform, NodeId, SceneGraph, SceneNode};
use crate::mesh::MeshGeometry;

/// Top-level scene description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Nodes attached directly under the scene root.
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}

/// One node of a scene description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Node name.
    pub name: String,
    /// Local translation.
    #[serde(default)]
    pub position: [f64; 3],
    /// Local rotation as XYZ Euler angles in degrees.
    #[serde(default)]
    pub rotation: [f64; 3],
    /// Local scale.
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    /// Mesh buffers.
    #[serde(default)]
    pub mesh: Option<MeshGeometry>,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl SceneDescription {
    /// Parse a JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a scene graph from the description.
    pub fn build(&self) -> Result<SceneGraph> {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        for node in &self.nodes {
            insert(&mut scene, root, node)?;
        }
        Ok(scene)
    }
}

fn insert(scene: &mut SceneGraph, parent: NodeId, desc: &NodeDescription) -> Result<()> {
    if let Some(mesh) = &desc.mesh {
        if mesh.positions.len() % 3 != 0 {
            return Err(SceneError::InvalidMesh {
                name: desc.name.clone(),
                reason: format!("{} position floats is not a multiple of 3", mesh.positions.len()),
            });
        }
    }
    let [rx, ry, rz] = desc.rotation.map(f64::to_radians);
    let transform = LocalTransform {
        position: vec3_from_array(desc.position),
        rotation: Quat::from_euler_angles(rx, ry, rz),
        scale: vec3_from_array(desc.scale),
    };
    let mut node = SceneNode::new(desc.name.clone()).with_transform(transform);
    node.geometry = desc.mesh.clone();
    let id = scene.add_child(parent, node)?;
    for child in &desc.children {
        insert(scene, id, child)?;
    }
    Ok(())
}
