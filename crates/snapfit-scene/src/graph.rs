//! Arena-backed scene graph.
//!
//! Nodes live in a [`SlotMap`] and refer to each other by [`NodeId`].
//! World transforms are derived on demand by walking the parent chain, so
//! a query always reflects the current local transforms of every ancestor.

use serde::Serialize;
use slotmap::{new_key_type, Key, SlotMap};
use snapfit_math::{Aabb3, Point3, Quat, Transform, Vec3};

use crate::debug::DebugPrimitive;
use crate::error::{Result, SceneError};
use crate::mesh::MeshGeometry;

new_key_type! {
    /// Handle to a node in a [`SceneGraph`].
    pub struct NodeId;
}

impl NodeId {
    /// Stable integer form of the handle, unique within one graph.
    pub fn as_u64(self) -> u64 {
        self.data().as_ffi()
    }
}

/// Position, rotation and scale of a node relative to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTransform {
    /// Translation.
    pub position: Vec3,
    /// Rotation.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl LocalTransform {
    /// Pure translation.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// The equivalent 4x4 matrix.
    pub fn to_transform(&self) -> Transform {
        Transform::from_trs(&self.position, &self.rotation, &self.scale)
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }
}

/// What a node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Transform-only grouping node.
    Group,
    /// Node with renderable geometry.
    Mesh,
    /// Transient debug-visualization overlay.
    Debug,
}

/// A single node of the scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Name used for lookups.
    pub name: String,
    /// Transform relative to the parent.
    pub transform: LocalTransform,
    /// Mesh buffers, if this is a mesh node.
    pub geometry: Option<MeshGeometry>,
    /// Overlay primitive, if this is a debug node.
    pub overlay: Option<DebugPrimitive>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// A group node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: LocalTransform::default(),
            geometry: None,
            overlay: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Attach mesh buffers.
    pub fn with_geometry(mut self, geometry: MeshGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set the local position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the local transform.
    pub fn with_transform(mut self, transform: LocalTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Attach a debug overlay primitive.
    pub fn with_overlay(mut self, overlay: DebugPrimitive) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Parent handle (`None` for the root).
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ordered children.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// What this node carries.
    pub fn kind(&self) -> NodeKind {
        if self.overlay.is_some() {
            NodeKind::Debug
        } else if self.geometry.is_some() {
            NodeKind::Mesh
        } else {
            NodeKind::Group
        }
    }
}

/// Serializable outline of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    /// Node name.
    pub name: String,
    /// Node kind.
    pub kind: NodeKind,
    /// Child outlines in order.
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A tree of named nodes rooted at a single group node.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    root: NodeId,
}

impl SceneGraph {
    /// An empty scene with a root group named `"Scene"`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new("Scene"));
        Self { nodes, root }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// True if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Name of a node, or `"<missing>"`.
    pub fn name_of(&self, id: NodeId) -> &str {
        self.nodes.get(id).map_or("<missing>", |n| n.name.as_str())
    }

    /// Append `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::MissingNode(format!("{parent:?}")));
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Detach and drop a node together with its descendants.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(SceneError::CannotRemoveRoot);
        }
        let parent = self
            .nodes
            .get(id)
            .ok_or_else(|| SceneError::MissingNode(format!("{id:?}")))?
            .parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != id);
        }
        for victim in self.descendants(id) {
            self.nodes.remove(victim);
        }
        Ok(())
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// First node named `name` in pre-order from the root.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.find_in(self.root, name)
    }

    /// First node named `name` in pre-order from `start`.
    pub fn find_in(&self, start: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(start)
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }

    /// Mesh nodes in the subtree of `id` (overlays excluded), pre-order.
    pub fn mesh_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.nodes[n].kind() == NodeKind::Mesh)
            .collect()
    }

    /// Local position of a node.
    pub fn local_position(&self, id: NodeId) -> Option<Vec3> {
        self.nodes.get(id).map(|n| n.transform.position)
    }

    /// Overwrite the local position of a node.
    pub fn set_local_position(&mut self, id: NodeId, position: Vec3) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| SceneError::MissingNode(format!("{id:?}")))?;
        node.transform.position = position;
        Ok(())
    }

    /// Local-to-world transform of a node (identity for a missing node).
    pub fn world_transform(&self, id: NodeId) -> Transform {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current.and_then(|c| self.nodes.get(c)) {
            chain.push(n.transform.to_transform());
            current = n.parent;
        }
        chain
            .iter()
            .rev()
            .fold(Transform::identity(), |acc, t| acc.then(t))
    }

    /// World transform of the parent (identity for the root).
    pub fn parent_world_transform(&self, id: NodeId) -> Transform {
        match self.nodes.get(id).and_then(|n| n.parent) {
            Some(parent) => self.world_transform(parent),
            None => Transform::identity(),
        }
    }

    /// World-space origin of a node.
    pub fn world_position(&self, id: NodeId) -> Point3 {
        self.world_transform(id).apply_point(&Point3::origin())
    }

    /// Accumulated rotation of a node and its ancestors.
    pub fn world_rotation(&self, id: NodeId) -> Quat {
        let mut rotation = Quat::identity();
        let mut current = Some(id);
        while let Some(n) = current.and_then(|c| self.nodes.get(c)) {
            rotation = n.transform.rotation * rotation;
            current = n.parent;
        }
        rotation
    }

    /// Accumulated per-axis scale (exact for unrotated chains).
    pub fn world_scale(&self, id: NodeId) -> Vec3 {
        let mut scale = Vec3::repeat(1.0);
        let mut current = Some(id);
        while let Some(n) = current.and_then(|c| self.nodes.get(c)) {
            scale.component_mul_assign(&n.transform.scale);
            current = n.parent;
        }
        scale
    }

    /// Bounding box of a mesh node's own buffers, in its local frame.
    pub fn local_bounding_box(&self, id: NodeId) -> Option<Aabb3> {
        let aabb = self.nodes.get(id)?.geometry.as_ref()?.local_aabb();
        (!aabb.is_empty()).then_some(aabb)
    }

    /// World-space box around every mesh in the subtree of `id`.
    pub fn world_bounding_box(&self, id: NodeId) -> Option<Aabb3> {
        let mut aabb = Aabb3::empty();
        for mesh in self.mesh_nodes(id) {
            if let Some(local) = self.local_bounding_box(mesh) {
                aabb.union(&local.transformed(&self.world_transform(mesh)));
            }
        }
        (!aabb.is_empty()).then_some(aabb)
    }

    /// Like [`world_bounding_box`](Self::world_bounding_box), but a subtree
    /// without geometry yields a unit box around the node's world origin.
    pub fn focus_bounding_box(&self, id: NodeId) -> Aabb3 {
        self.world_bounding_box(id).unwrap_or_else(|| {
            Aabb3::from_center_size(&self.world_position(id), &Vec3::repeat(1.0))
        })
    }

    /// Outline of the subtree of `id`.
    pub fn hierarchy(&self, id: NodeId) -> Option<HierarchyNode> {
        let node = self.nodes.get(id)?;
        Some(HierarchyNode {
            name: node.name.clone(),
            kind: node.kind(),
            children: node
                .children
                .iter()
                .filter_map(|&c| self.hierarchy(c))
                .collect(),
        })
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn cube_node(name: &str, at: Vec3) -> SceneNode {
        SceneNode::new(name)
            .with_position(at)
            .with_geometry(MeshGeometry::cuboid(
                Point3::new(-0.5, -0.5, -0.5),
                Point3::new(0.5, 0.5, 0.5),
            ))
    }

    #[test]
    fn test_find_by_name_is_preorder() {
        let mut scene = SceneGraph::new();
        let a = scene.add_child(scene.root(), SceneNode::new("A")).unwrap();
        let dup_deep = scene.add_child(a, SceneNode::new("Dup")).unwrap();
        let _dup_shallow = scene.add_child(scene.root(), SceneNode::new("Dup")).unwrap();
        assert_eq!(scene.find_by_name("Dup"), Some(dup_deep));
        assert_eq!(scene.find_by_name("Nope"), None);
    }

    #[test]
    fn test_world_position_follows_parent_chain() {
        let mut scene = SceneGraph::new();
        let mut parent = SceneNode::new("Parent").with_position(Vec3::new(10.0, 0.0, 0.0));
        parent.transform.rotation = Quat::from_axis_angle(&Vec3::z_axis(), PI / 2.0);
        let p = scene.add_child(scene.root(), parent).unwrap();
        let c = scene
            .add_child(p, SceneNode::new("Child").with_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let world = scene.world_position(c);
        assert_abs_diff_eq!(world, Point3::new(10.0, 1.0, 0.0), epsilon = 1e-12);

        // moving the parent moves the child on the next query
        scene.set_local_position(p, Vec3::zeros()).unwrap();
        assert_abs_diff_eq!(scene.world_position(c), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_world_bounding_box_unions_meshes() {
        let mut scene = SceneGraph::new();
        let g = scene.add_child(scene.root(), SceneNode::new("Group")).unwrap();
        scene.add_child(g, cube_node("A", Vec3::new(-2.0, 0.0, 0.0))).unwrap();
        scene.add_child(g, cube_node("B", Vec3::new(2.0, 0.0, 0.0))).unwrap();
        let aabb = scene.world_bounding_box(g).unwrap();
        assert_abs_diff_eq!(aabb.min, Point3::new(-2.5, -0.5, -0.5), epsilon = 1e-6);
        assert_abs_diff_eq!(aabb.max, Point3::new(2.5, 0.5, 0.5), epsilon = 1e-6);
    }

    #[test]
    fn test_focus_box_falls_back_to_unit_box() {
        let mut scene = SceneGraph::new();
        let empty = scene
            .add_child(scene.root(), SceneNode::new("Empty").with_position(Vec3::new(3.0, 0.0, 0.0)))
            .unwrap();
        assert!(scene.world_bounding_box(empty).is_none());
        let focus = scene.focus_bounding_box(empty);
        assert_abs_diff_eq!(focus.center(), Point3::new(3.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(focus.size(), Vec3::repeat(1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_remove_subtree() {
        let mut scene = SceneGraph::new();
        let a = scene.add_child(scene.root(), SceneNode::new("A")).unwrap();
        let b = scene.add_child(a, SceneNode::new("B")).unwrap();
        assert_eq!(scene.len(), 3);
        scene.remove_subtree(a).unwrap();
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains(b));
        assert!(scene.node(scene.root()).unwrap().children().is_empty());
        assert!(matches!(
            scene.remove_subtree(scene.root()),
            Err(SceneError::CannotRemoveRoot)
        ));
    }

    #[test]
    fn test_hierarchy_snapshot() {
        let mut scene = SceneGraph::new();
        let door = scene.add_child(scene.root(), SceneNode::new("Door")).unwrap();
        scene.add_child(door, cube_node("Damper", Vec3::zeros())).unwrap();
        let h = scene.hierarchy(scene.root()).unwrap();
        assert_eq!(h.children[0].name, "Door");
        assert_eq!(h.children[0].children[0].kind, NodeKind::Mesh);
        let json = h.to_json_pretty().unwrap();
        assert!(json.contains("\"kind\": \"mesh\""));
    }
}
