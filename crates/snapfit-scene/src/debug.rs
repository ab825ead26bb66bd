//! Debug-visualization overlays.
//!
//! Overlays are ordinary scene nodes carrying a [`DebugPrimitive`] and are
//! always attached directly under the scene root. They are added and
//! removed through a [`DebugVisualizer`] so a host can swap in
//! [`NoopVisualizer`] for production builds.

use std::cell::RefCell;
use std::rc::Rc;

use snapfit_math::{Aabb3, Point3};

use crate::graph::{NodeId, NodeKind, SceneGraph, SceneNode};

/// Scene graph shared between the services of one editor session.
pub type SharedScene = Rc<RefCell<SceneGraph>>;

/// Visualizer shared between the services of one editor session.
pub type SharedVisualizer = Rc<RefCell<dyn DebugVisualizer>>;

/// A renderable debug shape, in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugPrimitive {
    /// Connected line strip.
    Polyline {
        /// Vertices in drawing order.
        points: Vec<Point3>,
        /// RGB color.
        color: u32,
    },
    /// Independent line segments.
    LineSegments {
        /// Segment endpoints.
        segments: Vec<[Point3; 2]>,
        /// RGB color.
        color: u32,
    },
    /// Translucent box.
    Box {
        /// Box extent.
        bounds: Aabb3,
        /// RGB color.
        color: u32,
        /// Fill opacity.
        opacity: f32,
    },
    /// Point marker drawn as a small sphere.
    Marker {
        /// Marker center.
        position: Point3,
        /// Sphere radius.
        radius: f64,
        /// RGB color.
        color: u32,
    },
}

/// Adds and removes debug overlays.
pub trait DebugVisualizer {
    /// Attach an overlay under the scene root. Returns its node, or `None`
    /// when the visualizer discards overlays.
    fn add_debug_mesh(
        &mut self,
        scene: &mut SceneGraph,
        label: &str,
        primitive: DebugPrimitive,
    ) -> Option<NodeId>;

    /// Remove one overlay this visualizer added. Returns false if it was
    /// not tracked.
    fn remove(&mut self, scene: &mut SceneGraph, id: NodeId) -> bool;

    /// Remove every overlay this visualizer added. Safe to call repeatedly.
    fn clear_all(&mut self, scene: &mut SceneGraph) -> usize;

    /// Number of overlays currently tracked.
    fn active_count(&self) -> usize;
}

/// Visualizer that materializes overlays as scene nodes.
#[derive(Debug, Default)]
pub struct SceneDebugVisualizer {
    active: Vec<NodeId>,
}

impl SceneDebugVisualizer {
    /// A visualizer with no overlays.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DebugVisualizer for SceneDebugVisualizer {
    fn add_debug_mesh(
        &mut self,
        scene: &mut SceneGraph,
        label: &str,
        primitive: DebugPrimitive,
    ) -> Option<NodeId> {
        let node = SceneNode::new(label).with_overlay(primitive);
        match scene.add_child(scene.root(), node) {
            Ok(id) => {
                self.active.push(id);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("failed to attach debug overlay {label}: {e}");
                None
            }
        }
    }

    fn remove(&mut self, scene: &mut SceneGraph, id: NodeId) -> bool {
        let Some(pos) = self.active.iter().position(|&a| a == id) else {
            return false;
        };
        self.active.swap_remove(pos);
        if scene.contains(id) {
            if let Err(e) = scene.remove_subtree(id) {
                tracing::warn!("failed to detach debug overlay: {e}");
            }
        }
        true
    }

    fn clear_all(&mut self, scene: &mut SceneGraph) -> usize {
        let count = self.active.len();
        for id in self.active.drain(..) {
            if scene.contains(id) {
                if let Err(e) = scene.remove_subtree(id) {
                    tracing::warn!("failed to detach debug overlay: {e}");
                }
            }
        }
        if count > 0 {
            tracing::debug!("cleared {count} debug overlays");
        }
        count
    }

    fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Visualizer that drops every overlay.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisualizer;

impl DebugVisualizer for NoopVisualizer {
    fn add_debug_mesh(&mut self, _: &mut SceneGraph, _: &str, _: DebugPrimitive) -> Option<NodeId> {
        None
    }

    fn remove(&mut self, _: &mut SceneGraph, _: NodeId) -> bool {
        false
    }

    fn clear_all(&mut self, _: &mut SceneGraph) -> usize {
        0
    }

    fn active_count(&self) -> usize {
        0
    }
}

/// Overlays added for the duration of one operation.
///
/// Everything added through the session is removed when it is dropped,
/// whichever way the owning operation exits.
pub struct DebugSession {
    scene: SharedScene,
    visualizer: SharedVisualizer,
    nodes: Vec<NodeId>,
}

impl DebugSession {
    /// Open a session over a scene and visualizer.
    pub fn begin(scene: SharedScene, visualizer: SharedVisualizer) -> Self {
        Self {
            scene,
            visualizer,
            nodes: Vec::new(),
        }
    }

    /// Add an overlay owned by this session.
    pub fn add(&mut self, label: &str, primitive: DebugPrimitive) {
        let added = {
            let mut scene = self.scene.borrow_mut();
            self.visualizer
                .borrow_mut()
                .add_debug_mesh(&mut scene, label, primitive)
        };
        self.nodes.extend(added);
    }

    /// Number of overlays still owned by this session.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the session owns no overlays.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn release(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let (Ok(mut scene), Ok(mut vis)) =
            (self.scene.try_borrow_mut(), self.visualizer.try_borrow_mut())
        else {
            tracing::error!("debug session released while the scene is borrowed");
            return;
        };
        for id in self.nodes.drain(..) {
            vis.remove(&mut scene, id);
        }
    }
}

impl Drop for DebugSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Number of debug overlay nodes directly under the scene root.
pub fn overlay_count(scene: &SceneGraph) -> usize {
    scene
        .node(scene.root())
        .map(|root| {
            root.children()
                .iter()
                .filter(|&&c| scene.node(c).map(|n| n.kind()) == Some(NodeKind::Debug))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> DebugPrimitive {
        DebugPrimitive::Marker {
            position: Point3::origin(),
            radius: 0.1,
            color: 0xff0000,
        }
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let mut scene = SceneGraph::new();
        let mut vis = SceneDebugVisualizer::new();
        vis.add_debug_mesh(&mut scene, "a", marker());
        vis.add_debug_mesh(&mut scene, "b", marker());
        assert_eq!(overlay_count(&scene), 2);
        assert_eq!(vis.clear_all(&mut scene), 2);
        assert_eq!(overlay_count(&scene), 0);
        assert_eq!(vis.clear_all(&mut scene), 0);
        assert_eq!(overlay_count(&scene), 0);
    }

    #[test]
    fn test_clear_all_tolerates_overlays_removed_elsewhere() {
        let mut scene = SceneGraph::new();
        let mut vis = SceneDebugVisualizer::new();
        let gone = vis.add_debug_mesh(&mut scene, "a", marker()).unwrap();
        vis.add_debug_mesh(&mut scene, "b", marker());
        scene.remove_subtree(gone).unwrap();
        assert_eq!(overlay_count(&scene), 1);
        assert_eq!(vis.clear_all(&mut scene), 2);
        assert_eq!(overlay_count(&scene), 0);
        assert_eq!(vis.active_count(), 0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_noop_visualizer_adds_nothing() {
        let mut scene = SceneGraph::new();
        let mut vis = NoopVisualizer;
        assert!(vis.add_debug_mesh(&mut scene, "a", marker()).is_none());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_session_releases_on_drop() {
        let scene: SharedScene = Rc::new(RefCell::new(SceneGraph::new()));
        let vis: SharedVisualizer = Rc::new(RefCell::new(SceneDebugVisualizer::new()));
        {
            let mut session = DebugSession::begin(scene.clone(), vis.clone());
            session.add("path", marker());
            assert_eq!(overlay_count(&scene.borrow()), 1);
        }
        assert_eq!(overlay_count(&scene.borrow()), 0);
        assert_eq!(vis.borrow().active_count(), 0);
    }

    #[test]
    fn test_session_keeps_foreign_overlays() {
        let scene: SharedScene = Rc::new(RefCell::new(SceneGraph::new()));
        let vis: SharedVisualizer = Rc::new(RefCell::new(SceneDebugVisualizer::new()));
        vis.borrow_mut()
            .add_debug_mesh(&mut scene.borrow_mut(), "highlight", marker());
        {
            let mut session = DebugSession::begin(scene.clone(), vis.clone());
            session.add("path", marker());
        }
        assert_eq!(overlay_count(&scene.borrow()), 1);
    }
}
