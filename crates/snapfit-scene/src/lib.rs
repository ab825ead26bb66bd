#![warn(missing_docs)]

//! In-memory scene graph for snapfit.
//!
//! The assembly and camera services only ever read the graph and rewrite
//! the local position of the nodes they animate. The one exception is
//! debug overlays, which are strictly additive and removed again through
//! a [`DebugVisualizer`].
//!
//! # Example
//!
//! ```
//! use snapfit_math::{Point3, Vec3};
//! use snapfit_scene::{MeshGeometry, SceneGraph, SceneNode};
//!
//! let mut scene = SceneGraph::new();
//! let cover = SceneNode::new("Door_Cover")
//!     .with_position(Vec3::new(0.0, 1.0, 0.0))
//!     .with_geometry(MeshGeometry::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0)));
//! let id = scene.add_child(scene.root(), cover).unwrap();
//! assert_eq!(scene.find_by_name("Door_Cover"), Some(id));
//! ```

pub mod debug;
pub mod description;
pub mod error;
pub mod graph;
pub mod mesh;

pub use debug::{
    overlay_count, DebugPrimitive, DebugSession, DebugVisualizer, NoopVisualizer,
    SceneDebugVisualizer, SharedScene, SharedVisualizer,
};
pub use description::{NodeDescription, SceneDescription};
pub use error::{Result, SceneError};
pub use graph::{HierarchyNode, LocalTransform, NodeId, NodeKind, SceneGraph, SceneNode};
pub use mesh::{read_vec3, MeshGeometry};
