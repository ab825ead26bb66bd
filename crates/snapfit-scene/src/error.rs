//! Error types for scene graph operations.

use thiserror::Error;

/// Errors that can occur while editing or loading a scene graph.
#[derive(Error, Debug)]
pub enum SceneError {
    /// A node handle does not refer to a live node.
    #[error("node not found: {0}")]
    MissingNode(String),

    /// The scene root cannot be removed or re-parented.
    #[error("the scene root cannot be removed")]
    CannotRemoveRoot,

    /// Mesh buffers are inconsistent.
    #[error("invalid mesh for {name}: {reason}")]
    InvalidMesh {
        /// Node name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Scene description could not be parsed.
    #[error("scene description parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
