//! Scene graph errors
//!
//! Every variant is a contract violation by the caller: the graph refuses the
//! operation instead of rendering or resolving stale data.

use thiserror::Error;

use super::{RefreshFlags, SpatialId};

/// Errors returned by [`super::SceneGraph`] operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The id does not refer to a live spatial
    #[error("Unknown spatial: {0:?}")]
    UnknownSpatial(SpatialId),

    /// Culling or render submission was attempted while refresh flags remain
    #[error("Scene graph not updated before render: '{name}' has pending {flags:?}")]
    SceneNotUpdated {
        /// Offending spatial
        name: String,
        /// Flags that were still set
        flags: RefreshFlags,
    },

    /// A world light list was resolved before its parent's
    #[error("Parent light list of '{0}' is still pending update")]
    ParentLightListDirty(String),

    /// A full geometric update was requested on an attached spatial
    #[error("'{0}' has a parent; geometric state updates must start at a root")]
    NotRoot(String),

    /// Mesh, material or structure of batched geometry was changed directly
    #[error("'{0}' is part of a batch and can only be changed through its batch owner")]
    BatchedGeometry(String),

    /// A batch operation targeted a node that owns no batch
    #[error("'{0}' does not own any batch")]
    NotBatchOwner(String),

    /// Attaching a child that is attached elsewhere
    #[error("'{child}' already has parent '{parent}'")]
    AlreadyHasParent {
        /// Child being attached
        child: String,
        /// Its current parent
        parent: String,
    },

    /// Attaching a spatial below itself
    #[error("Attaching '{child}' under '{parent}' would create a cycle")]
    CycleDetected {
        /// Child being attached
        child: String,
        /// Requested parent, a descendant of the child
        parent: String,
    },

    /// A node-only operation targeted a geometry
    #[error("'{0}' is not a node")]
    NotANode(String),

    /// A geometry-only operation targeted a node
    #[error("'{0}' is not a geometry")]
    NotAGeometry(String),

    /// Invalid input such as a zero scale component or an index out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Refresh flags survived a full geometric update
    #[error("'{name}' still has {flags:?} pending after a full update")]
    IncompleteUpdate {
        /// Offending spatial
        name: String,
        /// Flags that were still set
        flags: RefreshFlags,
    },
}

/// Result alias for scene graph operations
pub type SceneResult<T> = Result<T, SceneError>;
