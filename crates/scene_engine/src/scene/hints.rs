//! Per-spatial hints that may defer to the parent via `Inherit`

use serde::{Deserialize, Serialize};

/// Controls how a spatial takes part in frustum culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullHint {
    /// Use the parent's hint (root falls back to the scene configuration)
    #[default]
    Inherit,
    /// Test the world bound against the camera frustum
    Dynamic,
    /// Always culled, together with the whole subtree
    Always,
    /// Never culled, the frustum test is skipped
    Never,
}

/// Whether a geometry may be merged into a batch by its batch owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BatchHint {
    /// Use the parent's hint
    #[default]
    Inherit,
    /// May be batched
    Always,
    /// Excluded from batching
    Never,
}

/// Render queue bucket a geometry is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Bucket {
    /// Use the parent's bucket
    #[default]
    Inherit,
    /// Opaque geometry, drawn front to back
    Opaque,
    /// Alpha blended geometry, drawn back to front
    Transparent,
    /// Drawn after transparent geometry, back to front
    Translucent,
    /// Drawn at maximum depth
    Sky,
    /// Screen space geometry; culled against the viewport rectangle
    Gui,
}

/// Shadow participation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowMode {
    /// Use the parent's mode
    #[default]
    Inherit,
    /// Neither casts nor receives
    Off,
    /// Casts shadows only
    Cast,
    /// Receives shadows only
    Receive,
    /// Casts and receives
    CastAndReceive,
}
