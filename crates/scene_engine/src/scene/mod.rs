//! Scene graph update core
//!
//! Spatials live in a [`SceneGraph`] arena and form a forest of nodes and
//! geometries. Local state changes mark cached world state stale; accessors
//! and [`SceneGraph::update_geometric_state`] recompute only what is stale.
//!
//! ## Frame flow
//!
//! ```text
//! update_logical_state(root, tpf)     controls mutate local state
//!      ↓
//! update_geometric_state(root)        transforms/lights down, bounds up
//!      ↓
//! collect_visible(root, viewport, q)  hierarchical culling, render queue
//! ```

mod batch;
mod clone;
mod control;
mod culling;
mod error;
mod geometry;
mod graph;
mod hints;
mod node;
mod resolve;
mod snapshot;
mod spatial;

#[cfg(test)]
mod tests;

pub use control::Control;
pub use error::{SceneError, SceneResult};
pub use graph::{GraphStats, SceneGraph};
pub use hints::{BatchHint, Bucket, CullHint, ShadowMode};
pub use node::{DfsMode, SceneGraphVisitor};
pub use snapshot::{SnapshotKind, SpatialSnapshot};
pub use spatial::{BatchState, GeometryData, NodeData, RefreshFlags, Spatial, SpatialId, SpatialKind};

pub use crate::render::FrustumIntersect;
