//! # Scene Engine
//!
//! The update core of a retained-mode scene graph: a tree of nodes and
//! geometries whose world transforms, world bounds and world light lists are
//! derived from local state and recomputed lazily.
//!
//! ## Features
//!
//! - **Lazy propagation**: local edits only mark cached world state stale
//! - **Hierarchical culling**: frustum results are inherited down the tree
//! - **Controls**: per-spatial behaviors run each logical update
//! - **Batching**: merge geometries sharing a material into one draw
//! - **Persistence**: RON snapshots of local scene state, TOML/RON config
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut graph = SceneGraph::new();
//!     let root = graph.create_node("root");
//!     let ship = graph.create_node("ship");
//!     graph.attach_child(root, ship)?;
//!     graph.set_local_translation(ship, Vec3::new(0.0, 0.0, -10.0))?;
//!
//!     graph.update_logical_state(root, 1.0 / 60.0)?;
//!     graph.update_geometric_state(root)?;
//!
//!     let viewport = ViewPort::new("main", Camera::new(1280, 720));
//!     let mut queue = RenderQueue::new();
//!     graph.collect_visible(root, &viewport, &mut queue)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Configuration and shared utilities
pub mod config;
pub mod core;
pub mod foundation;

// Scene data
pub mod bounding;
pub mod light;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        bounding::{BoundingBox, BoundingSphere, BoundingVolume},
        core::{Config, ConfigError, EngineConfig, SceneConfig},
        foundation::math::{Mat4, Quat, Transform, Vec3},
        light::{Light, LightKind, LightList},
        render::{Camera, Culler, FrustumIntersect, Material, Mesh, RenderQueue, ViewPort},
        scene::{
            BatchHint, Bucket, Control, CullHint, SceneError, SceneGraph, SceneResult, ShadowMode,
            SpatialId, SpatialSnapshot,
        },
    };
}
