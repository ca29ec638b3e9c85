//! Persistable local state
//!
//! A snapshot holds only what is set through the graph's setters: names,
//! local transforms, hints, local lights and geometry data, recursively.
//! Cached world state is never stored; restoring yields a subtree with every
//! refresh flag set. Controls and batches are runtime state and are not
//! persisted.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::{SceneError, SceneResult};
use super::hints::{BatchHint, Bucket, CullHint, ShadowMode};
use super::spatial::{BatchState, SpatialId, SpatialKind};
use super::SceneGraph;
use crate::config::ConfigError;
use crate::foundation::math::Transform;
use crate::light::LightList;
use crate::render::{Material, Mesh};

/// Node or geometry specific part of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// Node with its children in order
    Node {
        /// Child snapshots
        children: Vec<SpatialSnapshot>,
    },
    /// Geometry with its render data
    Geometry {
        /// Mesh data
        mesh: Mesh,
        /// Material description
        material: Material,
        /// Whether world transforms are ignored
        ignore_transform: bool,
    },
}

/// Local state of a spatial and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialSnapshot {
    /// Display name
    pub name: String,
    /// Transform relative to the parent
    pub local_transform: Transform,
    /// Local lights
    pub lights: LightList,
    /// Cull hint as set
    pub cull_hint: CullHint,
    /// Batch hint as set
    pub batch_hint: BatchHint,
    /// Queue bucket as set
    pub queue_bucket: Bucket,
    /// Shadow mode as set
    pub shadow_mode: ShadowMode,
    /// Kind specific data
    pub kind: SnapshotKind,
}

impl SpatialSnapshot {
    /// Serialize as pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Parse from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Every transform in the subtree must have a nonzero scale
    pub fn validate(&self) -> SceneResult<()> {
        if !self.local_transform.has_valid_scale() {
            return Err(SceneError::InvalidArgument(format!(
                "snapshot of '{}' has zero scale {:?}",
                self.name, self.local_transform.scale
            )));
        }
        if let SnapshotKind::Node { children } = &self.kind {
            for child in children {
                child.validate()?;
            }
        }
        Ok(())
    }

    /// Number of spatials in the snapshot
    pub fn spatial_count(&self) -> usize {
        match &self.kind {
            SnapshotKind::Node { children } => {
                1 + children.iter().map(SpatialSnapshot::spatial_count).sum::<usize>()
            }
            SnapshotKind::Geometry { .. } => 1,
        }
    }
}

impl SceneGraph {
    /// Capture the local state of `id` and its subtree. Generated batch
    /// geometry is skipped.
    pub fn snapshot(&self, id: SpatialId) -> SceneResult<SpatialSnapshot> {
        let spatial = self.spatial(id)?;
        let kind = match &spatial.kind {
            SpatialKind::Node(node) => {
                let mut children = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    if let BatchState::Generated { .. } = self.spatial(*child)?.batch_state() {
                        continue;
                    }
                    children.push(self.snapshot(*child)?);
                }
                SnapshotKind::Node { children }
            }
            SpatialKind::Geometry(geometry) => SnapshotKind::Geometry {
                mesh: geometry.mesh.as_ref().clone(),
                material: geometry.material.as_ref().clone(),
                ignore_transform: geometry.ignore_transform,
            },
        };

        Ok(SpatialSnapshot {
            name: spatial.name.clone(),
            local_transform: spatial.local_transform,
            lights: spatial.local_lights.clone(),
            cull_hint: spatial.cull_hint,
            batch_hint: spatial.batch_hint,
            queue_bucket: spatial.queue_bucket,
            shadow_mode: spatial.shadow_mode,
            kind,
        })
    }

    /// Build a new detached subtree from a snapshot
    pub fn restore(&mut self, snapshot: &SpatialSnapshot) -> SceneResult<SpatialId> {
        snapshot.validate()?;
        let root = self.restore_subtree(snapshot)?;
        debug!(
            "Restored '{}' ({} spatials)",
            snapshot.name,
            snapshot.spatial_count()
        );
        Ok(root)
    }

    fn restore_subtree(&mut self, snapshot: &SpatialSnapshot) -> SceneResult<SpatialId> {
        let id = match &snapshot.kind {
            SnapshotKind::Node { .. } => self.create_node(snapshot.name.clone()),
            SnapshotKind::Geometry {
                mesh,
                material,
                ignore_transform,
            } => {
                let id = self.create_geometry(
                    snapshot.name.clone(),
                    mesh.clone(),
                    Arc::new(material.clone()),
                );
                if *ignore_transform {
                    self.set_ignore_transform(id, true)?;
                }
                id
            }
        };

        self.set_local_transform(id, snapshot.local_transform)?;
        let spatial = self.spatial_mut(id)?;
        spatial.local_lights = snapshot.lights.clone();
        spatial.cull_hint = snapshot.cull_hint;
        spatial.batch_hint = snapshot.batch_hint;
        spatial.queue_bucket = snapshot.queue_bucket;
        spatial.shadow_mode = snapshot.shadow_mode;

        if let SnapshotKind::Node { children } = &snapshot.kind {
            for child in children {
                let child_id = self.restore_subtree(child)?;
                self.attach_child(id, child_id)?;
            }
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::light::Light;
    use crate::scene::RefreshFlags;

    #[test]
    fn test_snapshot_round_trip_through_ron() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let lamp = graph.create_node("lamp");
        let cube = graph.create_geometry("cube", Mesh::cube(1.0), Arc::new(Material::new("grey")));
        graph.attach_child(root, lamp).unwrap();
        graph.attach_child(lamp, cube).unwrap();
        graph.set_local_translation(lamp, Vec3::new(0.0, 4.0, 0.0)).unwrap();
        graph
            .add_light(lamp, Light::point("bulb", Vec3::new(0.0, 4.0, 0.0), 3.0, Vec3::repeat(1.0)))
            .unwrap();
        graph.set_queue_bucket(cube, Bucket::Transparent).unwrap();

        let snapshot = graph.snapshot(root).unwrap();
        let text = snapshot.to_ron().unwrap();
        let parsed = SpatialSnapshot::from_ron(&text).unwrap();

        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.spatial_count(), 3);
    }

    #[test]
    fn test_restore_builds_dirty_detached_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let child = graph.create_node("child");
        graph.attach_child(root, child).unwrap();
        graph.set_local_translation(child, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        graph.update_geometric_state(root).unwrap();

        let snapshot = graph.snapshot(root).unwrap();
        let restored = graph.restore(&snapshot).unwrap();
        let restored_child = graph.children(restored).unwrap()[0];

        assert_eq!(graph.parent(restored).unwrap(), None);
        assert_eq!(graph.get(restored_child).unwrap().refresh_flags(), RefreshFlags::all());
        assert_eq!(graph.get(restored_child).unwrap().name(), "child");
    }

    #[test]
    fn test_restore_rejects_zero_scale() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let mut snapshot = graph.snapshot(root).unwrap();
        snapshot.local_transform.scale = Vec3::new(1.0, 0.0, 1.0);

        assert!(matches!(graph.restore(&snapshot), Err(SceneError::InvalidArgument(_))));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_from_ron_rejects_garbage() {
        assert!(matches!(SpatialSnapshot::from_ron("not ron"), Err(ConfigError::Parse(_))));
    }
}
