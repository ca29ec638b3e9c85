//! Geometry batching
//!
//! A batch owner is a node that merges the meshes of its descendant
//! geometries into one generated geometry per shared material. Merged
//! positions are stored in the owner's model space, so moving the owner moves
//! the batch for free; moving a member rewrites its vertex range on the next
//! geometric update. Members stay in the tree (their transforms, bounds and
//! controls still work) but are no longer queued for rendering.

use std::sync::Arc;

use log::{debug, error, trace};

use super::error::{SceneError, SceneResult};
use super::hints::BatchHint;
use super::spatial::{BatchState, SpatialId};
use super::SceneGraph;
use crate::foundation::math::{Transform, Vec3};
use crate::render::{Material, Mesh};

/// One generated geometry and the members merged into it
#[derive(Debug, Clone)]
pub(crate) struct Batch {
    pub(crate) geometry: SpatialId,
    pub(crate) members: Vec<BatchMember>,
}

/// Where a member's vertices live inside the batch mesh
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchMember {
    pub(crate) geometry: SpatialId,
    pub(crate) first_vertex: usize,
}

fn to_owner_space(owner: &Transform, member: &Transform) -> impl Fn(&Vec3) -> Vec3 {
    let (owner, member) = (*owner, *member);
    move |position: &Vec3| owner.transform_inverse_vector(&member.transform_vector(position))
}

impl SceneGraph {
    /// Merge the batchable geometries below `owner` into one generated
    /// geometry per material, replacing any batches it already owns.
    /// Returns the number of batches created.
    pub fn batch(&mut self, owner: SpatialId) -> SceneResult<usize> {
        let owner_spatial = self.spatial(owner)?;
        if !owner_spatial.is_node() {
            return Err(SceneError::NotANode(owner_spatial.name.clone()));
        }
        if self.batches.contains_key(owner) {
            self.unbatch(owner)?;
        }

        let members = self.collect_batchable(owner)?;
        let mut groups: Vec<(Arc<Material>, Vec<SpatialId>)> = Vec::new();
        for member in members {
            let material = self.material(member)?;
            match groups.iter_mut().find(|(m, _)| Arc::ptr_eq(m, &material)) {
                Some((_, group)) => group.push(member),
                None => groups.push((material, vec![member])),
            }
        }

        let owner_world = self.world_transform(owner)?;
        let owner_name = self.name_of(owner);
        let mut batches = Vec::with_capacity(groups.len());
        for (index, (material, group)) in groups.into_iter().enumerate() {
            let mut merged = Mesh::empty();
            let mut entries = Vec::with_capacity(group.len());
            for member in &group {
                let member_world = self.world_transform(*member)?;
                let mesh = self.mesh(*member)?;
                let first_vertex = merged.append_mapped(&mesh, to_owner_space(&owner_world, &member_world));
                entries.push(BatchMember {
                    geometry: *member,
                    first_vertex,
                });
            }
            merged.update_bound();

            let geometry = self.create_geometry(format!("{owner_name}-batch{index}"), merged, material);
            self.set_batch_hint(geometry, BatchHint::Never)?;
            self.attach_child(owner, geometry)?;
            if let Some(data) = self.spatial_mut(geometry)?.geometry_mut() {
                data.batch = BatchState::Generated { owner };
            }
            for member in &group {
                if let Some(data) = self.spatial_mut(*member)?.geometry_mut() {
                    data.batch = BatchState::Member {
                        owner,
                        batch: geometry,
                    };
                }
            }
            debug!("Batched {} geometries into '{}'", group.len(), self.name_of(geometry));
            batches.push(Batch {
                geometry,
                members: entries,
            });
        }

        let count = batches.len();
        self.batches.insert(owner, batches);
        Ok(count)
    }

    /// Remove the generated batch geometries of `owner` and give the members
    /// back their own draw calls
    pub fn unbatch(&mut self, owner: SpatialId) -> SceneResult<()> {
        self.spatial(owner)?;
        let Some(batches) = self.batches.remove(owner) else {
            error!("'{}' has no batches to remove", self.name_of(owner));
            return Err(SceneError::NotBatchOwner(self.name_of(owner)));
        };

        for batch in batches {
            for member in &batch.members {
                if let Some(data) = self
                    .spatials
                    .get_mut(member.geometry)
                    .and_then(|spatial| spatial.geometry_mut())
                {
                    data.batch = BatchState::None;
                }
            }
            if let Some(data) = self
                .spatials
                .get_mut(batch.geometry)
                .and_then(|spatial| spatial.geometry_mut())
            {
                data.batch = BatchState::None;
            }
            if self.contains(batch.geometry) {
                self.remove(batch.geometry)?;
            }
        }
        self.pending_batch_sync.retain(|member, _| {
            self.spatials
                .get(member)
                .is_some_and(|spatial| matches!(spatial.batch_state(), BatchState::Member { .. }))
        });
        debug!("Removed batches of '{}'", self.name_of(owner));
        Ok(())
    }

    /// Number of batches `owner` currently holds
    pub fn batch_count(&self, owner: SpatialId) -> SceneResult<usize> {
        self.spatial(owner)?;
        Ok(self.batches.get(owner).map_or(0, Vec::len))
    }

    /// Generated batch geometries of `owner`
    pub fn batch_geometries(&self, owner: SpatialId) -> SceneResult<Vec<SpatialId>> {
        self.spatial(owner)?;
        let batches = self
            .batches
            .get(owner)
            .ok_or_else(|| SceneError::NotBatchOwner(self.name_of(owner)))?;
        Ok(batches.iter().map(|batch| batch.geometry).collect())
    }

    /// Unbatched geometries below `owner` whose batch hint allows merging
    fn collect_batchable(&self, owner: SpatialId) -> SceneResult<Vec<SpatialId>> {
        let mut found = Vec::new();
        let mut stack: Vec<SpatialId> = self.spatial(owner)?.children().iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let spatial = self.spatial(current)?;
            if spatial.is_geometry()
                && spatial.batch_state() == BatchState::None
                && self.effective_batch_hint(current)? != BatchHint::Never
            {
                found.push(current);
            }
            stack.extend(spatial.children().iter().rev());
        }
        Ok(found)
    }

    /// Rewrite the batch vertices of members that moved since the last sync
    pub(crate) fn sync_batches(&mut self) -> SceneResult<()> {
        if self.pending_batch_sync.is_empty() {
            return Ok(());
        }
        let pending: Vec<SpatialId> = self.pending_batch_sync.keys().collect();
        self.pending_batch_sync.clear();

        for member in pending {
            let Some(spatial) = self.spatials.get(member) else {
                continue;
            };
            let BatchState::Member { owner, batch } = spatial.batch_state() else {
                continue;
            };
            let Some(first_vertex) = self.batches.get(owner).and_then(|batches| {
                batches
                    .iter()
                    .find(|b| b.geometry == batch)
                    .and_then(|b| b.members.iter().find(|m| m.geometry == member))
                    .map(|m| m.first_vertex)
            }) else {
                continue;
            };

            let owner_world = self.world_transform(owner)?;
            let member_world = self.world_transform(member)?;
            let mesh = self.mesh(member)?;
            if let Some(data) = self.spatial_mut(batch)?.geometry_mut() {
                let merged = Arc::make_mut(&mut data.mesh);
                merged.overwrite_mapped(
                    first_vertex,
                    mesh.positions(),
                    to_owner_space(&owner_world, &member_world),
                );
                merged.update_bound();
            }
            self.set_bound_refresh(batch);
            trace!("Re-synced '{}' into its batch", self.name_of(member));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RefreshFlags;
    use approx::assert_relative_eq;

    struct Fixture {
        graph: SceneGraph,
        owner: SpatialId,
        rocks: [SpatialId; 2],
        glass: SpatialId,
    }

    fn fixture() -> Fixture {
        let mut graph = SceneGraph::new();
        let owner = graph.create_node("field");
        let stone = Arc::new(Material::new("stone"));
        let clear = Arc::new(Material::transparent("glass", 0.5));

        let rock_a = graph.create_geometry("rock-a", Mesh::cube(1.0), Arc::clone(&stone));
        let rock_b = graph.create_geometry("rock-b", Mesh::cube(1.0), Arc::clone(&stone));
        let glass = graph.create_geometry("glass", Mesh::cube(1.0), clear);
        graph.set_local_translation(rock_a, Vec3::new(-5.0, 0.0, 0.0)).unwrap();
        graph.set_local_translation(rock_b, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        for id in [rock_a, rock_b, glass] {
            graph.attach_child(owner, id).unwrap();
        }
        graph.update_geometric_state(owner).unwrap();

        Fixture {
            graph,
            owner,
            rocks: [rock_a, rock_b],
            glass,
        }
    }

    #[test]
    fn test_batch_groups_by_material() {
        let Fixture { mut graph, owner, rocks, glass } = fixture();

        assert_eq!(graph.batch(owner).unwrap(), 2);

        let generated = graph.batch_geometries(owner).unwrap();
        assert_eq!(graph.mesh(generated[0]).unwrap().vertex_count(), 16);
        assert_eq!(graph.mesh(generated[1]).unwrap().vertex_count(), 8);
        assert!(graph.is_batched(rocks[0]).unwrap());
        assert!(graph.is_batched(glass).unwrap());
        assert_eq!(graph.batch_owner(generated[0]).unwrap(), Some(owner));
        assert_eq!(graph.get(generated[0]).unwrap().name(), "field-batch0");
    }

    #[test]
    fn test_batch_hint_never_is_respected() {
        let Fixture { mut graph, owner, glass, .. } = fixture();
        graph.set_batch_hint(glass, BatchHint::Never).unwrap();

        assert_eq!(graph.batch(owner).unwrap(), 1);
        assert!(!graph.is_batched(glass).unwrap());
    }

    #[test]
    fn test_batched_member_rejects_direct_edits() {
        let Fixture { mut graph, owner, rocks, .. } = fixture();
        graph.batch(owner).unwrap();

        assert_eq!(
            graph.set_mesh(rocks[0], Mesh::cube(2.0)),
            Err(SceneError::BatchedGeometry("rock-a".to_string()))
        );
        assert!(matches!(
            graph.set_material(rocks[0], Arc::new(Material::default())),
            Err(SceneError::BatchedGeometry(_))
        ));
        assert!(matches!(graph.detach_child(owner, rocks[0]), Err(SceneError::BatchedGeometry(_))));
    }

    #[test]
    fn test_unbatch_restores_members() {
        let Fixture { mut graph, owner, rocks, .. } = fixture();
        graph.batch(owner).unwrap();
        let generated = graph.batch_geometries(owner).unwrap();

        graph.unbatch(owner).unwrap();

        assert!(!graph.is_batched(rocks[0]).unwrap());
        assert!(generated.iter().all(|id| !graph.contains(*id)));
        assert_eq!(graph.children(owner).unwrap().len(), 3);
        assert_eq!(graph.unbatch(owner), Err(SceneError::NotBatchOwner("field".to_string())));
    }

    #[test]
    fn test_batch_on_geometry_fails() {
        let Fixture { mut graph, glass, .. } = fixture();
        assert!(matches!(graph.batch(glass), Err(SceneError::NotANode(_))));
    }

    #[test]
    fn test_batch_bound_is_stale_after_member_motion() {
        let Fixture { mut graph, owner, rocks, .. } = fixture();
        graph.batch(owner).unwrap();
        graph.update_geometric_state(owner).unwrap();
        let batch = graph.batch_geometries(owner).unwrap()[0];

        graph.move_local(rocks[1], Vec3::new(100.0, 0.0, 0.0)).unwrap();

        assert!(graph.get(batch).unwrap().refresh_flags().contains(RefreshFlags::BOUND));
        let bound = graph.world_bound(batch).unwrap().unwrap().to_box();
        assert_relative_eq!(bound.max.x, 106.0, epsilon = 1e-4);
        assert!(graph.get(batch).unwrap().refresh_flags().is_empty());
    }

    #[test]
    fn test_repeated_member_moves_queue_one_sync() {
        let Fixture { mut graph, owner, rocks, .. } = fixture();
        graph.batch(owner).unwrap();
        graph.update_geometric_state(owner).unwrap();

        for _ in 0..50 {
            graph.move_local(rocks[0], Vec3::new(0.0, 0.1, 0.0)).unwrap();
        }
        assert_eq!(graph.pending_batch_sync.len(), 1);

        graph.update_geometric_state(owner).unwrap();
        assert!(graph.pending_batch_sync.is_empty());
    }

    #[test]
    fn test_member_motion_resyncs_batch() {
        let Fixture { mut graph, owner, rocks, .. } = fixture();
        graph.batch(owner).unwrap();
        graph.update_geometric_state(owner).unwrap();
        let batch = graph.batch_geometries(owner).unwrap()[0];

        graph.move_local(rocks[1], Vec3::new(10.0, 0.0, 0.0)).unwrap();
        assert!(graph.get(owner).unwrap().refresh_flags().contains(RefreshFlags::BOUND));
        graph.update_geometric_state(owner).unwrap();

        let bound = graph.world_bound(batch).unwrap().unwrap().to_box();
        assert_relative_eq!(bound.min.x, -6.0, epsilon = 1e-5);
        assert_relative_eq!(bound.max.x, 16.0, epsilon = 1e-5);
    }
}
