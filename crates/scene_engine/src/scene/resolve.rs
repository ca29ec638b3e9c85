//! Lazy resolution of cached world state
//!
//! World transforms and light lists depend on the ancestors, so a stale one is
//! resolved by collecting the dirty chain upwards and then computing it top
//! down. World bounds depend on the descendants and are resolved post-order.
//! Both walks use explicit stacks.

use log::{debug, error, trace};

use super::error::{SceneError, SceneResult};
use super::spatial::{RefreshFlags, SpatialId, SpatialKind};
use super::SceneGraph;
use crate::bounding::BoundingVolume;
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::light::LightList;

impl SceneGraph {
    /// World transform, resolving it and any stale ancestors first
    pub fn world_transform(&mut self, id: SpatialId) -> SceneResult<Transform> {
        self.resolve_transform(id)?;
        Ok(self.spatial(id)?.world_transform)
    }

    /// World translation
    pub fn world_translation(&mut self, id: SpatialId) -> SceneResult<Vec3> {
        Ok(self.world_transform(id)?.translation)
    }

    /// World rotation
    pub fn world_rotation(&mut self, id: SpatialId) -> SceneResult<Quat> {
        Ok(self.world_transform(id)?.rotation)
    }

    /// World scale
    pub fn world_scale(&mut self, id: SpatialId) -> SceneResult<Vec3> {
        Ok(self.world_transform(id)?.scale)
    }

    /// World bound, resolving the stale part of the subtree first. `None` for
    /// geometry without vertices and nodes without bounded descendants.
    pub fn world_bound(&mut self, id: SpatialId) -> SceneResult<Option<BoundingVolume>> {
        self.resolve_bound(id)?;
        Ok(self.spatial(id)?.world_bound)
    }

    /// Merged world light list: local lights followed by the ancestors'
    pub fn world_light_list(&mut self, id: SpatialId) -> SceneResult<LightList> {
        self.resolve_light_list(id)?;
        Ok(self.spatial(id)?.world_lights.clone())
    }

    /// Convert a point from the spatial's local space to world space
    pub fn local_to_world(&mut self, id: SpatialId, point: &Vec3) -> SceneResult<Vec3> {
        Ok(self.world_transform(id)?.transform_vector(point))
    }

    /// Convert a world space point into the spatial's local space
    pub fn world_to_local(&mut self, id: SpatialId, point: &Vec3) -> SceneResult<Vec3> {
        Ok(self.world_transform(id)?.transform_inverse_vector(point))
    }

    /// Bring every cached value under `root` up to date: transforms and light
    /// lists top down, then batch contents, then bounds bottom up.
    pub fn update_geometric_state(&mut self, root: SpatialId) -> SceneResult<()> {
        let spatial = self.spatial(root)?;
        if spatial.parent.is_some() {
            error!("update_geometric_state called on attached spatial '{}'", spatial.name);
            return Err(SceneError::NotRoot(spatial.name.clone()));
        }

        let mut stack = Vec::with_capacity(self.stack_capacity());
        stack.push(root);
        while let Some(current) = stack.pop() {
            let flags = self.spatial(current)?.refresh;
            if flags.contains(RefreshFlags::TRANSFORM) {
                self.update_world_transform(current)?;
            }
            if flags.contains(RefreshFlags::LIGHT_LIST) {
                self.update_world_light_list(current)?;
            }

            // A clean spatial may still have stale children when one of its
            // accessors resolved it alone, so every child is visited
            stack.extend(self.spatial(current)?.children().iter().rev());
        }

        self.sync_batches()?;
        self.resolve_bound(root)?;

        if self.config.verify_after_update {
            self.verify_clean(root)?;
        }
        debug!("Updated geometric state under '{}'", self.name_of(root));
        Ok(())
    }

    fn verify_clean(&self, root: SpatialId) -> SceneResult<()> {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let spatial = self.spatial(current)?;
            if !spatial.refresh.is_empty() {
                error!(
                    "'{}' kept {:?} after a full geometric update",
                    spatial.name, spatial.refresh
                );
                return Err(SceneError::IncompleteUpdate {
                    name: spatial.name.clone(),
                    flags: spatial.refresh,
                });
            }
            stack.extend(spatial.children().iter().rev());
        }
        Ok(())
    }

    pub(crate) fn resolve_transform(&mut self, id: SpatialId) -> SceneResult<()> {
        if !self.spatial(id)?.refresh.contains(RefreshFlags::TRANSFORM) {
            return Ok(());
        }

        // Dirty ancestors always form an unbroken chain up from `id`
        let mut chain = Vec::with_capacity(self.stack_capacity());
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let spatial = self.spatial(current)?;
            if !spatial.refresh.contains(RefreshFlags::TRANSFORM) {
                break;
            }
            chain.push(current);
            cursor = spatial.parent;
        }

        for current in chain.into_iter().rev() {
            self.update_world_transform(current)?;
        }
        Ok(())
    }

    pub(crate) fn resolve_bound(&mut self, id: SpatialId) -> SceneResult<()> {
        if !self.spatial(id)?.refresh.contains(RefreshFlags::BOUND) {
            return Ok(());
        }
        // Batch meshes must hold their members' current vertices first
        self.sync_batches()?;

        let mut stack = Vec::with_capacity(self.stack_capacity());
        stack.push((id, false));
        while let Some((current, children_done)) = stack.pop() {
            if children_done {
                self.update_world_bound(current)?;
                continue;
            }
            stack.push((current, true));
            let spatial = self.spatial(current)?;
            for child in spatial.children() {
                if self.spatial(*child)?.refresh.contains(RefreshFlags::BOUND) {
                    stack.push((*child, false));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn resolve_light_list(&mut self, id: SpatialId) -> SceneResult<()> {
        if !self.spatial(id)?.refresh.contains(RefreshFlags::LIGHT_LIST) {
            return Ok(());
        }

        let mut chain = Vec::with_capacity(self.stack_capacity());
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let spatial = self.spatial(current)?;
            if !spatial.refresh.contains(RefreshFlags::LIGHT_LIST) {
                break;
            }
            chain.push(current);
            cursor = spatial.parent;
        }

        for current in chain.into_iter().rev() {
            self.update_world_light_list(current)?;
        }
        Ok(())
    }

    /// Recompute one world transform from the parent's; the parent must be resolved
    fn update_world_transform(&mut self, id: SpatialId) -> SceneResult<()> {
        let spatial = self.spatial(id)?;
        let world = match spatial.parent {
            Some(parent) => {
                let parent_world = self.spatial(parent)?.world_transform;
                spatial.local_transform.combined_with_parent(&parent_world)
            }
            None => spatial.local_transform,
        };

        self.stats.transform_updates += 1;
        let spatial = self.spatial_mut(id)?;
        spatial.world_transform = world;
        if let SpatialKind::Geometry(geometry) = &mut spatial.kind {
            geometry.world_matrix = if geometry.ignore_transform {
                Mat4::identity()
            } else {
                world.to_matrix()
            };
        }
        spatial.refresh.remove(RefreshFlags::TRANSFORM);
        trace!("Resolved world transform of '{}'", spatial.name);
        Ok(())
    }

    /// Recompute one world bound; children must be resolved
    fn update_world_bound(&mut self, id: SpatialId) -> SceneResult<()> {
        self.resolve_transform(id)?;

        let spatial = self.spatial(id)?;
        let bound = match &spatial.kind {
            SpatialKind::Geometry(geometry) => {
                let model = geometry.mesh.bound();
                if geometry.ignore_transform {
                    model
                } else {
                    model.map(|bound| bound.transform(&spatial.world_transform))
                }
            }
            SpatialKind::Node(node) => {
                let mut merged: Option<BoundingVolume> = None;
                for child in &node.children {
                    if let Some(child_bound) = self.spatial(*child)?.world_bound {
                        merged = Some(match merged {
                            Some(bound) => bound.merge(&child_bound),
                            None => child_bound,
                        });
                    }
                }
                merged
            }
        };

        self.stats.bound_updates += 1;
        let spatial = self.spatial_mut(id)?;
        spatial.world_bound = bound;
        spatial.refresh.remove(RefreshFlags::BOUND);
        trace!("Resolved world bound of '{}'", spatial.name);
        Ok(())
    }

    /// Recompute one world light list; the parent's must be resolved
    fn update_world_light_list(&mut self, id: SpatialId) -> SceneResult<()> {
        let sort = self.config.sort_world_lights;
        if sort {
            self.resolve_transform(id)?;
        }

        let spatial = self.spatial(id)?;
        let parent_lights = match spatial.parent {
            Some(parent) => {
                let parent = self.spatial(parent)?;
                if parent.refresh.contains(RefreshFlags::LIGHT_LIST) {
                    error!(
                        "Light list of '{}' resolved before its parent '{}'",
                        spatial.name, parent.name
                    );
                    return Err(SceneError::ParentLightListDirty(spatial.name.clone()));
                }
                Some(&parent.world_lights)
            }
            None => None,
        };

        let mut world = LightList::new();
        world.update(&spatial.local_lights, parent_lights);
        if sort {
            world.sort_by_influence(&spatial.world_transform.translation);
        }

        self.stats.light_list_updates += 1;
        let spatial = self.spatial_mut(id)?;
        spatial.world_lights = world;
        spatial.refresh.remove(RefreshFlags::LIGHT_LIST);
        trace!("Resolved world light list of '{}'", spatial.name);
        Ok(())
    }

    /// Resolve a single world light list without touching the parent chain;
    /// fails when the parent's list is still stale
    pub fn update_light_list(&mut self, id: SpatialId) -> SceneResult<()> {
        if self.spatial(id)?.refresh.contains(RefreshFlags::LIGHT_LIST) {
            self.update_world_light_list(id)?;
        }
        Ok(())
    }
}
