//! Scene graph arena, local-state setters and refresh propagation
//!
//! The graph owns every spatial. Setters change local state and mark exactly
//! the cached world state that depends on it:
//!
//! - transform changes mark the spatial and its descendants TRANSFORM and
//!   BOUND, and mark BOUND up the ancestor chain
//! - bound-only changes (mesh data) mark BOUND on the spatial and ancestors
//! - light changes mark LIGHT_LIST on the spatial and its descendants
//!
//! Ancestor walks stop at the first ancestor that is already BOUND-dirty, so
//! repeated edits below the same dirty ancestor cost one step each.

use log::{error, trace, warn};
use slotmap::{SecondaryMap, SlotMap};

use super::batch::Batch;
use super::error::{SceneError, SceneResult};
use super::hints::{BatchHint, Bucket, CullHint, ShadowMode};
use super::spatial::{BatchState, RefreshFlags, Spatial, SpatialId};
use crate::core::config::MAX_TRAVERSAL_DEPTH;
use crate::core::SceneConfig;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::light::Light;

/// Work counters, useful to verify that propagation and resolution stay
/// proportional to what changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Ancestors examined while marking BOUND refresh
    pub ancestor_visits: u64,
    /// World transforms recomputed
    pub transform_updates: u64,
    /// World bounds recomputed
    pub bound_updates: u64,
    /// World light lists recomputed
    pub light_list_updates: u64,
}

/// Arena owning a forest of spatials
#[derive(Debug)]
pub struct SceneGraph {
    pub(crate) spatials: SlotMap<SpatialId, Spatial>,
    pub(crate) batches: SecondaryMap<SpatialId, Vec<Batch>>,
    pub(crate) pending_batch_sync: SecondaryMap<SpatialId, ()>,
    pub(crate) config: SceneConfig,
    pub(crate) stats: GraphStats,
}

impl SceneGraph {
    /// Create an empty graph with the default configuration
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create an empty graph. An out of range traversal depth is clamped.
    pub fn with_config(mut config: SceneConfig) -> Self {
        let depth = config.max_traversal_depth.clamp(1, MAX_TRAVERSAL_DEPTH);
        if depth != config.max_traversal_depth {
            warn!(
                "max_traversal_depth {} out of range, using {depth}",
                config.max_traversal_depth
            );
            config.max_traversal_depth = depth;
        }
        Self {
            spatials: SlotMap::with_key(),
            batches: SecondaryMap::new(),
            pending_batch_sync: SecondaryMap::new(),
            config,
            stats: GraphStats::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Work counters since creation or the last [`SceneGraph::reset_stats`]
    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    /// Zero the work counters
    pub fn reset_stats(&mut self) {
        self.stats = GraphStats::default();
    }

    /// Number of live spatials
    pub fn len(&self) -> usize {
        self.spatials.len()
    }

    /// True when the graph holds no spatials
    pub fn is_empty(&self) -> bool {
        self.spatials.is_empty()
    }

    /// Whether `id` refers to a live spatial
    pub fn contains(&self, id: SpatialId) -> bool {
        self.spatials.contains_key(id)
    }

    /// Read-only view of a spatial's local state
    pub fn get(&self, id: SpatialId) -> SceneResult<&Spatial> {
        self.spatial(id)
    }

    /// Spatials without a parent
    pub fn roots(&self) -> impl Iterator<Item = SpatialId> + '_ {
        self.spatials
            .iter()
            .filter(|(_, spatial)| spatial.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Parent of a spatial
    pub fn parent(&self, id: SpatialId) -> SceneResult<Option<SpatialId>> {
        Ok(self.spatial(id)?.parent)
    }

    pub(crate) fn spatial(&self, id: SpatialId) -> SceneResult<&Spatial> {
        self.spatials.get(id).ok_or(SceneError::UnknownSpatial(id))
    }

    pub(crate) fn spatial_mut(&mut self, id: SpatialId) -> SceneResult<&mut Spatial> {
        self.spatials.get_mut(id).ok_or(SceneError::UnknownSpatial(id))
    }

    pub(crate) fn name_of(&self, id: SpatialId) -> String {
        self.spatials
            .get(id)
            .map_or_else(|| format!("{id:?}"), |spatial| spatial.name.clone())
    }

    /// Initial capacity for resolution stacks
    pub(crate) fn stack_capacity(&self) -> usize {
        self.config.max_traversal_depth.min(self.spatials.len())
    }

    pub(crate) fn insert(&mut self, spatial: Spatial) -> SpatialId {
        self.spatials.insert(spatial)
    }

    // ---------------------------------------------------------------------
    // Local state

    /// Rename a spatial
    pub fn set_name(&mut self, id: SpatialId, name: impl Into<String>) -> SceneResult<()> {
        self.spatial_mut(id)?.name = name.into();
        Ok(())
    }

    /// Transform relative to the parent
    pub fn local_transform(&self, id: SpatialId) -> SceneResult<Transform> {
        Ok(self.spatial(id)?.local_transform)
    }

    /// Replace the local transform
    pub fn set_local_transform(&mut self, id: SpatialId, transform: Transform) -> SceneResult<()> {
        self.modify_local_transform(id, |local| *local = transform)
    }

    /// Replace the local translation
    pub fn set_local_translation(&mut self, id: SpatialId, translation: Vec3) -> SceneResult<()> {
        self.modify_local_transform(id, |local| local.translation = translation)
    }

    /// Replace the local rotation
    pub fn set_local_rotation(&mut self, id: SpatialId, rotation: Quat) -> SceneResult<()> {
        self.modify_local_transform(id, |local| local.rotation = rotation)
    }

    /// Replace the local scale; every component must be nonzero
    pub fn set_local_scale(&mut self, id: SpatialId, scale: Vec3) -> SceneResult<()> {
        self.modify_local_transform(id, |local| local.scale = scale)
    }

    /// Translate by `offset` in parent space
    pub fn move_local(&mut self, id: SpatialId, offset: Vec3) -> SceneResult<()> {
        self.modify_local_transform(id, |local| local.translation += offset)
    }

    /// Rotate by `rotation`, applied after the current local rotation
    pub fn rotate(&mut self, id: SpatialId, rotation: Quat) -> SceneResult<()> {
        self.modify_local_transform(id, |local| local.rotation *= rotation)
    }

    /// Multiply the local scale component-wise
    pub fn scale_local(&mut self, id: SpatialId, factor: Vec3) -> SceneResult<()> {
        self.modify_local_transform(id, |local| local.scale.component_mul_assign(&factor))
    }

    /// Turn the spatial so its local +Z axis points at the world position
    /// `target`, keeping `up` as the world up direction
    pub fn look_at(&mut self, id: SpatialId, target: Vec3, up: Vec3) -> SceneResult<()> {
        let parent = self.spatial(id)?.parent;
        let world_translation = self.world_transform(id)?.translation;
        let direction = target - world_translation;
        if direction.norm_squared() <= f32::EPSILON {
            return Err(SceneError::InvalidArgument(format!(
                "'{}' cannot look at its own position",
                self.name_of(id)
            )));
        }

        let mut rotation = Quat::face_towards(&direction, &up);
        if let Some(parent) = parent {
            rotation = self.world_transform(parent)?.rotation.inverse() * rotation;
        }
        self.set_local_rotation(id, rotation)
    }

    fn modify_local_transform(
        &mut self,
        id: SpatialId,
        edit: impl FnOnce(&mut Transform),
    ) -> SceneResult<()> {
        let spatial = self.spatial_mut(id)?;
        let mut transform = spatial.local_transform;
        edit(&mut transform);
        if !transform.has_valid_scale() {
            error!("Rejected zero scale {:?} on '{}'", transform.scale, spatial.name);
            return Err(SceneError::InvalidArgument(format!(
                "scale of '{}' must be nonzero, got {:?}",
                spatial.name, transform.scale
            )));
        }
        spatial.local_transform = transform;
        self.set_transform_refresh(id);
        Ok(())
    }

    /// Attach a light to this spatial; it affects the whole subtree
    pub fn add_light(&mut self, id: SpatialId, light: Light) -> SceneResult<()> {
        self.spatial_mut(id)?.local_lights.add(light);
        self.set_light_list_refresh(id);
        Ok(())
    }

    /// Remove local lights by name, returning how many were removed
    pub fn remove_light(&mut self, id: SpatialId, name: &str) -> SceneResult<usize> {
        let removed = self.spatial_mut(id)?.local_lights.remove_by_name(name);
        if removed > 0 {
            self.set_light_list_refresh(id);
        }
        Ok(removed)
    }

    /// Remove every local light
    pub fn clear_lights(&mut self, id: SpatialId) -> SceneResult<()> {
        let lights = &mut self.spatial_mut(id)?.local_lights;
        if !lights.is_empty() {
            lights.clear();
            self.set_light_list_refresh(id);
        }
        Ok(())
    }

    /// Set the cull hint
    pub fn set_cull_hint(&mut self, id: SpatialId, hint: CullHint) -> SceneResult<()> {
        self.spatial_mut(id)?.cull_hint = hint;
        Ok(())
    }

    /// Set the batch hint; takes effect the next time a batch is built
    pub fn set_batch_hint(&mut self, id: SpatialId, hint: BatchHint) -> SceneResult<()> {
        self.spatial_mut(id)?.batch_hint = hint;
        Ok(())
    }

    /// Set the render queue bucket
    pub fn set_queue_bucket(&mut self, id: SpatialId, bucket: Bucket) -> SceneResult<()> {
        self.spatial_mut(id)?.queue_bucket = bucket;
        Ok(())
    }

    /// Set the shadow mode
    pub fn set_shadow_mode(&mut self, id: SpatialId, mode: ShadowMode) -> SceneResult<()> {
        self.spatial_mut(id)?.shadow_mode = mode;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Effective hints

    /// Cull hint after resolving `Inherit` through the ancestors
    pub fn effective_cull_hint(&self, id: SpatialId) -> SceneResult<CullHint> {
        self.inherited(id, CullHint::Inherit, self.config.root_cull_hint, |s| s.cull_hint)
    }

    /// Batch hint after resolving `Inherit` through the ancestors
    pub fn effective_batch_hint(&self, id: SpatialId) -> SceneResult<BatchHint> {
        self.inherited(id, BatchHint::Inherit, self.config.root_batch_hint, |s| s.batch_hint)
    }

    /// Queue bucket after resolving `Inherit` through the ancestors
    pub fn effective_queue_bucket(&self, id: SpatialId) -> SceneResult<Bucket> {
        self.inherited(id, Bucket::Inherit, self.config.root_queue_bucket, |s| s.queue_bucket)
    }

    /// Shadow mode after resolving `Inherit` through the ancestors
    pub fn effective_shadow_mode(&self, id: SpatialId) -> SceneResult<ShadowMode> {
        self.inherited(id, ShadowMode::Inherit, self.config.root_shadow_mode, |s| s.shadow_mode)
    }

    fn inherited<H: Copy + PartialEq>(
        &self,
        id: SpatialId,
        inherit: H,
        root_value: H,
        hint: impl Fn(&Spatial) -> H,
    ) -> SceneResult<H> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let spatial = self.spatial(current)?;
            let value = hint(spatial);
            if value != inherit {
                return Ok(value);
            }
            cursor = spatial.parent;
        }
        Ok(root_value)
    }

    // ---------------------------------------------------------------------
    // Refresh propagation

    /// Mark BOUND on `id` and on ancestors up to the first one already marked
    pub(crate) fn set_bound_refresh(&mut self, id: SpatialId) {
        let Some(spatial) = self.spatials.get_mut(id) else {
            return;
        };
        spatial.refresh.insert(RefreshFlags::BOUND);

        let mut cursor = spatial.parent;
        while let Some(ancestor) = cursor {
            let Some(spatial) = self.spatials.get_mut(ancestor) else {
                break;
            };
            self.stats.ancestor_visits += 1;
            if spatial.refresh.contains(RefreshFlags::BOUND) {
                break;
            }
            spatial.refresh.insert(RefreshFlags::BOUND);
            cursor = spatial.parent;
        }
    }

    /// Mark TRANSFORM and BOUND on `id` and its descendants, BOUND on its
    /// ancestors. Descendants already TRANSFORM-dirty are skipped along with
    /// their subtrees.
    pub(crate) fn set_transform_refresh(&mut self, id: SpatialId) {
        let sort_lights = self.config.sort_world_lights;
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let Some(spatial) = self.spatials.get_mut(current) else {
                continue;
            };
            spatial.refresh.insert(RefreshFlags::TRANSFORM);
            let batch = match spatial.batch_state() {
                BatchState::Member { batch, .. } => Some(batch),
                _ => None,
            };
            let children = spatial.children().to_vec();

            self.set_bound_refresh(current);
            if let Some(batch) = batch {
                // The merged vertices of this member are now stale
                self.pending_batch_sync.insert(current, ());
                self.set_bound_refresh(batch);
            }
            if sort_lights {
                // Light order depends on the world translation
                self.set_light_list_refresh(current);
            }

            stack.extend(children.into_iter().filter(|child| {
                self.spatials
                    .get(*child)
                    .is_some_and(|c| !c.refresh.contains(RefreshFlags::TRANSFORM))
            }));
        }
    }

    /// Mark LIGHT_LIST on `id` and its descendants, skipping subtrees that are
    /// already marked. Ancestors are unaffected.
    pub(crate) fn set_light_list_refresh(&mut self, id: SpatialId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(spatial) = self.spatials.get_mut(current) else {
                continue;
            };
            spatial.refresh.insert(RefreshFlags::LIGHT_LIST);
            let children = spatial.children().to_vec();
            stack.extend(children.into_iter().filter(|child| {
                self.spatials
                    .get(*child)
                    .is_some_and(|c| !c.refresh.contains(RefreshFlags::LIGHT_LIST))
            }));
        }
        trace!("Light list refresh from '{}'", self.name_of(id));
    }

    /// Mark every cached value of a spatial stale, as after creation
    pub(crate) fn set_all_refresh(&mut self, id: SpatialId) {
        self.set_transform_refresh(id);
        self.set_light_list_refresh(id);
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;

    #[test]
    fn test_new_node_is_fully_dirty() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node("root");

        let spatial = graph.get(node).unwrap();
        assert_eq!(spatial.refresh_flags(), RefreshFlags::all());
        assert!(spatial.local_transform().is_identity());
    }

    #[test]
    fn test_oversized_traversal_depth_is_clamped() {
        let mut config = SceneConfig::new();
        config.max_traversal_depth = usize::MAX;
        let mut graph = SceneGraph::with_config(config);
        assert_eq!(graph.config().max_traversal_depth, MAX_TRAVERSAL_DEPTH);

        let root = graph.create_node("root");
        let child = graph.create_node("child");
        graph.attach_child(root, child).unwrap();
        graph.update_geometric_state(root).unwrap();
        assert!(graph.stack_capacity() <= 2);
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node("root");

        let result = graph.set_local_scale(node, Vec3::new(1.0, 0.0, 1.0));

        assert!(matches!(result, Err(SceneError::InvalidArgument(_))));
        assert_eq!(graph.local_transform(node).unwrap().scale, Vec3::repeat(1.0));
    }

    #[test]
    fn test_removed_id_is_unknown() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node("root");
        graph.remove(node).unwrap();

        assert_eq!(
            graph.set_local_translation(node, Vec3::x()),
            Err(SceneError::UnknownSpatial(node))
        );
    }

    #[test]
    fn test_effective_hints_fall_back_to_config() {
        let config = SceneConfig::new().with_root_cull_hint(CullHint::Never);
        let mut graph = SceneGraph::with_config(config);
        let root = graph.create_node("root");
        let child = graph.create_node("child");
        graph.attach_child(root, child).unwrap();

        assert_eq!(graph.effective_cull_hint(child).unwrap(), CullHint::Never);

        graph.set_cull_hint(root, CullHint::Always).unwrap();
        assert_eq!(graph.effective_cull_hint(child).unwrap(), CullHint::Always);

        graph.set_cull_hint(child, CullHint::Dynamic).unwrap();
        assert_eq!(graph.effective_cull_hint(child).unwrap(), CullHint::Dynamic);
        assert_eq!(graph.effective_queue_bucket(child).unwrap(), Bucket::Opaque);
    }

    #[test]
    fn test_light_refresh_does_not_touch_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let child = graph.create_node("child");
        let leaf = graph.create_node("leaf");
        graph.attach_child(root, child).unwrap();
        graph.attach_child(child, leaf).unwrap();
        graph.update_geometric_state(root).unwrap();

        graph.add_light(child, Light::ambient("fill", Vec3::repeat(0.2))).unwrap();

        assert!(graph.get(root).unwrap().refresh_flags().is_empty());
        assert_eq!(graph.get(child).unwrap().refresh_flags(), RefreshFlags::LIGHT_LIST);
        assert_eq!(graph.get(leaf).unwrap().refresh_flags(), RefreshFlags::LIGHT_LIST);
    }

    #[test]
    fn test_transform_refresh_marks_descendants_and_ancestor_bounds() {
        let config = SceneConfig::new().with_light_sorting(false);
        let mut graph = SceneGraph::with_config(config);
        let root = graph.create_node("root");
        let middle = graph.create_node("middle");
        let leaf = graph.create_node("leaf");
        graph.attach_child(root, middle).unwrap();
        graph.attach_child(middle, leaf).unwrap();
        graph.update_geometric_state(root).unwrap();

        graph.move_local(middle, Vec3::x()).unwrap();

        let moved = RefreshFlags::TRANSFORM | RefreshFlags::BOUND;
        assert_eq!(graph.get(root).unwrap().refresh_flags(), RefreshFlags::BOUND);
        assert_eq!(graph.get(middle).unwrap().refresh_flags(), moved);
        assert_eq!(graph.get(leaf).unwrap().refresh_flags(), moved);
    }

    #[test]
    fn test_bound_refresh_stops_at_dirty_ancestor() {
        let mut graph = SceneGraph::new();
        let mut chain = vec![graph.create_node("n0")];
        for i in 1..6 {
            let node = graph.create_node(format!("n{i}"));
            graph.attach_child(chain[i - 1], node).unwrap();
            chain.push(node);
        }
        graph.update_geometric_state(chain[0]).unwrap();
        graph.reset_stats();

        let leaf = chain[5];
        graph.set_bound_refresh(leaf);
        assert_eq!(graph.stats().ancestor_visits, 5);

        graph.set_bound_refresh(leaf);
        assert_eq!(graph.stats().ancestor_visits, 6);
    }
}
