//! Subtree cloning

use std::sync::Arc;

use log::debug;

use super::error::SceneResult;
use super::spatial::{BatchState, GeometryData, NodeData, Spatial, SpatialId, SpatialKind};
use super::SceneGraph;

impl SceneGraph {
    /// Copy `id` and its subtree into a new detached subtree.
    ///
    /// Local state is copied by value. With `deep` set, meshes and materials
    /// are copied too; otherwise the clone shares them. Controls are cloned
    /// through [`super::Control::clone_for_spatial`]. The copy has no parent,
    /// every refresh flag set, and no batch membership; generated batch
    /// geometry is left out.
    pub fn clone_spatial(&mut self, id: SpatialId, deep: bool) -> SceneResult<SpatialId> {
        let root = self.clone_one(id, deep)?;
        let mut stack = vec![(id, root)];
        let mut copied = 1;

        while let Some((source, target)) = stack.pop() {
            let children = self.spatial(source)?.children().to_vec();
            for child in children {
                if let BatchState::Generated { .. } = self.spatial(child)?.batch_state() {
                    continue;
                }
                let copy = self.clone_one(child, deep)?;
                if let Some(list) = self.spatial_mut(target)?.children_mut() {
                    list.push(copy);
                }
                self.spatial_mut(copy)?.parent = Some(target);
                stack.push((child, copy));
                copied += 1;
            }
        }

        debug!("Cloned '{}' ({copied} spatials, deep: {deep})", self.name_of(id));
        Ok(root)
    }

    fn clone_one(&mut self, id: SpatialId, deep: bool) -> SceneResult<SpatialId> {
        let source = self.spatial(id)?;
        let kind = match &source.kind {
            SpatialKind::Node(_) => SpatialKind::Node(NodeData::default()),
            SpatialKind::Geometry(geometry) => {
                let (mesh, material) = if deep {
                    (
                        Arc::new(geometry.mesh.as_ref().clone()),
                        Arc::new(geometry.material.as_ref().clone()),
                    )
                } else {
                    (Arc::clone(&geometry.mesh), Arc::clone(&geometry.material))
                };
                let mut data = GeometryData::new(mesh, material);
                data.ignore_transform = geometry.ignore_transform;
                SpatialKind::Geometry(data)
            }
        };

        let mut copy = Spatial::new(source.name.clone(), kind);
        copy.local_transform = source.local_transform;
        copy.local_lights = source.local_lights.clone();
        copy.cull_hint = source.cull_hint;
        copy.batch_hint = source.batch_hint;
        copy.queue_bucket = source.queue_bucket;
        copy.shadow_mode = source.shadow_mode;
        copy.controls = source
            .controls
            .iter()
            .filter_map(|control| control.clone_for_spatial())
            .collect();

        Ok(self.insert(copy))
    }
}
