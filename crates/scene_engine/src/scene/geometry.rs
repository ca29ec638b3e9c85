//! Geometry operations
//!
//! Meshes and materials are shared through `Arc`. Editing a mesh goes through
//! [`SceneGraph::modify_mesh`], which copies it on write if other geometries
//! share it and marks the bound stale.

use std::sync::Arc;

use log::{debug, error};

use super::error::{SceneError, SceneResult};
use super::spatial::{BatchState, GeometryData, Spatial, SpatialId, SpatialKind};
use super::SceneGraph;
use crate::foundation::math::Mat4;
use crate::render::{Material, Mesh};

impl SceneGraph {
    /// Create a detached geometry
    pub fn create_geometry(
        &mut self,
        name: impl Into<String>,
        mesh: impl Into<Arc<Mesh>>,
        material: Arc<Material>,
    ) -> SpatialId {
        let data = GeometryData::new(mesh.into(), material);
        let id = self.insert(Spatial::new(name, SpatialKind::Geometry(data)));
        debug!("Created geometry '{}'", self.name_of(id));
        id
    }

    /// Shared mesh of a geometry
    pub fn mesh(&self, id: SpatialId) -> SceneResult<Arc<Mesh>> {
        Ok(Arc::clone(&self.geometry(id)?.mesh))
    }

    /// Shared material of a geometry
    pub fn material(&self, id: SpatialId) -> SceneResult<Arc<Material>> {
        Ok(Arc::clone(&self.geometry(id)?.material))
    }

    /// Replace the mesh; fails for batched geometry
    pub fn set_mesh(&mut self, id: SpatialId, mesh: impl Into<Arc<Mesh>>) -> SceneResult<()> {
        self.editable_geometry(id)?.mesh = mesh.into();
        self.set_bound_refresh(id);
        Ok(())
    }

    /// Edit the mesh in place and refresh its model bound; fails for batched
    /// geometry. A mesh shared with other geometries is copied first.
    pub fn modify_mesh(&mut self, id: SpatialId, edit: impl FnOnce(&mut Mesh)) -> SceneResult<()> {
        let geometry = self.editable_geometry(id)?;
        let mesh = Arc::make_mut(&mut geometry.mesh);
        edit(mesh);
        mesh.update_bound();
        self.set_bound_refresh(id);
        Ok(())
    }

    /// Replace the material; fails for batched geometry
    pub fn set_material(&mut self, id: SpatialId, material: Arc<Material>) -> SceneResult<()> {
        self.editable_geometry(id)?.material = material;
        Ok(())
    }

    /// When set, the world bound is the model bound as is and the world
    /// matrix is identity, whatever the ancestors' transforms
    pub fn set_ignore_transform(&mut self, id: SpatialId, ignore: bool) -> SceneResult<()> {
        let name = self.name_of(id);
        self.spatial_mut(id)?
            .geometry_mut()
            .ok_or(SceneError::NotAGeometry(name))?
            .ignore_transform = ignore;
        self.set_transform_refresh(id);
        Ok(())
    }

    /// Whether the geometry ignores transforms
    pub fn ignores_transform(&self, id: SpatialId) -> SceneResult<bool> {
        Ok(self.geometry(id)?.ignore_transform)
    }

    /// World matrix (translation * rotation * scale) of a geometry, resolving
    /// the world transform first
    pub fn world_matrix(&mut self, id: SpatialId) -> SceneResult<Mat4> {
        self.geometry(id)?;
        self.resolve_transform(id)?;
        Ok(self.geometry(id)?.world_matrix)
    }

    /// Whether the geometry has been merged into a batch
    pub fn is_batched(&self, id: SpatialId) -> SceneResult<bool> {
        Ok(matches!(self.geometry(id)?.batch, BatchState::Member { .. }))
    }

    /// Node owning the batch this geometry belongs to, or generated
    pub fn batch_owner(&self, id: SpatialId) -> SceneResult<Option<SpatialId>> {
        Ok(match self.geometry(id)?.batch {
            BatchState::Member { owner, .. } | BatchState::Generated { owner } => Some(owner),
            BatchState::None => None,
        })
    }

    pub(crate) fn geometry(&self, id: SpatialId) -> SceneResult<&GeometryData> {
        let spatial = self.spatial(id)?;
        spatial
            .as_geometry()
            .ok_or_else(|| SceneError::NotAGeometry(spatial.name.clone()))
    }

    /// Geometry whose mesh and material may be changed directly
    fn editable_geometry(&mut self, id: SpatialId) -> SceneResult<&mut GeometryData> {
        let spatial = self.spatial_mut(id)?;
        let name = spatial.name.clone();
        let geometry = spatial
            .geometry_mut()
            .ok_or_else(|| SceneError::NotAGeometry(name.clone()))?;
        if geometry.batch != BatchState::None {
            error!("Direct mesh or material change on batched geometry '{name}'");
            return Err(SceneError::BatchedGeometry(name));
        }
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::scene::RefreshFlags;
    use approx::assert_relative_eq;

    fn setup() -> (SceneGraph, SpatialId, SpatialId) {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let cube = graph.create_geometry("cube", Mesh::cube(1.0), Arc::new(Material::new("grey")));
        graph.attach_child(root, cube).unwrap();
        graph.update_geometric_state(root).unwrap();
        (graph, root, cube)
    }

    #[test]
    fn test_mesh_edit_marks_bound_only() {
        let (mut graph, root, cube) = setup();

        graph
            .modify_mesh(cube, |mesh| {
                for position in mesh.positions_mut() {
                    *position *= 3.0;
                }
            })
            .unwrap();

        assert_eq!(graph.get(cube).unwrap().refresh_flags(), RefreshFlags::BOUND);
        assert_eq!(graph.get(root).unwrap().refresh_flags(), RefreshFlags::BOUND);

        let bound = graph.world_bound(root).unwrap().unwrap().to_box();
        assert_relative_eq!(bound.max, Vec3::repeat(3.0));
    }

    #[test]
    fn test_modify_shared_mesh_copies_on_write() {
        let (mut graph, root, cube) = setup();
        let shared = graph.mesh(cube).unwrap();
        let twin = graph.create_geometry("twin", Arc::clone(&shared), Arc::new(Material::new("grey")));
        graph.attach_child(root, twin).unwrap();

        graph.modify_mesh(twin, |mesh| mesh.set_positions(vec![Vec3::zeros()])).unwrap();

        assert_eq!(graph.mesh(cube).unwrap().vertex_count(), 8);
        assert_eq!(graph.mesh(twin).unwrap().vertex_count(), 1);
    }

    #[test]
    fn test_world_matrix_matches_transform() {
        let (mut graph, root, cube) = setup();
        let transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::repeat(2.0));
        graph.set_local_transform(root, transform).unwrap();

        let matrix = graph.world_matrix(cube).unwrap();
        assert_relative_eq!(matrix, transform.to_matrix(), epsilon = 1e-6);
    }

    #[test]
    fn test_geometry_calls_on_node_fail() {
        let (mut graph, root, _) = setup();

        assert_eq!(graph.mesh(root), Err(SceneError::NotAGeometry("root".to_string())));
        assert!(matches!(
            graph.set_material(root, Arc::new(Material::default())),
            Err(SceneError::NotAGeometry(_))
        ));
    }
}
