//! Mesh data referenced by geometries
//!
//! The scene graph only needs vertex positions (for the model bound and for
//! batching); everything else a renderer uploads lives outside this crate.

use serde::{Deserialize, Serialize};

use crate::bounding::{BoundingBox, BoundingSphere, BoundingVolume};
use crate::foundation::math::Vec3;

/// Which volume type a mesh computes for its model bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundShape {
    /// Axis-aligned box
    #[default]
    Box,
    /// Sphere
    Sphere,
}

/// Indexed triangle mesh in model space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bound_shape: BoundShape,
    bound: Option<BoundingVolume>,
}

impl Mesh {
    /// Create a mesh from positions and triangle indices
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            positions,
            indices,
            bound_shape: BoundShape::Box,
            bound: None,
        };
        mesh.update_bound();
        mesh
    }

    /// Mesh without vertices; has no model bound
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Axis-aligned cube centered on the origin
    pub fn cube(half_extent: f32) -> Self {
        let h = half_extent;
        let positions = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
            3, 7, 6, 3, 6, 2, // top
            0, 1, 5, 0, 5, 4, // bottom
        ];
        Self::new(positions, indices)
    }

    /// Rectangle in the XY plane with its lower-left corner at the origin,
    /// the usual shape for screen-space geometry
    pub fn quad(width: f32, height: f32) -> Self {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(width, 0.0, 0.0),
            Vec3::new(width, height, 0.0),
            Vec3::new(0.0, height, 0.0),
        ];
        Self::new(positions, vec![0, 1, 2, 0, 2, 3])
    }

    /// Builder pattern: pick the model bound volume type
    pub fn with_bound_shape(mut self, shape: BoundShape) -> Self {
        self.bound_shape = shape;
        self.update_bound();
        self
    }

    /// Vertex positions in model space
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Mutable vertex positions. Call [`Mesh::update_bound`] afterwards; the
    /// scene graph does so when edits go through `SceneGraph::modify_mesh`.
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Replace every position and recompute the bound
    pub fn set_positions(&mut self, positions: Vec<Vec3>) {
        self.positions = positions;
        self.update_bound();
    }

    /// Triangle indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Model-space bound, `None` when the mesh has no vertices
    pub fn bound(&self) -> Option<BoundingVolume> {
        self.bound
    }

    /// Override the model bound, e.g. with a hand-authored volume
    pub fn set_bound(&mut self, bound: Option<BoundingVolume>) {
        self.bound = bound;
    }

    /// Recompute the model bound from the positions
    pub fn update_bound(&mut self) {
        self.bound = match self.bound_shape {
            BoundShape::Box => BoundingBox::from_points(&self.positions).map(BoundingVolume::Box),
            BoundShape::Sphere => {
                BoundingSphere::from_points(&self.positions).map(BoundingVolume::Sphere)
            }
        };
    }

    /// Append another mesh, mapping each of its positions through `map`.
    /// Returns the index of the first appended vertex.
    pub(crate) fn append_mapped(&mut self, other: &Mesh, map: impl Fn(&Vec3) -> Vec3) -> usize {
        let base = self.positions.len();
        let offset = base as u32;
        self.positions.extend(other.positions.iter().map(&map));
        self.indices.extend(other.indices.iter().map(|i| i + offset));
        base
    }

    /// Overwrite `source.len()` positions starting at `start` with mapped
    /// values from `source`
    pub(crate) fn overwrite_mapped(
        &mut self,
        start: usize,
        source: &[Vec3],
        map: impl Fn(&Vec3) -> Vec3,
    ) {
        for (target, position) in self.positions[start..start + source.len()].iter_mut().zip(source) {
            *target = map(position);
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::empty()
    }
}
