//! Axis-aligned bounding box

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Transform, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a new box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box enclosing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bound = Self::new(*first, *first);
        for point in rest {
            bound.min = bound.min.inf(point);
            bound.max = bound.max.sup(point);
        }
        Some(bound)
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this box intersects another box
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Closest point of the box to `point`
    pub fn closest_point(&self, point: &Vec3) -> Vec3 {
        point.sup(&self.min).inf(&self.max)
    }

    /// Distance from `point` to the box surface, zero when inside
    pub fn distance_to_edge(&self, point: &Vec3) -> f32 {
        (self.closest_point(point) - point).norm()
    }

    /// World-space box enclosing this box after `transform`.
    ///
    /// The center goes through the full transform; the extents are scaled and
    /// then re-fitted through the absolute rotation matrix.
    pub fn transform(&self, transform: &Transform) -> BoundingBox {
        let center = transform.transform_vector(&self.center());
        let scaled = self.extents().component_mul(&transform.scale.abs());
        let rotation = transform.rotation.to_rotation_matrix().into_inner().abs();
        Self::from_center_extents(center, rotation * scaled)
    }

    /// Smallest box enclosing both boxes
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}
