//! Bounding volume used by the scene graph

use serde::{Deserialize, Serialize};

use super::{BoundingBox, BoundingSphere};
use crate::foundation::math::{Transform, Vec3};

/// Bounding volume carried by spatials.
///
/// `transform` and `merge` are pure; merging is commutative and associative
/// with respect to the covered region. Mixing a box and a sphere yields a box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundingVolume {
    /// Axis-aligned box
    Box(BoundingBox),
    /// Sphere
    Sphere(BoundingSphere),
}

impl BoundingVolume {
    /// Center of the volume
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Box(b) => b.center(),
            Self::Sphere(s) => s.center,
        }
    }

    /// The volume as an axis-aligned box (spheres are boxed tightly)
    pub fn to_box(&self) -> BoundingBox {
        match self {
            Self::Box(b) => *b,
            Self::Sphere(s) => BoundingBox::from_center_extents(s.center, Vec3::repeat(s.radius)),
        }
    }

    /// Volume after applying `transform`
    pub fn transform(&self, transform: &Transform) -> BoundingVolume {
        match self {
            Self::Box(b) => Self::Box(b.transform(transform)),
            Self::Sphere(s) => Self::Sphere(s.transform(transform)),
        }
    }

    /// Volume enclosing both inputs
    pub fn merge(&self, other: &BoundingVolume) -> BoundingVolume {
        match (self, other) {
            (Self::Sphere(a), Self::Sphere(b)) => Self::Sphere(a.merge(b)),
            _ => Self::Box(self.to_box().merge(&other.to_box())),
        }
    }

    /// Check if a point lies inside the volume
    pub fn contains_point(&self, point: &Vec3) -> bool {
        match self {
            Self::Box(b) => b.contains_point(point),
            Self::Sphere(s) => s.contains_point(point),
        }
    }

    /// Check whether two volumes overlap
    pub fn intersects(&self, other: &BoundingVolume) -> bool {
        match (self, other) {
            (Self::Sphere(a), Self::Sphere(b)) => a.intersects(b),
            (Self::Box(a), Self::Box(b)) => a.intersects(b),
            (Self::Box(b), Self::Sphere(s)) | (Self::Sphere(s), Self::Box(b)) => {
                b.distance_to_edge(&s.center) <= s.radius
            }
        }
    }

    /// Distance from `point` to the volume surface, zero when inside
    pub fn distance_to_edge(&self, point: &Vec3) -> f32 {
        match self {
            Self::Box(b) => b.distance_to_edge(point),
            Self::Sphere(s) => s.distance_to_edge(point),
        }
    }
}

impl From<BoundingBox> for BoundingVolume {
    fn from(bound: BoundingBox) -> Self {
        Self::Box(bound)
    }
}

impl From<BoundingSphere> for BoundingVolume {
    fn from(bound: BoundingSphere) -> Self {
        Self::Sphere(bound)
    }
}
