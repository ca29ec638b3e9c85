//! Frustum planes and bound classification

use crate::bounding::{BoundingBox, BoundingVolume};
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Tri-state result of testing a bound against a frustum. Cached per spatial
/// so children of a parent that is fully inside or fully outside need no test
/// of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrustumIntersect {
    /// Completely outside
    Outside,
    /// Straddles at least one plane
    #[default]
    Intersects,
    /// Completely inside
    Inside,
}

/// Anything able to classify world bounds for culling.
///
/// [`crate::render::Camera`] is the production implementation.
pub trait Culler {
    /// Classify a world bound against the view frustum
    fn contains(&self, bound: &BoundingVolume) -> FrustumIntersect;

    /// Whether a screen-space bound overlaps the viewport rectangle
    fn contains_gui(&self, bound: &BoundingVolume) -> bool;
}

/// Plane defined by normal and distance from origin; points with a positive
/// signed distance are on the inner side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Signed offset along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.norm();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Plane from `ax + by + cz + d` coefficients
    fn from_coefficients(coefficients: &Vec4) -> Self {
        Self::new(
            Vec3::new(coefficients.x, coefficients.y, coefficients.z),
            coefficients.w,
        )
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Which side of the plane a bound lies on
    pub fn classify(&self, bound: &BoundingVolume) -> FrustumIntersect {
        let (center, radius) = match bound {
            BoundingVolume::Sphere(sphere) => (sphere.center, sphere.radius),
            BoundingVolume::Box(aabb) => (aabb.center(), self.projected_radius(aabb)),
        };
        let distance = self.distance_to_point(&center);
        if distance < -radius {
            FrustumIntersect::Outside
        } else if distance < radius {
            FrustumIntersect::Intersects
        } else {
            FrustumIntersect::Inside
        }
    }

    fn projected_radius(&self, aabb: &BoundingBox) -> f32 {
        aabb.extents().dot(&self.normal.abs())
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix (Gribb-Hartmann,
    /// OpenGL clip volume `-w <= x, y, z <= w`)
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let row = |i: usize| {
            Vec4::new(
                view_projection[(i, 0)],
                view_projection[(i, 1)],
                view_projection[(i, 2)],
                view_projection[(i, 3)],
            )
        };
        let (x, y, z, w) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(&(w + x)),
                Plane::from_coefficients(&(w - x)),
                Plane::from_coefficients(&(w + y)),
                Plane::from_coefficients(&(w - y)),
                Plane::from_coefficients(&(w + z)),
                Plane::from_coefficients(&(w - z)),
            ],
        }
    }

    /// Classify a bound: outside any plane means outside, straddling any plane
    /// means intersecting, otherwise inside
    pub fn contains(&self, bound: &BoundingVolume) -> FrustumIntersect {
        let mut result = FrustumIntersect::Inside;
        for plane in &self.planes {
            match plane.classify(bound) {
                FrustumIntersect::Outside => return FrustumIntersect::Outside,
                FrustumIntersect::Intersects => result = FrustumIntersect::Intersects,
                FrustumIntersect::Inside => {}
            }
        }
        result
    }
}
