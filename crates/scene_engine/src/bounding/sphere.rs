//! Bounding sphere

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Transform, Vec3};

/// A bounding sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// The center of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around the centroid of `points` reaching the farthest point,
    /// `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let centroid = points.iter().fold(Vec3::zeros(), |acc, p| acc + p) / points.len() as f32;
        let radius = points
            .iter()
            .map(|p| (p - centroid).norm())
            .fold(0.0_f32, f32::max);
        Some(Self::new(centroid, radius))
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Check if a point lies inside the sphere
    pub fn contains_point(&self, point: &Vec3) -> bool {
        (point - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Distance from `point` to the sphere surface, zero when inside
    pub fn distance_to_edge(&self, point: &Vec3) -> f32 {
        ((point - self.center).norm() - self.radius).max(0.0)
    }

    /// World-space sphere after `transform`; the radius grows by the largest
    /// absolute scale component so non-uniform scale stays enclosed
    pub fn transform(&self, transform: &Transform) -> BoundingSphere {
        let center = transform.transform_vector(&self.center);
        let max_scale = transform.scale.abs().max();
        Self::new(center, self.radius * max_scale)
    }

    /// Smallest sphere enclosing both spheres
    pub fn merge(&self, other: &BoundingSphere) -> BoundingSphere {
        let offset = other.center - self.center;
        let distance = offset.norm();

        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }

        let radius = (distance + self.radius + other.radius) * 0.5;
        // distance > 0 here: coincident centers were handled by containment above
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self::new(center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_intersects() {
        let a = BoundingSphere::new(Vec3::zeros(), 1.0);
        let b = BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);
        let c = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_merge_disjoint_spheres() {
        let a = BoundingSphere::new(Vec3::new(-2.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0);

        let merged = a.merge(&b);

        assert_relative_eq!(merged.center, Vec3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(merged.radius, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_merge_contained_sphere_returns_outer() {
        let outer = BoundingSphere::new(Vec3::zeros(), 5.0);
        let inner = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);

        assert_eq!(outer.merge(&inner), outer);
        assert_eq!(inner.merge(&outer), outer);
        assert_eq!(outer.merge(&outer), outer);
    }

    #[test]
    fn test_transform_uses_largest_scale() {
        let sphere = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
        let transform = Transform::from_translation(Vec3::new(0.0, 3.0, 0.0))
            .with_scale(Vec3::new(2.0, -4.0, 1.0));

        let world = sphere.transform(&transform);

        assert_relative_eq!(world.center, Vec3::new(2.0, 3.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(world.radius, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_from_points() {
        let sphere = BoundingSphere::from_points(&[
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ])
        .unwrap();

        assert_relative_eq!(sphere.center, Vec3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(sphere.radius, 1.0, epsilon = 1e-6);
        assert!(BoundingSphere::from_points(&[]).is_none());
    }
}
