//! Math utilities and types
//!
//! Provides the vector, quaternion and matrix aliases used by the scene graph,
//! plus the translation/rotation/scale `Transform` every spatial carries.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, UnitQuaternion, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Translation, rotation and scale of a spatial relative to some parent space.
///
/// Composition is not commutative: `child.combine_with_parent(&parent)` scales and
/// rotates the child's translation by the parent before adding the parent's
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation component
    pub translation: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Per-axis scale factors. Components must be nonzero for
    /// [`Transform::transform_inverse_vector`] to be defined.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from its three components
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Create a transform with only a rotation
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::default()
        }
    }

    /// Create a transform with a uniform scale
    pub fn from_uniform_scale(scale: f32) -> Self {
        Self {
            scale: Vec3::repeat(scale),
            ..Self::default()
        }
    }

    /// Builder pattern: set translation
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Builder pattern: set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// True when every scale component is nonzero
    pub fn has_valid_scale(&self) -> bool {
        self.scale.iter().all(|s| *s != 0.0)
    }

    /// True when this transform leaves every point where it is
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Turn this transform into `self` expressed as a child of `parent`.
    ///
    /// Scales are multiplied component-wise, rotations compose as
    /// `parent * self`, and the translation is scaled then rotated by the
    /// parent before the parent's translation is added.
    pub fn combine_with_parent(&mut self, parent: &Transform) -> &mut Self {
        self.scale.component_mul_assign(&parent.scale);
        self.rotation = parent.rotation * self.rotation;
        self.translation.component_mul_assign(&parent.scale);
        self.translation = parent.rotation * self.translation;
        self.translation += parent.translation;
        self
    }

    /// Return `self` as a child of `parent` without modifying either
    pub fn combined_with_parent(&self, parent: &Transform) -> Transform {
        let mut result = *self;
        result.combine_with_parent(parent);
        result
    }

    /// Apply scale, rotation and translation (in that order) to a point
    pub fn transform_vector(&self, point: &Vec3) -> Vec3 {
        self.rotation * point.component_mul(&self.scale) + self.translation
    }

    /// Undo [`Transform::transform_vector`]: remove translation, apply the
    /// conjugate rotation, divide by scale. Zero scale gives non-finite output.
    pub fn transform_inverse_vector(&self, point: &Vec3) -> Vec3 {
        (self.rotation.inverse() * (point - self.translation)).component_div(&self.scale)
    }

    /// Convert to a transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Blend between two transforms: linear for translation and scale,
    /// spherical for rotation
    pub fn interpolate(&self, other: &Transform, t: f32) -> Transform {
        Transform {
            translation: self.translation.lerp(&other.translation, t),
            rotation: self.rotation.slerp(&other.rotation, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_identity_has_no_effect() {
        let transform = Transform::identity();
        assert_eq!(transform.rotation, Quat::identity());
        assert!(transform.is_identity());
        assert_relative_eq!(transform.to_matrix(), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_combine_scales_then_translates_child() {
        let parent = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::repeat(2.0));
        let mut child = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));

        child.combine_with_parent(&parent);

        assert_relative_eq!(child.translation, Vec3::new(3.0, 2.0, 3.0), epsilon = EPSILON);
        assert_relative_eq!(child.scale, Vec3::repeat(2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_combine_rotates_child_translation() {
        let parent = Transform::from_rotation(Quat::from_axis_angle(
            &Vec3::y_axis(),
            constants::HALF_PI,
        ));
        let child = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));

        let world = child.combined_with_parent(&parent);

        // Rotating +X by 90 degrees around Y points it down -Z
        assert_relative_eq!(world.translation, Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(world.rotation, parent.rotation, epsilon = EPSILON);
    }

    #[test]
    fn test_combine_is_not_commutative() {
        let a = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)).with_scale(Vec3::repeat(3.0));
        let b = Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)).with_scale(Vec3::repeat(0.5));

        let ab = a.combined_with_parent(&b);
        let ba = b.combined_with_parent(&a);

        assert!((ab.translation - ba.translation).norm() > 1.0);
    }

    #[test]
    fn test_combine_matches_matrix_product() {
        let parent = Transform::new(
            Vec3::new(4.0, -1.0, 2.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 0.7),
            Vec3::repeat(1.5),
        );
        let child = Transform::new(
            Vec3::new(-2.0, 3.0, 0.5),
            Quat::from_axis_angle(&Vec3::x_axis(), -0.3),
            Vec3::repeat(2.0),
        );

        let world = child.combined_with_parent(&parent);

        assert_relative_eq!(
            world.to_matrix(),
            parent.to_matrix() * child.to_matrix(),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_inverse_vector_undoes_forward_vector() {
        let transform = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 1.1),
            Vec3::new(2.0, 0.5, 4.0),
        );
        let point = Vec3::new(-3.0, 7.0, 0.25);

        let forward = transform.transform_vector(&point);
        let back = transform.transform_inverse_vector(&forward);

        assert_relative_eq!(back, point, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_scale_is_reported() {
        let transform = Transform::identity().with_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(!transform.has_valid_scale());
        assert!(Transform::identity().has_valid_scale());
    }

    #[test]
    fn test_interpolate_halfway() {
        let a = Transform::identity();
        let b = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)).with_scale(Vec3::repeat(3.0));

        let mid = a.interpolate(&b, 0.5);

        assert_relative_eq!(mid.translation, Vec3::new(5.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(mid.scale, Vec3::repeat(2.0), epsilon = EPSILON);
    }
}
