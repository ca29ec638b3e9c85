//! Camera and viewport
//!
//! The camera only matters to the scene graph as a culler: it owns the
//! frustum planes world bounds are tested against and the viewport rectangle
//! GUI bounds are tested against.

use super::frustum::{Culler, Frustum, FrustumIntersect};
use crate::bounding::{BoundingBox, BoundingVolume};
use crate::foundation::math::{constants::DEG_TO_RAD, Mat4, Quat, Vec3};

/// Perspective camera looking down its local -Z axis
#[derive(Debug, Clone)]
pub struct Camera {
    location: Vec3,
    rotation: Quat,
    fov_y: f32,
    near: f32,
    far: f32,
    width: u32,
    height: u32,
    frustum: Frustum,
}

impl Camera {
    /// Create a camera for a `width` x `height` viewport with a 45 degree
    /// vertical field of view
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            location: Vec3::zeros(),
            rotation: Quat::identity(),
            fov_y: 45.0 * DEG_TO_RAD,
            near: 1.0,
            far: 1000.0,
            width: width.max(1),
            height: height.max(1),
            frustum: Frustum::from_matrix(&Mat4::identity()),
        };
        camera.update_frustum();
        camera
    }

    /// Set the perspective parameters; `fov_y_degrees` is the vertical field of view
    pub fn set_perspective(&mut self, fov_y_degrees: f32, near: f32, far: f32) {
        self.fov_y = fov_y_degrees * DEG_TO_RAD;
        self.near = near;
        self.far = far;
        self.update_frustum();
    }

    /// Move the camera
    pub fn set_location(&mut self, location: Vec3) {
        self.location = location;
        self.update_frustum();
    }

    /// Orient the camera
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.update_frustum();
    }

    /// Point the camera at `target`
    pub fn look_at(&mut self, target: &Vec3, up: &Vec3) {
        // Camera looks down -Z, so +Z faces away from the target
        self.rotation = Quat::face_towards(&(self.location - target), up);
        self.update_frustum();
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.update_frustum();
    }

    /// Camera position in world space
    pub fn location(&self) -> Vec3 {
        self.location
    }

    /// Camera orientation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Viewport width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Viewport height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Current frustum planes
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// World to view space
    pub fn view_matrix(&self) -> Mat4 {
        self.rotation.inverse().to_homogeneous() * Mat4::new_translation(&-self.location)
    }

    /// View to clip space
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect(), self.fov_y, self.near, self.far)
    }

    fn update_frustum(&mut self) {
        self.frustum = Frustum::from_matrix(&(self.projection_matrix() * self.view_matrix()));
    }

    fn gui_bounds(&self) -> BoundingBox {
        BoundingBox::new(
            Vec3::new(0.0, 0.0, f32::MIN),
            Vec3::new(self.width as f32, self.height as f32, f32::MAX),
        )
    }
}

impl Culler for Camera {
    fn contains(&self, bound: &BoundingVolume) -> FrustumIntersect {
        self.frustum.contains(bound)
    }

    fn contains_gui(&self, bound: &BoundingVolume) -> bool {
        self.gui_bounds().intersects(&bound.to_box())
    }
}

/// A named camera view; passed to control render callbacks
#[derive(Debug, Clone)]
pub struct ViewPort {
    /// Display name
    pub name: String,
    /// Camera rendering this view
    pub camera: Camera,
}

impl ViewPort {
    /// Create a viewport
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding::BoundingSphere;

    fn sphere_at(x: f32, y: f32, z: f32) -> BoundingVolume {
        BoundingSphere::new(Vec3::new(x, y, z), 1.0).into()
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = Camera::new(800, 600);

        assert_eq!(camera.contains(&sphere_at(0.0, 0.0, -10.0)), FrustumIntersect::Inside);
        assert_eq!(camera.contains(&sphere_at(0.0, 0.0, 10.0)), FrustumIntersect::Outside);
        assert_eq!(camera.contains(&sphere_at(0.0, 0.0, -5000.0)), FrustumIntersect::Outside);
    }

    #[test]
    fn test_sphere_on_near_plane_intersects() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.contains(&sphere_at(0.0, 0.0, -1.0)), FrustumIntersect::Intersects);
    }

    #[test]
    fn test_look_at_turns_frustum() {
        let mut camera = Camera::new(800, 600);
        camera.look_at(&Vec3::new(10.0, 0.0, 0.0), &Vec3::y());

        assert_eq!(camera.contains(&sphere_at(20.0, 0.0, 0.0)), FrustumIntersect::Inside);
        assert_eq!(camera.contains(&sphere_at(0.0, 0.0, -20.0)), FrustumIntersect::Outside);
    }

    #[test]
    fn test_gui_containment_uses_viewport_rectangle() {
        let camera = Camera::new(640, 480);

        let on_screen: BoundingVolume =
            BoundingBox::new(Vec3::new(10.0, 10.0, 0.0), Vec3::new(50.0, 50.0, 0.0)).into();
        let off_screen: BoundingVolume =
            BoundingBox::new(Vec3::new(700.0, 10.0, 0.0), Vec3::new(750.0, 50.0, 0.0)).into();

        assert!(camera.contains_gui(&on_screen));
        assert!(!camera.contains_gui(&off_screen));
    }
}
