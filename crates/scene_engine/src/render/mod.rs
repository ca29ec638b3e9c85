//! # Render-side collaborators
//!
//! The pieces of a renderer the scene graph talks to: meshes and materials
//! referenced by geometries, the camera whose frustum drives culling, and the
//! queue visible geometry is collected into.

pub mod camera;
pub mod frustum;
pub mod material;
pub mod mesh;
pub mod queue;

pub use camera::{Camera, ViewPort};
pub use frustum::{Culler, Frustum, FrustumIntersect, Plane};
pub use material::Material;
pub use mesh::{BoundShape, Mesh};
pub use queue::{QueuedGeometry, RenderQueue};
