//! Bounding volumes
//!
//! World bounds are derived from model bounds by `transform` and combined
//! across siblings by `merge`; both are pure functions of their inputs.

mod aabb;
mod sphere;
mod volume;

pub use aabb::BoundingBox;
pub use sphere::BoundingSphere;
pub use volume::BoundingVolume;
