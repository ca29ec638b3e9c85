//! Material description shared between geometries
//!
//! Geometries hold materials behind an `Arc`; batching groups geometries that
//! point at the same allocation.

use serde::{Deserialize, Serialize};

/// Surface properties for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name
    pub name: String,

    /// Base color (RGB)
    pub base_color: [f32; 3],

    /// Alpha/transparency (0.0 = transparent, 1.0 = opaque)
    pub alpha: f32,

    /// Whether the material needs alpha blending
    pub transparent: bool,
}

impl Material {
    /// Create an opaque white material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [1.0, 1.0, 1.0],
            alpha: 1.0,
            transparent: false,
        }
    }

    /// Create an alpha blended material
    pub fn transparent(name: impl Into<String>, alpha: f32) -> Self {
        Self::new(name).with_alpha(alpha)
    }

    /// Set the base color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b];
        self
    }

    /// Set the alpha; anything below 1.0 makes the material transparent
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self.transparent = self.alpha < 1.0;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}
