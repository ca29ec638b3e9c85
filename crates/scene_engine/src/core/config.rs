//! # Unified Configuration
//!
//! Scene graph behavior and engine-level settings, loadable from TOML or RON
//! through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Scene Config**: root hint values, light sorting, post-update verification
//! - **Engine Config**: logging and debug switches, wraps the scene config

use serde::{Deserialize, Serialize};

use crate::scene::{BatchHint, Bucket, CullHint, ShadowMode};

pub use crate::config::{Config, ConfigError};

/// Upper bound accepted for [`SceneConfig::max_traversal_depth`]
pub const MAX_TRAVERSAL_DEPTH: usize = 4096;

/// # Scene Configuration
///
/// Settings read by [`crate::scene::SceneGraph`] while resolving and culling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Sort merged world light lists by influence on the owning spatial
    pub sort_world_lights: bool,
    /// Cull hint an `Inherit` chain resolves to at the root
    pub root_cull_hint: CullHint,
    /// Queue bucket an `Inherit` chain resolves to at the root
    pub root_queue_bucket: Bucket,
    /// Shadow mode an `Inherit` chain resolves to at the root
    pub root_shadow_mode: ShadowMode,
    /// Batch hint an `Inherit` chain resolves to at the root
    pub root_batch_hint: BatchHint,
    /// After a full geometric update, walk the subtree and fail if any
    /// refresh flag is still set
    pub verify_after_update: bool,
    /// Initial capacity of the explicit stacks used by resolution walks
    pub max_traversal_depth: usize,
}

impl SceneConfig {
    /// Create a new scene configuration
    pub fn new() -> Self {
        Self {
            sort_world_lights: true,
            root_cull_hint: CullHint::Dynamic,
            root_queue_bucket: Bucket::Opaque,
            root_shadow_mode: ShadowMode::Off,
            root_batch_hint: BatchHint::Always,
            verify_after_update: cfg!(debug_assertions),
            max_traversal_depth: 32,
        }
    }

    /// Enable or disable influence sorting of world light lists
    pub fn with_light_sorting(mut self, enabled: bool) -> Self {
        self.sort_world_lights = enabled;
        self
    }

    /// Set the cull hint used when the whole chain inherits
    pub fn with_root_cull_hint(mut self, hint: CullHint) -> Self {
        self.root_cull_hint = hint;
        self
    }

    /// Set the queue bucket used when the whole chain inherits
    pub fn with_root_queue_bucket(mut self, bucket: Bucket) -> Self {
        self.root_queue_bucket = bucket;
        self
    }

    /// Set the shadow mode used when the whole chain inherits
    pub fn with_root_shadow_mode(mut self, mode: ShadowMode) -> Self {
        self.root_shadow_mode = mode;
        self
    }

    /// Set the batch hint used when the whole chain inherits
    pub fn with_root_batch_hint(mut self, hint: BatchHint) -> Self {
        self.root_batch_hint = hint;
        self
    }

    /// Enable or disable the post-update consistency walk
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_after_update = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_cull_hint == CullHint::Inherit {
            return Err(ConfigError::Invalid("root_cull_hint cannot be Inherit".to_string()));
        }
        if self.root_queue_bucket == Bucket::Inherit {
            return Err(ConfigError::Invalid("root_queue_bucket cannot be Inherit".to_string()));
        }
        if self.root_shadow_mode == ShadowMode::Inherit {
            return Err(ConfigError::Invalid("root_shadow_mode cannot be Inherit".to_string()));
        }
        if self.root_batch_hint == BatchHint::Inherit {
            return Err(ConfigError::Invalid("root_batch_hint cannot be Inherit".to_string()));
        }
        if self.max_traversal_depth == 0 || self.max_traversal_depth > MAX_TRAVERSAL_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_traversal_depth must be between 1 and {MAX_TRAVERSAL_DEPTH}, got {}",
                self.max_traversal_depth
            )));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for SceneConfig {}

/// # Engine Configuration
///
/// Logging and debug settings plus the scene configuration, as loaded by
/// applications at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
    /// Scene graph settings
    pub scene: SceneConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            scene: SceneConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Replace the scene configuration
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level cannot be empty".to_string()));
        }
        self.scene.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}
