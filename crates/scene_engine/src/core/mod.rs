//! Engine-wide settings
//!
//! [`SceneConfig`] tunes how the scene graph resolves, sorts and verifies;
//! [`EngineConfig`] wraps it together with logging switches and is what an
//! application loads from disk at startup.

pub mod config;

pub use config::{Config, ConfigError, EngineConfig, SceneConfig};
