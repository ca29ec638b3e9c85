//! Low-level building blocks shared by every scene module
//!
//! - `math`: nalgebra aliases and the translation/rotation/scale [`math::Transform`]
//! - `logging`: `env_logger` setup behind the `log` facade

pub mod logging;
pub mod math;
