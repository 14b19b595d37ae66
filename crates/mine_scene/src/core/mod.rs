//! # Core
//!
//! Crate-wide settings that tie the subsystems together.
//!
//! ## Organization
//!
//! - **Config**: [`SceneSettings`], loaded from `.toml` or `.ron` through the
//!   [`Config`] trait

pub mod config;

pub use config::{CoordinateSettings, PerfSettings, SceneSettings};
pub use crate::config::{Config, ConfigError, ConfigFormat};
