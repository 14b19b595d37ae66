//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the scene core:
//! - Math types and operations
//! - Collections (bounded histories, bounding-volume arena keys)
//! - Time management
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
