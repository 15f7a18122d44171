//! Modules layer - Infrastructure components
//!
//! Contains the filesystem storage adapters and identifier generation used by
//! the feature services.

pub mod identifier;
pub mod storage;
