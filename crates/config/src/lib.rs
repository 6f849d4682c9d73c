//! Configuration management for zeorun
//!
//! `Settings` is built once at startup by `SettingsLoader` and then shared
//! read-only by the runner and the HTTP surface.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::SettingsLoader;
