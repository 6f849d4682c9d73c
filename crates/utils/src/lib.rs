//! Shared utilities for zeorun
//!
//! Path resolution and logging setup used by the configuration layer and
//! the binaries.

pub mod tracing;
pub mod xdg;

pub use xdg::*;
