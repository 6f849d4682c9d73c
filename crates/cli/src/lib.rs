//! Command-line and HTTP front ends for the zeorun runner

pub mod commands;
pub mod server;
