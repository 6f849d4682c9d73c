//! Core domain types, errors, and constants for `zeorun`.
//!
//! Every other crate in the workspace builds on the definitions here:
//!
//! - **`errors`**: the primary `Error` enum and `Result` alias. Hard failures
//!   (staging I/O, spawn failures, decode problems) are values of this enum;
//!   expected computation outcomes are not.
//! - **`types`**: the argument list handed to the external tool and the
//!   immutable `ExecutionResult` produced by one execution attempt.
//! - **`constants`**: environment variable names and defaults shared between
//!   the configuration layer and the binaries.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
