//! Shared value types passed between the runner, the cache, and the
//! per-operation collaborators.

mod commands;
mod execution;

pub use commands::ToolArguments;
pub use execution::{ExecutionResult, FailureKind};
