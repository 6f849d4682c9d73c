//! Execution-and-caching runner for the Zeo++ `network` tool
//!
//! A request flows through the modules in order: the cache key is built from
//! the structure bytes, arguments and operation id; on a miss the structure
//! is staged into a private `workspace`, the `executor` launches the tool
//! there, and the `collector` reads back the requested output files. The
//! `Runner` ties these together behind the `ComputationCache`.

pub mod collector;
pub mod executor;
pub mod runner;
pub mod workspace;

pub use collector::{collect_outputs, CollectedOutputs};
pub use executor::{ProcessExecutor, ProcessOutput, ProcessStatus, SystemProcessExecutor};
pub use runner::{OperationDescriptor, RunRequest, RunResponse, Runner, RunnerConfig};
pub use workspace::{is_plain_file_name, Workspace};
pub use zeorun_cache::{CacheStatSnapshot, CacheStatus, ComputationKey};
