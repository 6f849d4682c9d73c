//! Zeo++ analyses offered by zeorun
//!
//! Each analysis is an `Operation` variant carrying its validated
//! parameters. An operation knows the exact `network` invocation it needs,
//! the output file it expects, and how to decode that file into a report.

pub mod operation;
pub mod parsers;
pub mod report;

pub use operation::{
    staged_input_name, Operation, OperationKind, OperationParams, SamplingParams,
};
pub use report::*;
