//! Least-recently-used retention bounded by entry count and total bytes

mod bounded;

pub use bounded::{BoundedLru, InsertOutcome};
