//! Outcome of one execution attempt of the external tool

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Why an execution attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The tool ran to completion with a non-zero (or signal) status
    NonZeroExit { exit_code: Option<i32> },
    /// The tool exceeded its time budget and was killed
    Timeout { after_ms: u64 },
    /// The tool exited zero but did not write an expected output file
    MissingOutput { file: String },
}

impl FailureKind {
    /// Short machine-friendly label for logs and metrics
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::NonZeroExit { .. } => "non_zero_exit",
            FailureKind::Timeout { .. } => "timeout",
            FailureKind::MissingOutput { .. } => "missing_output",
        }
    }
}

/// Immutable record of one execution attempt.
///
/// `outputs` only holds files the tool actually produced. A zero-length
/// file is present with empty bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code, `None` when killed by a signal or timed out
    pub exit_code: Option<i32>,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Requested output file name -> raw bytes
    pub outputs: BTreeMap<String, Vec<u8>>,
    /// `None` on success
    pub failure: Option<FailureKind>,
    /// Wall time of the tool process
    pub duration: Duration,
    /// When the attempt finished
    pub completed_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// Build the result for a process that ran to completion.
    ///
    /// A non-zero exit takes precedence over a missing output when both apply.
    #[must_use]
    pub fn completed(
        exit_code: Option<i32>,
        stderr: String,
        outputs: BTreeMap<String, Vec<u8>>,
        first_missing: Option<String>,
        duration: Duration,
    ) -> Self {
        let failure = match (exit_code, first_missing) {
            (Some(0), None) => None,
            (Some(0), Some(file)) => Some(FailureKind::MissingOutput { file }),
            (code, _) => Some(FailureKind::NonZeroExit { exit_code: code }),
        };

        Self {
            exit_code,
            stderr,
            outputs,
            failure,
            duration,
            completed_at: Utc::now(),
        }
    }

    /// Build the result for a process killed after exceeding its timeout.
    ///
    /// Partial output files are discarded.
    #[must_use]
    pub fn timed_out(stderr: String, timeout: Duration) -> Self {
        Self {
            exit_code: None,
            stderr,
            outputs: BTreeMap::new(),
            failure: Some(FailureKind::Timeout {
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            duration: timeout,
            completed_at: Utc::now(),
        }
    }

    /// Whether the attempt succeeded
    #[must_use]
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Raw bytes of one output file
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&[u8]> {
        self.outputs.get(name).map(Vec::as_slice)
    }

    /// One output file as UTF-8 text, or a missing-output error
    pub fn output_text(&self, name: &str) -> Result<&str> {
        let bytes = self
            .output(name)
            .ok_or_else(|| Error::missing_output(name))?;
        std::str::from_utf8(bytes)
            .map_err(|e| Error::decode(name, format!("output is not valid UTF-8: {e}")))
    }

    /// Approximate retained size, used for cache accounting
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        let outputs: usize = self
            .outputs
            .iter()
            .map(|(name, bytes)| name.len() + bytes.len())
            .sum();
        (outputs + self.stderr.len()) as u64
    }
}
