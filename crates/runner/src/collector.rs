//! Harvests the requested output files from a finished workspace

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::Path;
use zeorun_core::{Error, Result};

/// Files read back from a workspace
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectedOutputs {
    /// Present files, including zero-length ones
    pub outputs: BTreeMap<String, Vec<u8>>,
    /// First absent file in name order, if any
    pub first_missing: Option<String>,
}

impl CollectedOutputs {
    pub fn is_complete(&self) -> bool {
        self.first_missing.is_none()
    }
}

/// Read exactly the `expected` files from `workspace`.
///
/// Absence is recorded, not raised, so partial output survives a failed
/// run. Any other read failure is a hard `FileSystem` error.
pub async fn collect_outputs(
    workspace: &Path,
    expected: &BTreeSet<String>,
) -> Result<CollectedOutputs> {
    let mut collected = CollectedOutputs::default();

    for name in expected {
        let path = workspace.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                collected.outputs.insert(name.clone(), bytes);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(file = %name, "expected output not produced");
                if collected.first_missing.is_none() {
                    collected.first_missing = Some(name.clone());
                }
            }
            Err(e) => return Err(Error::file_system(path, "read output file", e)),
        }
    }

    Ok(collected)
}
