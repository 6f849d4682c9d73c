//! Runtime settings for the runner, its cache, and the HTTP surface
//!
//! Settings are immutable after loading and are `Clone + Send + Sync` so the
//! binaries can hand copies to each component.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use zeorun_core::{
    Error, Result, DEFAULT_BIND_ADDRESS, DEFAULT_CACHE_MAX_BYTES, DEFAULT_CACHE_MAX_ENTRIES,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TIMEOUT_SECS, DEFAULT_TOOL_PROGRAM,
};
use zeorun_utils::XdgPaths;

/// Complete zeorun configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// External tool execution
    pub runner: RunnerSettings,
    /// Computation cache bounds
    pub cache: CacheSettings,
    /// HTTP surface
    pub server: ServerSettings,
}

/// How the external tool is launched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Program to execute, resolved through `PATH` when not absolute
    pub tool_path: PathBuf,
    /// Parent directory for per-execution workspaces
    pub workspace_root: PathBuf,
    /// Time budget for one execution attempt
    pub timeout_secs: u64,
    /// Upper bound on concurrently running tool processes
    pub max_concurrent_executions: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            tool_path: PathBuf::from(DEFAULT_TOOL_PROGRAM),
            workspace_root: XdgPaths::workspace_root(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent_executions: default_parallelism(),
        }
    }
}

impl RunnerSettings {
    /// Default timeout as a `Duration`
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bounds for the least-recently-used result cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of retained results
    pub max_entries: usize,
    /// Maximum total bytes of retained outputs
    pub max_bytes: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            max_bytes: DEFAULT_CACHE_MAX_BYTES,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub bind: SocketAddr,
    /// Request body limit for structure uploads
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDRESS
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8000))),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Settings {
    /// Reject settings that would make the runner unusable
    pub fn validate(&self) -> Result<()> {
        if self.runner.tool_path.as_os_str().is_empty() {
            return Err(Error::configuration("runner.tool_path must not be empty"));
        }
        if self.runner.timeout_secs == 0 {
            return Err(Error::configuration(
                "runner.timeout_secs must be greater than zero",
            ));
        }
        if self.runner.max_concurrent_executions == 0 {
            return Err(Error::configuration(
                "runner.max_concurrent_executions must be greater than zero",
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(Error::configuration(
                "cache.max_entries must be greater than zero",
            ));
        }
        if self.cache.max_bytes == 0 {
            return Err(Error::configuration(
                "cache.max_bytes must be greater than zero",
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(Error::configuration(
                "server.max_upload_bytes must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().expect("defaults must validate");
        assert_eq!(settings.runner.tool_path, PathBuf::from("network"));
        assert_eq!(settings.runner.default_timeout(), Duration::from_secs(300));
        assert!(settings.runner.max_concurrent_executions >= 1);
        assert_eq!(settings.server.bind.port(), 8000);
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut settings = Settings::default();
        settings.runner.timeout_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.runner.max_concurrent_executions = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.cache.max_entries = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("cache.max_entries"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"runner": {"timeout_secs": 30}}"#).unwrap();
        assert_eq!(settings.runner.timeout_secs, 30);
        assert_eq!(settings.runner.tool_path, PathBuf::from("network"));
        assert_eq!(settings.cache, CacheSettings::default());
    }
}
