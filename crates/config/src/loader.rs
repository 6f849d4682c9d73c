//! Configuration loader for zeorun
//!
//! Layers, lowest precedence first: built-in defaults, the JSON settings
//! file, then `ZEORUN_*` environment variables. Command-line overrides are
//! applied by the binary on the returned `Settings`.

use crate::config::Settings;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use zeorun_core::{
    Error, Result, ZEORUN_BIND_VAR, ZEORUN_CACHE_MAX_BYTES_VAR, ZEORUN_CACHE_MAX_ENTRIES_VAR,
    ZEORUN_CONFIG_VAR, ZEORUN_MAX_CONCURRENT_VAR, ZEORUN_MAX_UPLOAD_BYTES_VAR,
    ZEORUN_TIMEOUT_SECS_VAR, ZEORUN_TOOL_VAR, ZEORUN_WORKSPACE_ROOT_VAR,
};
use zeorun_utils::XdgPaths;

/// Builds `Settings` from the configured sources
pub struct SettingsLoader {
    /// Explicit settings file; must exist when set
    file: Option<PathBuf>,
    /// Environment snapshot, restricted to `ZEORUN_*` keys
    env: HashMap<String, String>,
}

impl SettingsLoader {
    /// Create a loader reading from the process environment
    pub fn new() -> Self {
        Self {
            file: None,
            env: std::env::vars()
                .filter(|(key, _)| key.starts_with("ZEORUN_"))
                .collect(),
        }
    }

    /// Use an explicit settings file instead of the default location
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Replace the environment snapshot
    pub fn env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Load and validate the settings
    pub fn load(self) -> Result<Settings> {
        let (path, required) = match (&self.file, self.env.get(ZEORUN_CONFIG_VAR)) {
            (Some(path), _) => (path.clone(), true),
            (None, Some(path)) => (PathBuf::from(path), true),
            (None, None) => (XdgPaths::config_file(), false),
        };

        let mut settings = if path.exists() {
            read_settings_file(&path)?
        } else if required {
            return Err(Error::configuration(format!(
                "settings file '{}' does not exist",
                path.display()
            )));
        } else {
            Settings::default()
        };

        apply_env(&mut settings, &self.env)?;
        settings.validate()?;

        tracing::debug!(
            settings_file = %path.display(),
            tool = %settings.runner.tool_path.display(),
            max_concurrent = settings.runner.max_concurrent_executions,
            "settings loaded"
        );

        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_settings_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read settings file", e))?;
    serde_json::from_str(&content).map_err(|e| {
        Error::configuration(format!(
            "invalid settings file '{}': {e}",
            path.display()
        ))
    })
}

fn apply_env(settings: &mut Settings, env: &HashMap<String, String>) -> Result<()> {
    if let Some(tool) = env.get(ZEORUN_TOOL_VAR) {
        settings.runner.tool_path = PathBuf::from(tool);
    }
    if let Some(root) = env.get(ZEORUN_WORKSPACE_ROOT_VAR) {
        settings.runner.workspace_root = PathBuf::from(root);
    }
    if let Some(secs) = parse_var(env, ZEORUN_TIMEOUT_SECS_VAR)? {
        settings.runner.timeout_secs = secs;
    }
    if let Some(max) = parse_var(env, ZEORUN_MAX_CONCURRENT_VAR)? {
        settings.runner.max_concurrent_executions = max;
    }
    if let Some(entries) = parse_var(env, ZEORUN_CACHE_MAX_ENTRIES_VAR)? {
        settings.cache.max_entries = entries;
    }
    if let Some(bytes) = parse_var(env, ZEORUN_CACHE_MAX_BYTES_VAR)? {
        settings.cache.max_bytes = bytes;
    }
    if let Some(bind) = parse_var(env, ZEORUN_BIND_VAR)? {
        settings.server.bind = bind;
    }
    if let Some(limit) = parse_var(env, ZEORUN_MAX_UPLOAD_BYTES_VAR)? {
        settings.server.max_upload_bytes = limit;
    }
    Ok(())
}

fn parse_var<T>(env: &HashMap<String, String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env.get(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::configuration(format!("invalid value '{raw}' for {name}: {e}"))),
    }
}
