/// Constants used throughout the zeorun codebase
// External tool
pub const DEFAULT_TOOL_PROGRAM: &str = "network";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// Workspace staging
pub const WORKSPACE_DIR_PREFIX: &str = "zeorun-";
pub const STAGED_INPUT_STEM: &str = "structure";

// Cache bounds
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 256 * 1024 * 1024;

// HTTP surface
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

// Environment variable names
pub const ZEORUN_LOG_VAR: &str = "ZEORUN_LOG";
pub const ZEORUN_CONFIG_VAR: &str = "ZEORUN_CONFIG";
pub const ZEORUN_TOOL_VAR: &str = "ZEORUN_TOOL";
pub const ZEORUN_WORKSPACE_ROOT_VAR: &str = "ZEORUN_WORKSPACE_ROOT";
pub const ZEORUN_TIMEOUT_SECS_VAR: &str = "ZEORUN_TIMEOUT_SECS";
pub const ZEORUN_MAX_CONCURRENT_VAR: &str = "ZEORUN_MAX_CONCURRENT";
pub const ZEORUN_CACHE_MAX_ENTRIES_VAR: &str = "ZEORUN_CACHE_MAX_ENTRIES";
pub const ZEORUN_CACHE_MAX_BYTES_VAR: &str = "ZEORUN_CACHE_MAX_BYTES";
pub const ZEORUN_BIND_VAR: &str = "ZEORUN_BIND";
pub const ZEORUN_MAX_UPLOAD_BYTES_VAR: &str = "ZEORUN_MAX_UPLOAD_BYTES";
