use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for zeorun
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/zeorun or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join("zeorun")
    }

    /// Default location of the JSON settings file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Parent directory for per-execution workspaces.
    ///
    /// Lives under the system temp directory so stray workspaces from a
    /// crashed process are reclaimed by the OS.
    pub fn workspace_root() -> PathBuf {
        env::temp_dir().join("zeorun")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_dir_respects_xdg() {
        let original = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", "/tmp/config");

        assert_eq!(XdgPaths::config_dir(), PathBuf::from("/tmp/config/zeorun"));
        assert_eq!(
            XdgPaths::config_file(),
            PathBuf::from("/tmp/config/zeorun/config.json")
        );

        match original {
            Some(val) => env::set_var("XDG_CONFIG_HOME", val),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    fn test_workspace_root_is_under_temp() {
        let root = XdgPaths::workspace_root();
        assert!(root.starts_with(env::temp_dir()));
        assert!(root.ends_with("zeorun"));
    }
}
