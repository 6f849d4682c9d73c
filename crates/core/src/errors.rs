use std::path::PathBuf;

/// Result type alias for zeorun operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zeorun operations
///
/// These are hard failures: the environment or the request is broken. A tool
/// run that exits non-zero, times out, or forgets an output file is not an
/// `Error`; it is reported through `ExecutionResult::failure`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Workspace could not be created or populated
    #[error("failed to stage workspace at '{path}': {message}")]
    Staging {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool could not be launched or waited on
    #[error("{}", format_command_error(.command, .args, .message, .exit_code))]
    CommandExecution {
        command: String,
        args: Vec<String>,
        message: String,
        exit_code: Option<i32>,
    },

    /// An expected output file was not produced
    #[error("expected output file '{file}' was not produced")]
    MissingOutput { file: String },

    /// Output bytes did not match the expected format
    #[error("failed to decode {format} output: {message}")]
    Decode { format: String, message: String },

    /// Caller supplied an unusable value
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A coalesced request observed the shared computation fail hard
    #[error("shared execution for key '{key}' failed: {message}")]
    SharedExecution { key: String, message: String },
}

fn format_command_error(command: &str, args: &[String], message: &str, exit_code: &Option<i32>) -> String {
    let args_str = args.join(" ");
    match exit_code {
        Some(code) => {
            if args_str.is_empty() {
                format!("command '{command}' failed with exit code {code}: {message}")
            } else {
                format!("command '{command} {args_str}' failed with exit code {code}: {message}")
            }
        }
        None => {
            if args_str.is_empty() {
                format!("command '{command}' failed: {message}")
            } else {
                format!("command '{command} {args_str}' failed: {message}")
            }
        }
    }
}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a staging error with an I/O source
    #[must_use]
    pub fn staging(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::Staging {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a staging error that has no underlying I/O failure
    #[must_use]
    pub fn staging_rejected(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Staging {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a file system error
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a command execution error
    #[must_use]
    pub fn command_execution(
        command: impl Into<String>,
        args: Vec<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Error::CommandExecution {
            command: command.into(),
            args,
            message: message.into(),
            exit_code,
        }
    }

    /// Create a missing output error
    #[must_use]
    pub fn missing_output(file: impl Into<String>) -> Self {
        Error::MissingOutput { file: file.into() }
    }

    /// Create a decode error
    #[must_use]
    pub fn decode(format: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a shared execution error
    #[must_use]
    pub fn shared_execution(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SharedExecution {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed without changing it.
    /// Tool timeouts are not errors; see `FailureKind::Timeout`.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::SharedExecution { .. })
    }

    /// Whether the error was caused by the caller rather than the environment
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::InvalidInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_formatting() {
        let err = Error::command_execution(
            "network",
            vec!["-res".to_string(), "out.res".to_string()],
            "no such file",
            None,
        );
        assert_eq!(
            err.to_string(),
            "command 'network -res out.res' failed: no such file"
        );

        let err = Error::command_execution("network", vec![], "boom", Some(3));
        assert_eq!(
            err.to_string(),
            "command 'network' failed with exit code 3: boom"
        );
    }

    #[test]
    fn test_staging_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::staging("/tmp/ws", "create workspace", io);
        assert!(err.to_string().contains("/tmp/ws"));
        assert!(err.source().is_some());

        let err = Error::staging_rejected("x/../y", "input name must be a plain file name");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::shared_execution("abc", "panicked").is_transient());
        assert!(!Error::missing_output("result.res").is_transient());
        assert!(Error::invalid_input("samples", "must be at least 1").is_caller_error());
        assert!(!Error::configuration("bad").is_caller_error());
    }
}
