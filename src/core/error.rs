//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Path rejected by validation
    #[error("Invalid log path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Logger already closed
    #[error("Logger is closed")]
    LoggerClosed,

    /// Writer already closed
    #[error("Writer '{0}' is closed")]
    WriterClosed(String),

    /// Writer limit reached
    #[error("Writer limit reached: {current}/{max} writers registered")]
    WriterLimitExceeded { current: usize, max: usize },

    /// Some children of a multi-writer failed
    ///
    /// `written` is the byte count reported to the caller, which is the full
    /// payload length because at least one child received it.
    #[error("Partial write: {failed}/{total} writers failed: {}", .errors.join("; "))]
    PartialWrite {
        written: usize,
        failed: usize,
        total: usize,
        errors: Vec<String>,
    },

    /// Every child of a multi-writer failed
    #[error("All {total} writers failed: {}", .errors.join("; "))]
    AllWritersFailed { total: usize, errors: Vec<String> },

    /// Several errors collected during close
    #[error("{} errors while closing: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<LoggerError>),

    /// Earlier close outcome replayed to later callers
    #[error("Close previously failed: {0}")]
    CloseFailed(String),

    /// Background work did not finish within the grace period
    #[error("Timed out after {timeout_ms}ms waiting for {component} background tasks")]
    ShutdownTimeout { component: String, timeout_ms: u128 },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Compression error
    #[error("Compression failed for '{path}': {message}")]
    CompressionError { path: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

fn join_errors(errors: &[LoggerError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        LoggerError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a compression error
    pub fn compression(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::CompressionError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a shutdown timeout error
    pub fn shutdown_timeout(component: impl Into<String>, timeout: std::time::Duration) -> Self {
        LoggerError::ShutdownTimeout {
            component: component.into(),
            timeout_ms: timeout.as_millis(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Collapse a list of errors: none is `Ok`, one is returned as-is,
    /// several become [`LoggerError::Multiple`].
    pub fn aggregate(mut errors: Vec<LoggerError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(LoggerError::Multiple(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("SecurityConfig", "max_writers must be positive");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::invalid_path("../etc/passwd", "parent directory traversal");
        assert!(matches!(err, LoggerError::InvalidPath { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::WriterLimitExceeded { current: 3, max: 3 };
        assert_eq!(err.to_string(), "Writer limit reached: 3/3 writers registered");

        let err = LoggerError::file_rotation("/var/log/app.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': Disk full"
        );

        let err = LoggerError::PartialWrite {
            written: 10,
            failed: 1,
            total: 3,
            errors: vec!["writer #1: broken pipe".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Partial write: 1/3 writers failed: writer #1: broken pipe"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }

    #[test]
    fn test_aggregate() {
        assert!(LoggerError::aggregate(Vec::new()).is_ok());

        let single = LoggerError::aggregate(vec![LoggerError::writer("one")]);
        assert!(matches!(single, Err(LoggerError::WriterError(_))));

        let many = LoggerError::aggregate(vec![LoggerError::writer("one"), LoggerError::writer("two")]);
        match many {
            Err(LoggerError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
