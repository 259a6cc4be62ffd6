use std::path::PathBuf;

/// Result type alias for nutflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nutflow operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed unit configuration, raised before any element is processed
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Structural misuse of a unit, e.g. chaining into a source
    #[error("usage error in '{unit}': {message}")]
    Usage { unit: String, message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Element serialization/deserialization errors
    #[error("serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Worker thread or pool failures
    #[error("worker {operation} failed: {message}")]
    Worker { operation: String, message: String },
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

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a usage-contract violation for the named unit
    #[must_use]
    pub fn usage(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Usage {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with context
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

    /// Create a serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create a serialization error with a source error
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a worker error
    #[must_use]
    pub fn worker(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Worker {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True for construction-time errors
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    /// True for usage-contract violations
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage { .. })
    }
}

// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", message.into(), base_error),
            }
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", f(), base_error),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_display() {
        let err = Error::usage("Range", "sources don't have inputs");
        assert_eq!(
            err.to_string(),
            "usage error in 'Range': sources don't have inputs"
        );
        assert!(err.is_usage());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_file_system_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::file_system("/tmp/x", "read", io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/x"));
    }

    #[test]
    fn test_context_wraps_as_configuration() {
        let res: std::result::Result<(), Error> = Err(Error::worker("spawn", "no threads"));
        let err = res.context("building pool").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("building pool"));
    }
}
