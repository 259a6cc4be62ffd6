//! Error conversion utilities

use super::types::{CacheError, RecoveryHint, SerializationOp};
use std::path::PathBuf;

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let recovery_hint = match error.kind() {
            ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
                path: PathBuf::from("."),
            },
            ErrorKind::NotFound => RecoveryHint::Recreate,
            ErrorKind::AlreadyExists => RecoveryHint::ClearAndRetry,
            _ => RecoveryHint::Manual {
                instructions: "Inspect the cache directory".to_string(),
            },
        };

        Self::Io {
            path: PathBuf::from("."),
            operation: "unknown",
            source: error,
            recovery_hint,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        let operation = if error.is_io() {
            SerializationOp::Encode
        } else {
            SerializationOp::Decode
        };
        Self::Serialization {
            key: "manifest.json".to_string(),
            operation,
            source: Box::new(error),
            recovery_hint: RecoveryHint::ClearAndRetry,
        }
    }
}

impl From<bincode::Error> for CacheError {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization {
            key: String::new(),
            operation: SerializationOp::Decode,
            source: error,
            recovery_hint: RecoveryHint::ClearAndRetry,
        }
    }
}

impl From<nutflow_core::Error> for CacheError {
    fn from(error: nutflow_core::Error) -> Self {
        match error {
            nutflow_core::Error::FileSystem {
                path,
                source,
                ..
            } => Self::Io {
                recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
                path,
                operation: "write",
                source,
            },
            other => Self::Configuration {
                message: other.to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            },
        }
    }
}

/// Convert cache errors to core errors
impl From<CacheError> for nutflow_core::Error {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Io {
                path,
                operation,
                source,
                ..
            } => nutflow_core::Error::file_system(path, operation, source),
            CacheError::Configuration { message, .. } => {
                nutflow_core::Error::configuration(message)
            }
            CacheError::Serialization {
                key,
                operation,
                source,
                ..
            } => nutflow_core::Error::serialization_with_source(
                format!("failed to {operation:?} cache entry '{key}'"),
                source,
            ),
            other => nutflow_core::Error::serialization(other.to_string()),
        }
    }
}
