//! Display implementations for cache errors

use super::types::CacheError;
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::Serialization {
                key,
                operation,
                source,
                ..
            } => write!(f, "Failed to {operation:?} cache entry '{key}': {source}"),
            Self::Corruption { key, reason, .. } => {
                write!(f, "Cache corruption detected for entry '{key}': {reason}")
            }
            Self::VersionMismatch {
                key,
                expected_version,
                actual_version,
                ..
            } => write!(
                f,
                "Version mismatch for entry '{key}': expected v{expected_version}, found v{actual_version}"
            ),
            Self::IntegrityFailure {
                key,
                expected_crc,
                actual_crc,
                ..
            } => write!(
                f,
                "Integrity check failed for entry '{key}': expected crc {expected_crc:08x}, got {actual_crc:08x}"
            ),
            Self::Incomplete { path, reason, .. } => write!(
                f,
                "Cache at '{}' is incomplete: {reason}",
                path.display()
            ),
            Self::ConcurrencyConflict {
                path, operation, ..
            } => write!(
                f,
                "Cannot {operation} cache at '{}' while a first pass is still open",
                path.display()
            ),
            Self::Configuration { message, .. } => {
                write!(f, "Cache configuration error: {message}")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
