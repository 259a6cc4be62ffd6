//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::Corruption { recovery_hint, .. }
            | Self::VersionMismatch { recovery_hint, .. }
            | Self::IntegrityFailure { recovery_hint, .. }
            | Self::Incomplete { recovery_hint, .. }
            | Self::ConcurrencyConflict { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Whether clearing the cache and running the upstream again fixes it
    #[must_use]
    pub const fn is_recoverable_by_clear(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::ClearAndRetry)
    }

    /// Check if this error indicates data corruption
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Corruption { .. } | Self::IntegrityFailure { .. } | Self::VersionMismatch { .. }
        )
    }

    /// Check if this error means the cache was left half-written
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_corruption_classification() {
        let err = CacheError::IntegrityFailure {
            key: "cache_0000000001.bin".to_string(),
            expected_crc: 1,
            actual_crc: 2,
            recovery_hint: RecoveryHint::ClearAndRetry,
        };
        assert!(err.is_corruption());
        assert!(err.is_recoverable_by_clear());
        assert!(!err.is_incomplete());
        assert!(err.to_string().contains("00000001"));
    }

    #[test]
    fn test_incomplete_classification() {
        let err = CacheError::Incomplete {
            path: PathBuf::from("/tmp/cache"),
            reason: "manifest.json is missing".to_string(),
            recovery_hint: RecoveryHint::ClearAndRetry,
        };
        assert!(err.is_incomplete());
        assert!(!err.is_corruption());
        assert_eq!(
            err.to_string(),
            "Cache at '/tmp/cache' is incomplete: manifest.json is missing"
        );
    }
}
