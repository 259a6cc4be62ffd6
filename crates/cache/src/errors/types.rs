//! Core error types for the cache

use std::path::PathBuf;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// I/O errors while reading or writing the cache directory
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// An element could not be encoded or decoded
    Serialization {
        key: String,
        operation: SerializationOp,
        source: Box<dyn std::error::Error + Send + Sync>,
        recovery_hint: RecoveryHint,
    },

    /// An entry file is malformed
    Corruption {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// An entry was written by an incompatible format version
    VersionMismatch {
        key: String,
        expected_version: u32,
        actual_version: u32,
        recovery_hint: RecoveryHint,
    },

    /// Payload checksum does not match the header
    IntegrityFailure {
        key: String,
        expected_crc: u32,
        actual_crc: u32,
        recovery_hint: RecoveryHint,
    },

    /// The directory holds entries from a first pass that never finished
    Incomplete {
        path: PathBuf,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// The cache is already being written by another evaluation
    ConcurrencyConflict {
        path: PathBuf,
        operation: &'static str,
        recovery_hint: RecoveryHint,
    },

    /// Invalid cache configuration
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Clear the cache and run a fresh first pass
    ClearAndRetry,

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Check disk space and clean up if needed
    CheckDiskSpace,

    /// Recreate cache file/directory
    Recreate,

    /// Finish consuming the running pass before starting another
    WaitForWriter,

    /// Update cache configuration
    UpdateConfiguration,

    /// No automated recovery possible
    Manual { instructions: String },
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}
