//! # Error Types
//!
//! Only resource exhaustion and configuration problems are reported through
//! [`EcsError`]. Contract violations (double insert, removing an absent
//! entity, stale handles) are programmer errors and panic instead.

use thiserror::Error;

/// Errors that can be returned by the storage engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The device buffer allocator ran out of budget.
    #[error("out of device memory: requested {requested} bytes, {available} bytes available")]
    OutOfDeviceMemory {
        /// Size of the rejected allocation in bytes.
        requested: u64,
        /// Remaining budget at the time of the request.
        available: u64,
    },

    /// The host-visible mapping of a device buffer could not be allocated.
    #[error("host allocation failed for {requested_bytes} bytes")]
    HostAllocation {
        /// Size of the mapping that was requested.
        requested_bytes: u64,
    },

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read config {path}: {reason}")]
    ConfigIo {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },
}

/// Result type for storage operations.
pub type EcsResult<T> = Result<T, EcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EcsError::OutOfDeviceMemory {
            requested: 4096,
            available: 1024,
        };
        assert_eq!(
            err.to_string(),
            "out of device memory: requested 4096 bytes, 1024 bytes available"
        );

        let err = EcsError::InvalidConfig("growth_factor must be at least 2".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: growth_factor must be at least 2"
        );
    }
}
