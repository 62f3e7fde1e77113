//! Error types for the gpulist library

use thiserror::Error;

/// Status code the I/O Registry returns when an object or property does not exist
/// (`kIOReturnNotFound`)
pub const STATUS_NOT_FOUND: i32 = 0xe000_02f0_u32 as i32;

/// Main error type for registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No hardware registry exists on this platform
    #[error("Hardware registry is not available on this platform")]
    Unavailable,

    /// A registry call returned a non-success status
    #[error("{call} failed with status 0x{status:08x}")]
    Call {
        /// Name of the registry call
        call: &'static str,
        /// Raw status code returned by the call
        status: i32,
    },

    /// Name cannot be handed to the platform (contains a NUL byte)
    #[error("Invalid registry name: {0:?}")]
    InvalidName(String),
}

impl RegistryError {
    /// Shorthand for a failed registry call
    pub fn call(call: &'static str, status: i32) -> Self {
        RegistryError::Call { call, status }
    }

    /// Shorthand for a lookup that found nothing
    pub fn not_found(call: &'static str) -> Self {
        RegistryError::call(call, STATUS_NOT_FOUND)
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_formats_status_as_hex() {
        let err = RegistryError::not_found("IORegistryEntryGetParentEntry");
        assert_eq!(
            err.to_string(),
            "IORegistryEntryGetParentEntry failed with status 0xe00002f0"
        );
    }

    #[test]
    fn test_invalid_name_quotes_the_name() {
        let err = RegistryError::InvalidName("mod\0el".to_string());
        assert_eq!(err.to_string(), "Invalid registry name: \"mod\\0el\"");
    }
}
