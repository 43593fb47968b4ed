//! Error types for tiling record encoding

use ubtile_core::TilingError;

/// Result type for record encoding and launch packaging
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors raised while turning a plan into launch parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A read ran past the end of the record buffer
    #[error("record buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// The encoded record does not fit the launcher's raw tiling buffer
    #[error("tiling record of {size} bytes exceeds launcher capacity of {capacity} bytes")]
    CapacityExceeded { size: usize, capacity: usize },

    /// A plan value does not fit the width of its record field
    #[error("value {value} does not fit record field {field}")]
    FieldOverflow { field: &'static str, value: u64 },

    /// Planning failed before anything was encoded
    #[error(transparent)]
    Tiling(#[from] TilingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RecordError::BufferTooSmall { needed: 8, available: 4 };
        assert_eq!(err.to_string(), "record buffer too small: need 8 bytes, have 4");
    }

    #[test]
    fn test_from_tiling_error() {
        let err: RecordError = TilingError::invalid("core_count", "must be greater than zero").into();
        assert!(matches!(err, RecordError::Tiling(TilingError::InvalidConfig { .. })));
        assert_eq!(
            err.to_string(),
            "invalid tiling configuration: core_count must be greater than zero"
        );
    }
}
