//! Error types for tiling computations

/// Result type for tiling operations
pub type Result<T> = std::result::Result<T, TilingError>;

/// Errors that can occur while computing a tiling plan
///
/// Both variants are deterministic given the inputs. Nothing is retried and
/// no partial plan is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TilingError {
    /// A platform budget, work descriptor or policy violates its invariants
    #[error("invalid tiling configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The usable scratch cannot hold one aligned tile per live buffer
    #[error(
        "scratch too small: {scratch_bytes} bytes ({reserved_bytes} reserved) cannot hold \
         {concurrent_buffers} buffer(s) of {min_tile_elements} element(s) x {element_size} bytes \
         at {block_bytes}-byte alignment"
    )]
    ScratchTooSmall {
        element_size: u32,
        concurrent_buffers: u32,
        min_tile_elements: u64,
        scratch_bytes: u64,
        reserved_bytes: u64,
        block_bytes: u32,
    },
}

impl TilingError {
    /// Create an invalid configuration error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Whether this error came from malformed input rather than a budget shortfall
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}
