//! Target platform description
//!
//! A [`PlatformBudget`] is what the device query hands back: how many cores
//! can run a tile loop in parallel, how much scratch (UB) each one owns and
//! the alignment every scratch buffer and global-memory range must respect.
//! Querying the device is the caller's job; this type only validates.

use crate::error::{Result, TilingError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alignment granularity of scratch buffers on current vector cores
pub const DEFAULT_BLOCK_BYTES: u32 = 32;

/// Core count used by [`PlatformBudget::default`]
pub const DEFAULT_CORE_COUNT: u32 = 40;

/// Scratch capacity used by [`PlatformBudget::default`] (192 KiB)
pub const DEFAULT_SCRATCH_BYTES: u64 = 192 * 1024;

/// Immutable per-target limits consumed by the partitioner and scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPlatformBudget")]
pub struct PlatformBudget {
    core_count: u32,
    scratch_bytes: u64,
    block_bytes: u32,
}

#[derive(Deserialize)]
struct RawPlatformBudget {
    core_count: u32,
    scratch_bytes: u64,
    #[serde(default = "default_block_bytes")]
    block_bytes: u32,
}

fn default_block_bytes() -> u32 {
    DEFAULT_BLOCK_BYTES
}

impl TryFrom<RawPlatformBudget> for PlatformBudget {
    type Error = TilingError;

    fn try_from(raw: RawPlatformBudget) -> Result<Self> {
        Self::new(raw.core_count, raw.scratch_bytes, raw.block_bytes)
    }
}

impl PlatformBudget {
    /// Validate and build a platform budget
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] when `core_count` or `scratch_bytes` is
    /// zero, or `block_bytes` is not a power of two.
    pub fn new(core_count: u32, scratch_bytes: u64, block_bytes: u32) -> Result<Self> {
        if core_count == 0 {
            return Err(TilingError::invalid("core_count", "must be greater than zero"));
        }
        if scratch_bytes == 0 {
            return Err(TilingError::invalid("scratch_bytes", "must be greater than zero"));
        }
        if !block_bytes.is_power_of_two() {
            return Err(TilingError::invalid(
                "block_bytes",
                format!("must be a power of two, got {block_bytes}"),
            ));
        }
        Ok(Self {
            core_count,
            scratch_bytes,
            block_bytes,
        })
    }

    /// Number of parallel cores available to one kernel launch
    pub const fn core_count(&self) -> u32 {
        self.core_count
    }

    /// Scratch capacity of a single core in bytes
    pub const fn scratch_bytes(&self) -> u64 {
        self.scratch_bytes
    }

    /// Alignment granularity in bytes
    pub const fn block_bytes(&self) -> u32 {
        self.block_bytes
    }

    /// Number of `element_size`-byte elements in one alignment block
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] when the element size is zero or does
    /// not divide the block size, since a block must hold whole elements.
    pub fn block_elements(&self, element_size: u32) -> Result<u64> {
        if element_size == 0 {
            return Err(TilingError::invalid("element_size", "must be greater than zero"));
        }
        if self.block_bytes % element_size != 0 {
            return Err(TilingError::invalid(
                "element_size",
                format!(
                    "{element_size} bytes does not divide the {}-byte alignment block",
                    self.block_bytes
                ),
            ));
        }
        Ok(u64::from(self.block_bytes / element_size))
    }
}

impl Default for PlatformBudget {
    fn default() -> Self {
        Self {
            core_count: DEFAULT_CORE_COUNT,
            scratch_bytes: DEFAULT_SCRATCH_BYTES,
            block_bytes: DEFAULT_BLOCK_BYTES,
        }
    }
}

impl fmt::Display for PlatformBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cores x {} B scratch ({} B blocks)",
            self.core_count, self.scratch_bytes, self.block_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_budget() {
        let budget = PlatformBudget::new(8, 2048, 32).unwrap();
        assert_eq!(budget.core_count(), 8);
        assert_eq!(budget.scratch_bytes(), 2048);
        assert_eq!(budget.block_bytes(), 32);
        assert_eq!(budget.to_string(), "8 cores x 2048 B scratch (32 B blocks)");
    }

    #[test]
    fn test_rejects_zero_cores_and_scratch() {
        assert!(PlatformBudget::new(0, 2048, 32).unwrap_err().is_invalid_config());
        assert!(PlatformBudget::new(8, 0, 32).unwrap_err().is_invalid_config());
    }

    #[test]
    fn test_rejects_non_power_of_two_block() {
        for block in [0, 3, 24, 48] {
            let err = PlatformBudget::new(8, 2048, block).unwrap_err();
            assert!(matches!(err, TilingError::InvalidConfig { field: "block_bytes", .. }));
        }
    }

    #[test]
    fn test_block_elements() {
        let budget = PlatformBudget::new(8, 2048, 32).unwrap();
        assert_eq!(budget.block_elements(4).unwrap(), 8);
        assert_eq!(budget.block_elements(2).unwrap(), 16);
        assert_eq!(budget.block_elements(1).unwrap(), 32);
        assert!(budget.block_elements(0).is_err());
        assert!(budget.block_elements(3).is_err());
        assert!(budget.block_elements(64).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let budget: PlatformBudget =
            serde_json::from_str(r#"{"core_count": 4, "scratch_bytes": 4096}"#).unwrap();
        assert_eq!(budget.block_bytes(), DEFAULT_BLOCK_BYTES);

        let bad = serde_json::from_str::<PlatformBudget>(
            r#"{"core_count": 4, "scratch_bytes": 4096, "block_bytes": 30}"#,
        );
        assert!(bad.is_err());
    }
}
