//! Named edge-case policies
//!
//! Operators historically disagreed on tie-breaks and degenerate inputs.
//! Each disagreement is a field here so an operator states its choice as
//! configuration. [`TilingPolicy::default`] is the canonical behaviour.

use crate::error::{Result, TilingError};
use serde::{Deserialize, Serialize};

/// Which cores receive the extra block when blocks do not divide evenly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoreOrder {
    /// Cores `[0, tail_block_count)` are big cores
    #[default]
    BigCoresFirst,
    /// Cores `[used - tail_block_count, used)` are big cores
    BigCoresLast,
}

/// Plan shape for a zero-element tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyWorkPolicy {
    /// One core running one tile of zero elements
    #[default]
    DegenerateCore,
    /// One core running one tile of the minimum tile length
    MinimumTile,
}

/// How many cores to use when the whole tensor fits in a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmallInputPolicy {
    /// Spread blocks over all cores regardless of tile capacity
    #[default]
    Spread,
    /// Use one core if one tile can hold the entire tensor
    SingleCoreWhenFits,
}

/// Edge-case and tie-break choices for one tiling invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingPolicy {
    pub core_order: CoreOrder,
    pub empty_work: EmptyWorkPolicy,
    pub small_input: SmallInputPolicy,
    /// Upper bound on used cores, below the platform core count
    pub core_limit: Option<u32>,
    /// Vector-repeat granularity (bytes) for compute lengths, see
    /// [`crate::TileLoopPlan::tile_compute_element_count`]
    pub compute_align_bytes: Option<u32>,
}

impl TilingPolicy {
    /// The canonical policy
    pub fn canonical() -> Self {
        Self::default()
    }

    pub fn with_core_order(mut self, order: CoreOrder) -> Self {
        self.core_order = order;
        self
    }

    pub fn with_empty_work(mut self, empty_work: EmptyWorkPolicy) -> Self {
        self.empty_work = empty_work;
        self
    }

    pub fn with_small_input(mut self, small_input: SmallInputPolicy) -> Self {
        self.small_input = small_input;
        self
    }

    pub fn with_core_limit(mut self, limit: u32) -> Self {
        self.core_limit = Some(limit);
        self
    }

    pub fn with_compute_align_bytes(mut self, bytes: u32) -> Self {
        self.compute_align_bytes = Some(bytes);
        self
    }

    /// Check the policy's numeric fields
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] for a zero core limit or a compute
    /// alignment that is not a power of two.
    pub fn validate(&self) -> Result<()> {
        if self.core_limit == Some(0) {
            return Err(TilingError::invalid("core_limit", "must be greater than zero"));
        }
        if let Some(bytes) = self.compute_align_bytes {
            if !bytes.is_power_of_two() {
                return Err(TilingError::invalid(
                    "compute_align_bytes",
                    format!("must be a power of two, got {bytes}"),
                ));
            }
        }
        Ok(())
    }
}
