//! Splitting a tensor across cores
//!
//! Work is counted in alignment blocks. The block count is divided by the
//! number of used cores; the remainder (`tail_block_count`) goes one block at
//! a time to "big" cores, the rest are "small" cores. Per-core ranges are
//! block aligned except the final core, which stops at the real tensor end.
//!
//! ```text
//! 1000 f32 on 8 cores, 32-byte blocks (8 elements):
//!   125 blocks = 8 x 15 + 5
//!   cores 0..5  -> 16 blocks (128 elements)   big
//!   cores 5..8  -> 15 blocks (120 elements)   small
//! ```

use crate::align::{ceil_div, floor_div};
use crate::budget::PlatformBudget;
use crate::error::{Result, TilingError};
use crate::policy::CoreOrder;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Per-core element counts produced by [`CorePartitioner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCoreAssignment")]
pub struct CoreAssignment {
    /// Elements given to each small core
    pub small_core_element_count: u64,
    pub small_core_count: u32,
    /// Elements given to each big core, `0` when there are no big cores
    pub big_core_element_count: u64,
    pub big_core_count: u32,
    /// Blocks left over after the even split, one per big core
    pub tail_block_count: u32,
    /// Real element count of the final used core
    pub last_core_element_count: u64,
    pub total_elements: u64,
    /// Elements per alignment block
    pub block_elements: u64,
    pub core_order: CoreOrder,
}

#[derive(Deserialize)]
struct RawCoreAssignment {
    small_core_element_count: u64,
    small_core_count: u32,
    big_core_element_count: u64,
    big_core_count: u32,
    tail_block_count: u32,
    last_core_element_count: u64,
    total_elements: u64,
    block_elements: u64,
    core_order: CoreOrder,
}

impl TryFrom<RawCoreAssignment> for CoreAssignment {
    type Error = TilingError;

    fn try_from(raw: RawCoreAssignment) -> Result<Self> {
        let assignment = Self {
            small_core_element_count: raw.small_core_element_count,
            small_core_count: raw.small_core_count,
            big_core_element_count: raw.big_core_element_count,
            big_core_count: raw.big_core_count,
            tail_block_count: raw.tail_block_count,
            last_core_element_count: raw.last_core_element_count,
            total_elements: raw.total_elements,
            block_elements: raw.block_elements,
            core_order: raw.core_order,
        };
        assignment.validate()?;
        Ok(assignment)
    }
}

impl CoreAssignment {
    /// Number of cores that receive work (always at least one)
    pub const fn used_core_count(&self) -> u32 {
        self.small_core_count.saturating_add(self.big_core_count)
    }

    /// Check that the counts describe one contiguous cover of the tensor
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] naming the inconsistent field.
    pub fn validate(&self) -> Result<()> {
        let used = self
            .small_core_count
            .checked_add(self.big_core_count)
            .ok_or_else(|| TilingError::invalid("big_core_count", "core count overflows u32"))?;
        if used == 0 {
            return Err(TilingError::invalid("small_core_count", "at least one core must be used"));
        }
        if self.block_elements == 0 {
            return Err(TilingError::invalid("block_elements", "must be greater than zero"));
        }
        if self.tail_block_count != self.big_core_count {
            return Err(TilingError::invalid(
                "tail_block_count",
                format!("{} tail blocks for {} big cores", self.tail_block_count, self.big_core_count),
            ));
        }

        let covered = u64::from(self.small_core_count)
            .checked_mul(self.small_core_element_count)
            .zip(u64::from(self.big_core_count).checked_mul(self.big_core_element_count))
            .and_then(|(small, big)| small.checked_add(big))
            .and_then(|allocated| allocated.checked_sub(self.class_element_count(used - 1)))
            .and_then(|rest| rest.checked_add(self.last_core_element_count));
        if covered != Some(self.total_elements) {
            return Err(TilingError::invalid(
                "total_elements",
                format!("core ranges do not cover {} elements", self.total_elements),
            ));
        }
        Ok(())
    }

    /// Whether big and small cores carry the same load
    pub const fn is_balanced(&self) -> bool {
        self.tail_block_count == 0
    }

    /// Whether `core` is one of the big cores
    pub fn is_big_core(&self, core: u32) -> bool {
        if core >= self.used_core_count() {
            return false;
        }
        match self.core_order {
            CoreOrder::BigCoresFirst => core < self.big_core_count,
            CoreOrder::BigCoresLast => core >= self.small_core_count,
        }
    }

    /// Allocated (block-aligned) element count of `core`'s class
    fn class_element_count(&self, core: u32) -> u64 {
        if self.is_big_core(core) {
            self.big_core_element_count
        } else {
            self.small_core_element_count
        }
    }

    /// Index of the final used core
    pub const fn last_core(&self) -> u32 {
        self.used_core_count().saturating_sub(1)
    }

    /// Whether the last core's real count is shorter than its class count
    pub fn last_core_is_truncated(&self) -> bool {
        self.last_core_element_count != self.class_element_count(self.last_core())
    }

    /// Real element count processed by `core`, `0` for unused cores
    pub fn core_element_count(&self, core: u32) -> u64 {
        self.core_range(core).map_or(0, |range| range.end - range.start)
    }

    /// Half-open element range of `core`, `None` for unused cores
    pub fn core_range(&self, core: u32) -> Option<Range<u64>> {
        if core >= self.used_core_count() {
            return None;
        }
        let core64 = u64::from(core);
        let start = match self.core_order {
            CoreOrder::BigCoresFirst => {
                let big = u64::from(self.big_core_count);
                if core64 < big {
                    core64 * self.big_core_element_count
                } else {
                    big * self.big_core_element_count + (core64 - big) * self.small_core_element_count
                }
            }
            CoreOrder::BigCoresLast => {
                let small = u64::from(self.small_core_count);
                if core64 < small {
                    core64 * self.small_core_element_count
                } else {
                    small * self.small_core_element_count + (core64 - small) * self.big_core_element_count
                }
            }
        };
        let end = if core == self.last_core() {
            self.total_elements
        } else {
            start + self.class_element_count(core)
        };
        Some(start..end)
    }

    /// Ranges of all used cores in core order
    pub fn ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        (0..self.used_core_count()).filter_map(move |core| self.core_range(core))
    }
}

/// Distributes block-aligned work over up to `core_count` cores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorePartitioner {
    core_count: u32,
    block_elements: u64,
    order: CoreOrder,
}

impl CorePartitioner {
    /// Partitioner for `element_size`-byte elements on `budget`
    ///
    /// # Errors
    ///
    /// [`crate::TilingError::InvalidConfig`] when the element size does not
    /// divide the budget's block size.
    pub fn new(budget: &PlatformBudget, element_size: u32, order: CoreOrder) -> Result<Self> {
        Ok(Self {
            core_count: budget.core_count(),
            block_elements: budget.block_elements(element_size)?,
            order,
        })
    }

    /// Restrict the partitioner to at most `cores` cores (minimum one)
    pub fn with_max_cores(mut self, cores: u32) -> Self {
        self.core_count = self.core_count.min(cores.max(1));
        self
    }

    pub const fn core_count(&self) -> u32 {
        self.core_count
    }

    pub const fn block_elements(&self) -> u64 {
        self.block_elements
    }

    /// Split `total_elements` across the cores
    pub fn partition(&self, total_elements: u64) -> CoreAssignment {
        let total_blocks = ceil_div(total_elements, self.block_elements);

        if total_blocks == 0 {
            tracing::trace!("empty tensor, assigning one degenerate core");
            return CoreAssignment {
                small_core_element_count: 0,
                small_core_count: 1,
                big_core_element_count: 0,
                big_core_count: 0,
                tail_block_count: 0,
                last_core_element_count: 0,
                total_elements: 0,
                block_elements: self.block_elements,
                core_order: self.order,
            };
        }

        // total_blocks <= core_count degenerates to one block per used core
        let used = total_blocks.min(u64::from(self.core_count));
        let per_core_blocks = floor_div(total_blocks, used);
        let tail_blocks = total_blocks % used;

        let small_core_element_count = per_core_blocks * self.block_elements;
        let big_core_element_count = if tail_blocks == 0 {
            0
        } else {
            (per_core_blocks + 1) * self.block_elements
        };
        // used <= core_count: u32 and tail_blocks < used
        let big_core_count = tail_blocks as u32;
        let small_core_count = used as u32 - big_core_count;

        let last_class = match self.order {
            CoreOrder::BigCoresLast if big_core_count > 0 => big_core_element_count,
            _ => small_core_element_count,
        };
        let padding = total_blocks * self.block_elements - total_elements;
        let last_core_element_count = last_class - padding;

        tracing::trace!(
            total_blocks,
            used,
            per_core_blocks,
            tail_blocks,
            padding,
            "partitioned blocks across cores"
        );

        CoreAssignment {
            small_core_element_count,
            small_core_count,
            big_core_element_count,
            big_core_count,
            tail_block_count: big_core_count,
            last_core_element_count,
            total_elements,
            block_elements: self.block_elements,
            core_order: self.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partitioner(cores: u32, order: CoreOrder) -> CorePartitioner {
        let budget = PlatformBudget::new(cores, 2048, 32).unwrap();
        CorePartitioner::new(&budget, 4, order).unwrap()
    }

    fn assert_covers(assignment: &CoreAssignment) {
        let mut cursor = 0;
        for range in assignment.ranges() {
            assert_eq!(range.start, cursor);
            assert!(range.end >= range.start);
            cursor = range.end;
        }
        assert_eq!(cursor, assignment.total_elements);
    }

    #[test]
    fn test_thousand_floats_on_eight_cores() {
        let a = partitioner(8, CoreOrder::BigCoresFirst).partition(1000);
        assert_eq!(a.used_core_count(), 8);
        assert_eq!(a.tail_block_count, 5);
        assert_eq!(a.big_core_count, 5);
        assert_eq!(a.big_core_element_count, 128);
        assert_eq!(a.small_core_count, 3);
        assert_eq!(a.small_core_element_count, 120);
        assert_eq!(a.last_core_element_count, 120);
        assert!(!a.last_core_is_truncated());
        assert_eq!(a.core_range(0), Some(0..128));
        assert_eq!(a.core_range(4), Some(512..640));
        assert_eq!(a.core_range(5), Some(640..760));
        assert_eq!(a.core_range(7), Some(880..1000));
        assert_eq!(a.core_range(8), None);
        assert_covers(&a);
    }

    #[test]
    fn test_big_cores_last_ordering() {
        let a = partitioner(8, CoreOrder::BigCoresLast).partition(1000);
        assert!(!a.is_big_core(0));
        assert!(!a.is_big_core(2));
        assert!(a.is_big_core(3));
        assert!(a.is_big_core(7));
        assert_eq!(a.core_range(0), Some(0..120));
        assert_eq!(a.core_range(3), Some(360..488));
        assert_eq!(a.last_core_element_count, 128);
        assert_covers(&a);
    }

    #[test]
    fn test_fewer_blocks_than_cores() {
        // 20 elements = 3 blocks, last one partial
        let a = partitioner(8, CoreOrder::BigCoresFirst).partition(20);
        assert_eq!(a.used_core_count(), 3);
        assert_eq!(a.small_core_element_count, 8);
        assert_eq!(a.big_core_count, 0);
        assert_eq!(a.big_core_element_count, 0);
        assert_eq!(a.last_core_element_count, 4);
        assert!(a.last_core_is_truncated());
        assert_eq!(a.core_element_count(2), 4);
        assert_eq!(a.core_element_count(3), 0);
        assert_covers(&a);
    }

    #[test]
    fn test_empty_tensor_is_one_degenerate_core() {
        let a = partitioner(8, CoreOrder::BigCoresFirst).partition(0);
        assert_eq!(a.used_core_count(), 1);
        assert_eq!(a.small_core_element_count, 0);
        assert_eq!(a.big_core_element_count, 0);
        assert_eq!(a.core_range(0), Some(0..0));
        assert_covers(&a);
    }

    #[test]
    fn test_exact_division_has_no_tail() {
        // 8 cores x 8 elements per block x 4 blocks
        let a = partitioner(8, CoreOrder::BigCoresFirst).partition(256);
        assert_eq!(a.tail_block_count, 0);
        assert!(a.is_balanced());
        assert_eq!(a.small_core_count, 8);
        assert_eq!(a.small_core_element_count, 32);
        assert_covers(&a);
    }

    #[test]
    fn test_partial_last_block_with_big_cores() {
        // 1003 elements: 126 blocks, last block holds 3 elements
        let a = partitioner(8, CoreOrder::BigCoresFirst).partition(1003);
        assert_eq!(a.tail_block_count, 6);
        assert_eq!(a.small_core_count, 2);
        assert_eq!(a.last_core_element_count, 120 - 5);
        assert_covers(&a);

        let b = partitioner(8, CoreOrder::BigCoresLast).partition(1003);
        assert_eq!(b.last_core_element_count, 128 - 5);
        assert_covers(&b);
    }

    #[test]
    fn test_max_cores_clamps_to_one() {
        let p = partitioner(8, CoreOrder::BigCoresFirst).with_max_cores(0);
        assert_eq!(p.core_count(), 1);
        let a = p.partition(1000);
        assert_eq!(a.used_core_count(), 1);
        assert_eq!(a.small_core_element_count, 1000);
        assert_covers(&a);
    }

    #[test]
    fn test_deserialize_round_trip() {
        for total in [0, 20, 1000, 1003] {
            let a = partitioner(8, CoreOrder::BigCoresLast).partition(total);
            let json = serde_json::to_string(&a).unwrap();
            assert_eq!(serde_json::from_str::<CoreAssignment>(&json).unwrap(), a);
        }
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_counts() {
        let a = partitioner(8, CoreOrder::BigCoresFirst).partition(1000);
        let mut json = serde_json::to_value(a).unwrap();
        json["small_core_count"] = 0.into();
        json["big_core_count"] = 0.into();
        json["tail_block_count"] = 0.into();
        assert!(serde_json::from_value::<CoreAssignment>(json).is_err());

        let mut short = serde_json::to_value(a).unwrap();
        short["total_elements"] = 2000.into();
        assert!(serde_json::from_value::<CoreAssignment>(short).is_err());

        let mut no_block = serde_json::to_value(a).unwrap();
        no_block["block_elements"] = 0.into();
        assert!(serde_json::from_value::<CoreAssignment>(no_block).is_err());
    }

    #[test]
    fn test_zero_core_accessors_do_not_underflow() {
        let a = CoreAssignment {
            small_core_count: 0,
            ..partitioner(8, CoreOrder::BigCoresFirst).partition(0)
        };
        assert_eq!(a.last_core(), 0);
        assert_eq!(a.core_range(0), None);
        assert_eq!(a.ranges().count(), 0);
        assert!(a.validate().is_err());
    }
}
