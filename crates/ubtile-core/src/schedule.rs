//! Per-core tile loops
//!
//! A core whose share does not fit in scratch walks it in equal tiles of the
//! largest block-aligned length that leaves room for every live buffer. The
//! last iteration handles whatever remains; on exact division that is a full
//! tile, never a zero-length one.

use crate::align::{align_down, align_up, ceil_div, floor_div};
use crate::budget::PlatformBudget;
use crate::error::{Result, TilingError};
use crate::work::WorkDescriptor;
use serde::{Deserialize, Serialize};

/// Tile loop executed by one core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTileLoopPlan")]
pub struct TileLoopPlan {
    /// Elements moved per full tile
    pub tile_element_count: u64,
    /// Iterations including the tail tile (at least one)
    pub tile_loop_count: u32,
    /// Elements moved by the final iteration
    pub tail_tile_element_count: u64,
    /// Full tile length rounded up to the compute granularity
    pub tile_compute_element_count: u64,
    /// Tail tile length rounded up to the compute granularity
    pub tail_compute_element_count: u64,
}

#[derive(Deserialize)]
struct RawTileLoopPlan {
    tile_element_count: u64,
    tile_loop_count: u32,
    tail_tile_element_count: u64,
    tile_compute_element_count: u64,
    tail_compute_element_count: u64,
}

impl TryFrom<RawTileLoopPlan> for TileLoopPlan {
    type Error = TilingError;

    fn try_from(raw: RawTileLoopPlan) -> Result<Self> {
        if raw.tile_loop_count == 0 {
            return Err(TilingError::invalid("tile_loop_count", "must be at least one"));
        }
        if raw.tail_tile_element_count > raw.tile_element_count {
            return Err(TilingError::invalid(
                "tail_tile_element_count",
                format!(
                    "tail of {} elements exceeds the {}-element tile",
                    raw.tail_tile_element_count, raw.tile_element_count
                ),
            ));
        }
        (u64::from(raw.tile_loop_count) - 1)
            .checked_mul(raw.tile_element_count)
            .and_then(|full| full.checked_add(raw.tail_tile_element_count))
            .ok_or_else(|| TilingError::invalid("tile_loop_count", "covered elements overflow u64"))?;

        Ok(Self {
            tile_element_count: raw.tile_element_count,
            tile_loop_count: raw.tile_loop_count,
            tail_tile_element_count: raw.tail_tile_element_count,
            tile_compute_element_count: raw.tile_compute_element_count,
            tail_compute_element_count: raw.tail_compute_element_count,
        })
    }
}

impl TileLoopPlan {
    /// Plan for a single tile of `elements`
    pub const fn single(elements: u64) -> Self {
        Self {
            tile_element_count: elements,
            tile_loop_count: 1,
            tail_tile_element_count: elements,
            tile_compute_element_count: elements,
            tail_compute_element_count: elements,
        }
    }

    pub const fn is_single_tile(&self) -> bool {
        self.tile_loop_count == 1
    }

    /// Total elements walked by the loop
    pub const fn covered_elements(&self) -> u64 {
        self.tile_loop_count.saturating_sub(1) as u64 * self.tile_element_count + self.tail_tile_element_count
    }

    /// `(offset, length)` of every iteration relative to the core's range start
    pub fn tiles(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        let last = self.tile_loop_count.saturating_sub(1);
        (0..self.tile_loop_count).map(move |i| {
            let offset = u64::from(i) * self.tile_element_count;
            let len = if i == last {
                self.tail_tile_element_count
            } else {
                self.tile_element_count
            };
            (offset, len)
        })
    }
}

/// Computes tile loops under one scratch budget and buffer multiplicity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileScheduler {
    max_tile_elements: u64,
    block_elements: u64,
    element_size: u32,
    compute_align_bytes: Option<u32>,
}

impl TileScheduler {
    /// Derive the maximum tile length for `work` on `budget`
    ///
    /// # Errors
    ///
    /// - [`TilingError::InvalidConfig`] when the element size does not divide the block
    /// - [`TilingError::ScratchTooSmall`] when not even the minimum tile fits
    pub fn new(budget: &PlatformBudget, work: &WorkDescriptor) -> Result<Self> {
        let block_elements = budget.block_elements(work.element_size())?;
        let min_tile = work.resolved_min_tile_elements(block_elements);

        let too_small = || TilingError::ScratchTooSmall {
            element_size: work.element_size(),
            concurrent_buffers: work.concurrent_buffers(),
            min_tile_elements: min_tile,
            scratch_bytes: budget.scratch_bytes(),
            reserved_bytes: work.reserved_scratch_bytes(),
            block_bytes: budget.block_bytes(),
        };

        let usable = budget
            .scratch_bytes()
            .checked_sub(work.reserved_scratch_bytes())
            .ok_or_else(too_small)?;
        let per_buffer = floor_div(usable, u64::from(work.concurrent_buffers()));
        let max_tile_blocks = floor_div(per_buffer, u64::from(budget.block_bytes()));
        let max_tile_elements = max_tile_blocks * block_elements;

        if max_tile_elements == 0 || max_tile_elements < min_tile {
            return Err(too_small());
        }

        Ok(Self {
            max_tile_elements,
            block_elements,
            element_size: work.element_size(),
            compute_align_bytes: None,
        })
    }

    /// Also report lengths rounded up to `bytes` (a power of two)
    pub fn with_compute_align_bytes(mut self, bytes: Option<u32>) -> Self {
        self.compute_align_bytes = bytes;
        self
    }

    /// Largest block-aligned tile that fits every live buffer in scratch
    pub const fn max_tile_elements(&self) -> u64 {
        self.max_tile_elements
    }

    /// Scratch bytes one buffer occupies at the maximum tile length
    pub const fn max_tile_bytes(&self) -> u64 {
        self.max_tile_elements * self.element_size as u64
    }

    fn compute_len(&self, elements: u64) -> u64 {
        match self.compute_align_bytes {
            Some(bytes) => {
                let size = u64::from(self.element_size);
                align_up(elements * size, u64::from(bytes)) / size
            }
            None => elements,
        }
    }

    /// Tile loop for a core owning `core_elements` elements
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] if the loop would need more than
    /// `u32::MAX` iterations.
    pub fn schedule(&self, core_elements: u64) -> Result<TileLoopPlan> {
        if core_elements <= self.max_tile_elements {
            let compute = self.compute_len(core_elements);
            return Ok(TileLoopPlan {
                tile_compute_element_count: compute,
                tail_compute_element_count: compute,
                ..TileLoopPlan::single(core_elements)
            });
        }

        let tile = align_down(self.max_tile_elements, self.block_elements);
        let loops = ceil_div(core_elements, tile);
        let tile_loop_count = u32::try_from(loops).map_err(|_| {
            TilingError::invalid(
                "total_elements",
                format!("{core_elements} elements need {loops} tiles, more than u32::MAX"),
            )
        })?;
        // ceil_div makes the remainder land in 1..=tile, folding exact division
        let tail = core_elements - tile * (loops - 1);

        Ok(TileLoopPlan {
            tile_element_count: tile,
            tile_loop_count,
            tail_tile_element_count: tail,
            tile_compute_element_count: self.compute_len(tile),
            tail_compute_element_count: self.compute_len(tail),
        })
    }
}
