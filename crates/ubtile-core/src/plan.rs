//! Plan assembly
//!
//! [`Tiler`] runs the full pipeline for one operator invocation:
//!
//! ```text
//! PlatformBudget + WorkDescriptor + TilingPolicy
//!         │
//!         ├─► TileScheduler::new      (max tile under scratch budget)
//!         ├─► CorePartitioner         (small / big core counts)
//!         ├─► TileScheduler::schedule (small, big, truncated last core)
//!         ▼
//!     TilingPlan
//! ```
//!
//! The computation is pure: identical inputs give bit-identical plans, and
//! independent invocations may run on any number of threads.

use crate::budget::PlatformBudget;
use crate::error::{Result, TilingError};
use crate::partition::{CoreAssignment, CorePartitioner};
use crate::policy::{EmptyWorkPolicy, SmallInputPolicy, TilingPolicy};
use crate::schedule::{TileLoopPlan, TileScheduler};
use crate::work::WorkDescriptor;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Tiling key when every used core runs the same plan
pub const TILING_KEY_BALANCED: u32 = 0;

/// Tiling key when big cores carry one extra block
pub const TILING_KEY_WITH_BIG_CORES: u32 = 1;

/// Final immutable schedule handed to the kernel launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTilingPlan")]
pub struct TilingPlan {
    pub core_assignment: CoreAssignment,
    pub small_core_plan: TileLoopPlan,
    pub big_core_plan: TileLoopPlan,
    /// Loop of the final core over its real (unaligned) element count
    pub last_core_plan: TileLoopPlan,
    /// Parallel execution contexts to launch
    pub used_core_count: u32,
    /// Kernel variant selector, see [`TILING_KEY_BALANCED`]
    pub tiling_key: u32,
    /// Largest tile the scratch budget allows, in elements
    pub max_tile_elements: u64,
    pub element_size: u32,
    pub concurrent_buffers: u32,
}

#[derive(Deserialize)]
struct RawTilingPlan {
    core_assignment: CoreAssignment,
    small_core_plan: TileLoopPlan,
    big_core_plan: TileLoopPlan,
    last_core_plan: TileLoopPlan,
    used_core_count: u32,
    tiling_key: u32,
    max_tile_elements: u64,
    element_size: u32,
    concurrent_buffers: u32,
}

impl TryFrom<RawTilingPlan> for TilingPlan {
    type Error = TilingError;

    fn try_from(raw: RawTilingPlan) -> Result<Self> {
        let assigned = raw.core_assignment.used_core_count();
        if raw.used_core_count != assigned {
            return Err(TilingError::invalid(
                "used_core_count",
                format!("{} cores launched, {assigned} assigned", raw.used_core_count),
            ));
        }
        if raw.element_size == 0 || raw.concurrent_buffers == 0 {
            return Err(TilingError::invalid(
                "element_size",
                "element size and buffer count must be greater than zero",
            ));
        }
        Ok(Self {
            core_assignment: raw.core_assignment,
            small_core_plan: raw.small_core_plan,
            big_core_plan: raw.big_core_plan,
            last_core_plan: raw.last_core_plan,
            used_core_count: raw.used_core_count,
            tiling_key: raw.tiling_key,
            max_tile_elements: raw.max_tile_elements,
            element_size: raw.element_size,
            concurrent_buffers: raw.concurrent_buffers,
        })
    }
}

/// Work of a single core: its element range and tile loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreWork {
    pub core: u32,
    pub range: Range<u64>,
    pub plan: TileLoopPlan,
}

impl TilingPlan {
    /// Tile loop executed by `core`, `None` for unused cores
    pub fn core_plan(&self, core: u32) -> Option<TileLoopPlan> {
        let assignment = &self.core_assignment;
        if core >= assignment.used_core_count() {
            return None;
        }
        Some(if core == assignment.last_core() {
            self.last_core_plan
        } else if assignment.is_big_core(core) {
            self.big_core_plan
        } else {
            self.small_core_plan
        })
    }

    /// Range and loop of `core`
    pub fn core_work(&self, core: u32) -> Option<CoreWork> {
        let range = self.core_assignment.core_range(core)?;
        let plan = self.core_plan(core)?;
        Some(CoreWork { core, range, plan })
    }

    /// All used cores in launch order
    pub fn cores(&self) -> impl Iterator<Item = CoreWork> + '_ {
        (0..self.used_core_count).filter_map(move |core| self.core_work(core))
    }

    /// Scratch bytes one buffer needs for the largest tile actually used
    pub fn tile_buffer_bytes(&self) -> u64 {
        let longest = self
            .small_core_plan
            .tile_element_count
            .max(self.big_core_plan.tile_element_count);
        longest.saturating_mul(u64::from(self.element_size))
    }
}

/// Computes [`TilingPlan`]s for one platform under one policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tiler {
    budget: PlatformBudget,
    policy: TilingPolicy,
}

impl Tiler {
    /// Tiler for `budget` with the canonical policy
    pub fn new(budget: PlatformBudget) -> Self {
        Self {
            budget,
            policy: TilingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TilingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn budget(&self) -> &PlatformBudget {
        &self.budget
    }

    pub const fn policy(&self) -> &TilingPolicy {
        &self.policy
    }

    /// Compute the plan for `work`
    ///
    /// # Errors
    ///
    /// - [`crate::TilingError::InvalidConfig`] for an invalid policy or an
    ///   element size that does not divide the block size
    /// - [`crate::TilingError::ScratchTooSmall`] when one aligned tile per
    ///   buffer does not fit in scratch
    #[tracing::instrument(
        skip(self, work),
        fields(
            total_elements = work.total_elements(),
            element_size = work.element_size(),
            buffers = work.concurrent_buffers()
        )
    )]
    pub fn plan(&self, work: &WorkDescriptor) -> Result<TilingPlan> {
        compute_plan(&self.budget, work, &self.policy)
    }
}

/// Run partition, scheduling and assembly for one invocation
///
/// Equivalent to `Tiler::new(*budget).with_policy(*policy).plan(work)`.
pub fn compute_plan(budget: &PlatformBudget, work: &WorkDescriptor, policy: &TilingPolicy) -> Result<TilingPlan> {
    policy.validate()?;

    let scheduler =
        TileScheduler::new(budget, work)?.with_compute_align_bytes(policy.compute_align_bytes);
    let max_tile = scheduler.max_tile_elements();
    let total = work.total_elements();

    let mut partitioner = CorePartitioner::new(budget, work.element_size(), policy.core_order)?;
    if let Some(limit) = policy.core_limit {
        partitioner = partitioner.with_max_cores(limit);
    }
    if policy.small_input == SmallInputPolicy::SingleCoreWhenFits && total <= max_tile {
        partitioner = partitioner.with_max_cores(1);
    }
    let assignment = partitioner.partition(total);

    let (small_core_plan, big_core_plan, last_core_plan) = if total == 0 {
        let plan = match policy.empty_work {
            EmptyWorkPolicy::DegenerateCore => TileLoopPlan::single(0),
            EmptyWorkPolicy::MinimumTile => {
                TileLoopPlan::single(work.resolved_min_tile_elements(assignment.block_elements))
            }
        };
        (plan, plan, plan)
    } else {
        let small = scheduler.schedule(assignment.small_core_element_count)?;
        let big = if assignment.is_balanced() {
            small
        } else {
            scheduler.schedule(assignment.big_core_element_count)?
        };
        let last = if assignment.last_core_is_truncated() {
            scheduler.schedule(assignment.last_core_element_count)?
        } else if assignment.is_big_core(assignment.last_core()) {
            big
        } else {
            small
        };
        (small, big, last)
    };

    let tiling_key = if assignment.is_balanced() {
        TILING_KEY_BALANCED
    } else {
        TILING_KEY_WITH_BIG_CORES
    };

    let plan = TilingPlan {
        core_assignment: assignment,
        small_core_plan,
        big_core_plan,
        last_core_plan,
        used_core_count: assignment.used_core_count(),
        tiling_key,
        max_tile_elements: max_tile,
        element_size: work.element_size(),
        concurrent_buffers: work.concurrent_buffers(),
    };

    tracing::debug!(
        used_cores = plan.used_core_count,
        small_cores = assignment.small_core_count,
        big_cores = assignment.big_core_count,
        small_core_elements = assignment.small_core_element_count,
        big_core_elements = assignment.big_core_element_count,
        tile_elements = small_core_plan.tile_element_count,
        small_loops = small_core_plan.tile_loop_count,
        big_loops = big_core_plan.tile_loop_count,
        tiling_key,
        "computed tiling plan"
    );

    Ok(plan)
}
