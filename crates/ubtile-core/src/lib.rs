//! # ubtile-core – Tiling and work partitioning for vector cores
//!
//! `ubtile-core` decides how an elementwise kernel's input is split across
//! the parallel cores of a vector accelerator and, per core, how it is
//! walked in tiles that fit the core's scratch buffer (UB). The output is a
//! [`TilingPlan`]: a small immutable value the host serializes into the
//! kernel's tiling record (see `ubtile-runtime`).
//!
//! ## Architecture Overview
//!
//! - [`align`]: integer ceil/floor division and power-of-two alignment.
//! - [`PlatformBudget`] / [`WorkDescriptor`]: validated inputs.
//! - [`CorePartitioner`]: block-aligned split into big and small cores.
//! - [`TileScheduler`]: per-core tile loops under the scratch budget.
//! - [`Tiler`] / [`compute_plan`]: assembles both into a [`TilingPlan`].
//! - [`TilingPolicy`]: named choices for tie-breaks and degenerate inputs.
//! - [`ops`]: per-operator buffer and reservation profiles.
//! - [`TilingConfig`]: JSON and environment loading.
//!
//! ## Quick Start
//!
//! ```
//! use ubtile_core::{PlatformBudget, Tiler, WorkDescriptor, TILING_KEY_WITH_BIG_CORES};
//!
//! let budget = PlatformBudget::new(8, 2048, 32)?;
//! let work = WorkDescriptor::new(1000, 4, 2)?;
//! let plan = Tiler::new(budget).plan(&work)?;
//!
//! assert_eq!(plan.used_core_count, 8);
//! assert_eq!(plan.core_assignment.big_core_count, 5);
//! assert_eq!(plan.big_core_plan.tile_element_count, 128);
//! assert_eq!(plan.small_core_plan.tile_element_count, 120);
//! assert_eq!(plan.tiling_key, TILING_KEY_WITH_BIG_CORES);
//! # Ok::<(), ubtile_core::TilingError>(())
//! ```

pub mod align;
pub mod budget;
pub mod config;
pub mod error;
pub mod ops;
pub mod partition;
pub mod plan;
pub mod policy;
pub mod schedule;
pub mod work;

pub use align::{align_down, align_up, ceil_div, floor_div, is_aligned};
pub use budget::{PlatformBudget, DEFAULT_BLOCK_BYTES, DEFAULT_CORE_COUNT, DEFAULT_SCRATCH_BYTES};
pub use config::TilingConfig;
pub use error::{Result, TilingError};
pub use ops::{OperatorKind, OperatorProfile};
pub use partition::{CoreAssignment, CorePartitioner};
pub use plan::{compute_plan, CoreWork, Tiler, TilingPlan, TILING_KEY_BALANCED, TILING_KEY_WITH_BIG_CORES};
pub use policy::{CoreOrder, EmptyWorkPolicy, SmallInputPolicy, TilingPolicy};
pub use schedule::{TileLoopPlan, TileScheduler};
pub use work::{DataType, WorkDescriptor};
