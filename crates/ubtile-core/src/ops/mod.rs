//! Operator tiling profiles
//!
//! Elementwise operators share the partition/schedule pipeline and differ
//! only in how many buffers a tile keeps alive, how much scratch they set
//! aside for fixed temporaries, and a few policy choices. Each operator's
//! choices live in an [`OperatorProfile`] instead of a private copy of the
//! arithmetic.

mod profiles;

pub use profiles::OperatorKind;

use crate::error::Result;
use crate::plan::{TilingPlan, Tiler};
use crate::policy::{SmallInputPolicy, TilingPolicy};
use crate::work::{DataType, WorkDescriptor};
use serde::{Deserialize, Serialize};

/// Scratch set aside by the comparison kernels for their mask temporaries
pub const COMPARE_RESERVED_BYTES: u64 = 8 * 1024;

/// Vector repeat width of the comparison and select instructions
pub const VECTOR_REPEAT_BYTES: u32 = 256;

/// Tiling-relevant parameters of one operator for one dtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorProfile {
    pub kind: OperatorKind,
    pub dtype: DataType,
    /// Same-sized buffers resident per tile (live tensors x pipeline depth)
    pub concurrent_buffers: u32,
    pub reserved_scratch_bytes: u64,
    /// Policy fields the operator overrides
    pub policy: TilingPolicy,
}

impl OperatorProfile {
    /// Work descriptor for `total_elements` under this profile
    ///
    /// # Errors
    ///
    /// Propagates [`crate::TilingError::InvalidConfig`] from descriptor validation.
    pub fn work(&self, total_elements: u64) -> Result<WorkDescriptor> {
        Ok(WorkDescriptor::for_dtype(total_elements, self.dtype)
            .with_concurrent_buffers(self.concurrent_buffers)?
            .with_reserved_scratch_bytes(self.reserved_scratch_bytes))
    }

    /// Merge the operator's policy choices over `base`
    ///
    /// Core order and empty-work handling come from `base`. A core limit or
    /// compute alignment set by the operator wins over the base value. Small
    /// inputs run on one core when either side asks for it.
    pub fn merged_policy(&self, base: &TilingPolicy) -> TilingPolicy {
        let small_input = if self.policy.small_input == SmallInputPolicy::SingleCoreWhenFits {
            self.policy.small_input
        } else {
            base.small_input
        };
        TilingPolicy {
            core_order: base.core_order,
            empty_work: base.empty_work,
            small_input,
            core_limit: self.policy.core_limit.or(base.core_limit),
            compute_align_bytes: self.policy.compute_align_bytes.or(base.compute_align_bytes),
        }
    }
}

impl Tiler {
    /// Plan an operator invocation from its profile
    ///
    /// # Errors
    ///
    /// Same as [`Tiler::plan`].
    pub fn plan_operator(&self, kind: OperatorKind, dtype: DataType, total_elements: u64) -> Result<TilingPlan> {
        let profile = kind.profile(dtype);
        let work = profile.work(total_elements)?;
        let policy = profile.merged_policy(self.policy());
        tracing::debug!(operator = %kind, %dtype, buffers = profile.concurrent_buffers, "planning operator");
        Tiler::new(*self.budget()).with_policy(policy).plan(&work)
    }
}
