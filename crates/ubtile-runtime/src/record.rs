//! Tiling records: the byte layout a kernel reads its plan from
//!
//! A [`TilingPlan`] is host-side. The device only sees a flat record of
//! little-endian fields whose order and widths are fixed per kernel family.
//! Each family is one [`TilingData`] implementation; changing its field order
//! breaks every kernel compiled against it.

use crate::abi::{CLaunchConfig, ErrorCode, KernelLaunchFn, DEFAULT_TILING_CAPACITY};
use crate::error::{RecordError, Result};
use crate::marshaller::Marshaller;
use crate::unmarshaller::Unmarshaller;
use serde::{Deserialize, Serialize};
use std::ptr;
use ubtile_core::{floor_div, TilingPlan};

/// A fixed-layout tiling record
pub trait TilingData: Sized {
    /// Layout name, used in logs
    const NAME: &'static str;

    /// Encoded size in bytes
    fn encoded_len(&self) -> usize;

    fn encode(&self, out: &mut Marshaller);

    /// # Errors
    ///
    /// [`RecordError::BufferTooSmall`] if the buffer ends early.
    fn decode(input: &mut Unmarshaller<'_>) -> Result<Self>;

    /// Extract this layout's fields from a plan
    ///
    /// # Errors
    ///
    /// [`RecordError::FieldOverflow`] if a plan value does not fit its field.
    fn from_plan(plan: &TilingPlan) -> Result<Self>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Marshaller::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out.into_bytes()
    }

    /// # Errors
    ///
    /// [`RecordError::BufferTooSmall`] if `bytes` is shorter than the layout.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(&mut Unmarshaller::new(bytes))
    }
}

/// Big/small core record read by the elementwise kernels
///
/// Eight `u64` fields, 64 bytes. Big-core fields are zero when every core
/// carries the same load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementwiseTilingData {
    pub small_core_data_num: u64,
    pub big_core_data_num: u64,
    /// Tile length in elements
    pub ub_part_data_num: u64,
    pub small_core_tail_data_num: u64,
    pub big_core_tail_data_num: u64,
    pub small_core_loop_num: u64,
    pub big_core_loop_num: u64,
    /// Number of big cores
    pub tail_block_num: u64,
}

impl ElementwiseTilingData {
    pub const ENCODED_LEN: usize = 8 * 8;
}

impl TilingData for ElementwiseTilingData {
    const NAME: &'static str = "elementwise";

    fn encoded_len(&self) -> usize {
        Self::ENCODED_LEN
    }

    fn encode(&self, out: &mut Marshaller) {
        out.pack_u64(self.small_core_data_num)
            .pack_u64(self.big_core_data_num)
            .pack_u64(self.ub_part_data_num)
            .pack_u64(self.small_core_tail_data_num)
            .pack_u64(self.big_core_tail_data_num)
            .pack_u64(self.small_core_loop_num)
            .pack_u64(self.big_core_loop_num)
            .pack_u64(self.tail_block_num);
    }

    fn decode(input: &mut Unmarshaller<'_>) -> Result<Self> {
        Ok(Self {
            small_core_data_num: input.try_unpack_u64()?,
            big_core_data_num: input.try_unpack_u64()?,
            ub_part_data_num: input.try_unpack_u64()?,
            small_core_tail_data_num: input.try_unpack_u64()?,
            big_core_tail_data_num: input.try_unpack_u64()?,
            small_core_loop_num: input.try_unpack_u64()?,
            big_core_loop_num: input.try_unpack_u64()?,
            tail_block_num: input.try_unpack_u64()?,
        })
    }

    fn from_plan(plan: &TilingPlan) -> Result<Self> {
        let assignment = &plan.core_assignment;
        let small = &plan.small_core_plan;
        let big = &plan.big_core_plan;
        let has_big = !assignment.is_balanced();

        Ok(Self {
            small_core_data_num: assignment.small_core_element_count,
            big_core_data_num: if has_big { assignment.big_core_element_count } else { 0 },
            ub_part_data_num: small.tile_element_count.max(big.tile_element_count),
            small_core_tail_data_num: small.tail_tile_element_count,
            big_core_tail_data_num: if has_big { big.tail_tile_element_count } else { 0 },
            small_core_loop_num: u64::from(small.tile_loop_count),
            big_core_loop_num: if has_big { u64::from(big.tile_loop_count) } else { 0 },
            tail_block_num: u64::from(assignment.tail_block_count),
        })
    }
}

/// Big/small core record with compute-aligned lengths, read by the equal kernel
///
/// Twelve `u32` fields, 48 bytes: the [`ElementwiseTilingData`] fields
/// narrowed to 32 bits, followed by the tile lengths rounded up to the
/// vector repeat width. Big-core fields are zero when every core carries
/// the same load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EqualTilingData {
    pub small_core_data_num: u32,
    pub big_core_data_num: u32,
    pub tile_data_num: u32,
    pub small_tail_data_num: u32,
    pub big_tail_data_num: u32,
    pub small_loop_num: u32,
    pub big_loop_num: u32,
    pub tail_block_num: u32,
    pub big_compute_num: u32,
    pub small_compute_num: u32,
    pub big_tail_compute_num: u32,
    pub small_tail_compute_num: u32,
}

impl EqualTilingData {
    pub const ENCODED_LEN: usize = 12 * 4;
}

impl TilingData for EqualTilingData {
    const NAME: &'static str = "equal";

    fn encoded_len(&self) -> usize {
        Self::ENCODED_LEN
    }

    fn encode(&self, out: &mut Marshaller) {
        out.pack_u32(self.small_core_data_num)
            .pack_u32(self.big_core_data_num)
            .pack_u32(self.tile_data_num)
            .pack_u32(self.small_tail_data_num)
            .pack_u32(self.big_tail_data_num)
            .pack_u32(self.small_loop_num)
            .pack_u32(self.big_loop_num)
            .pack_u32(self.tail_block_num)
            .pack_u32(self.big_compute_num)
            .pack_u32(self.small_compute_num)
            .pack_u32(self.big_tail_compute_num)
            .pack_u32(self.small_tail_compute_num);
    }

    fn decode(input: &mut Unmarshaller<'_>) -> Result<Self> {
        Ok(Self {
            small_core_data_num: input.try_unpack_u32()?,
            big_core_data_num: input.try_unpack_u32()?,
            tile_data_num: input.try_unpack_u32()?,
            small_tail_data_num: input.try_unpack_u32()?,
            big_tail_data_num: input.try_unpack_u32()?,
            small_loop_num: input.try_unpack_u32()?,
            big_loop_num: input.try_unpack_u32()?,
            tail_block_num: input.try_unpack_u32()?,
            big_compute_num: input.try_unpack_u32()?,
            small_compute_num: input.try_unpack_u32()?,
            big_tail_compute_num: input.try_unpack_u32()?,
            small_tail_compute_num: input.try_unpack_u32()?,
        })
    }

    fn from_plan(plan: &TilingPlan) -> Result<Self> {
        let assignment = &plan.core_assignment;
        let small = &plan.small_core_plan;
        let big = &plan.big_core_plan;
        let has_big = !assignment.is_balanced();
        let big_only = |value: u64| if has_big { value } else { 0 };

        Ok(Self {
            small_core_data_num: narrow("small_core_data_num", assignment.small_core_element_count)?,
            big_core_data_num: narrow("big_core_data_num", big_only(assignment.big_core_element_count))?,
            tile_data_num: narrow(
                "tile_data_num",
                small.tile_element_count.max(big.tile_element_count),
            )?,
            small_tail_data_num: narrow("small_tail_data_num", small.tail_tile_element_count)?,
            big_tail_data_num: narrow("big_tail_data_num", big_only(big.tail_tile_element_count))?,
            small_loop_num: small.tile_loop_count,
            big_loop_num: if has_big { big.tile_loop_count } else { 0 },
            tail_block_num: assignment.tail_block_count,
            big_compute_num: narrow("big_compute_num", big_only(big.tile_compute_element_count))?,
            small_compute_num: narrow("small_compute_num", small.tile_compute_element_count)?,
            big_tail_compute_num: narrow(
                "big_tail_compute_num",
                big_only(big.tail_compute_element_count),
            )?,
            small_tail_compute_num: narrow("small_tail_compute_num", small.tail_compute_element_count)?,
        })
    }
}

/// Comparison record read by the less kernel
///
/// Thirteen `u32` fields, 52 bytes. Same values as [`EqualTilingData`], with
/// an `is_tail_block` flag between the loop fields and the compute lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LessTilingData {
    pub small_core_data_num: u32,
    pub big_core_data_num: u32,
    pub tile_data_num: u32,
    pub small_tail_data_num: u32,
    pub big_tail_data_num: u32,
    pub small_loop_num: u32,
    pub big_loop_num: u32,
    pub tail_block_num: u32,
    /// `1` when big cores exist
    pub is_tail_block: u32,
    pub big_compute_num: u32,
    pub small_compute_num: u32,
    pub big_tail_compute_num: u32,
    pub small_tail_compute_num: u32,
}

impl LessTilingData {
    pub const ENCODED_LEN: usize = 13 * 4;
}

impl From<EqualTilingData> for LessTilingData {
    fn from(equal: EqualTilingData) -> Self {
        Self {
            small_core_data_num: equal.small_core_data_num,
            big_core_data_num: equal.big_core_data_num,
            tile_data_num: equal.tile_data_num,
            small_tail_data_num: equal.small_tail_data_num,
            big_tail_data_num: equal.big_tail_data_num,
            small_loop_num: equal.small_loop_num,
            big_loop_num: equal.big_loop_num,
            tail_block_num: equal.tail_block_num,
            is_tail_block: u32::from(equal.tail_block_num != 0),
            big_compute_num: equal.big_compute_num,
            small_compute_num: equal.small_compute_num,
            big_tail_compute_num: equal.big_tail_compute_num,
            small_tail_compute_num: equal.small_tail_compute_num,
        }
    }
}

impl TilingData for LessTilingData {
    const NAME: &'static str = "less";

    fn encoded_len(&self) -> usize {
        Self::ENCODED_LEN
    }

    fn encode(&self, out: &mut Marshaller) {
        out.pack_u32(self.small_core_data_num)
            .pack_u32(self.big_core_data_num)
            .pack_u32(self.tile_data_num)
            .pack_u32(self.small_tail_data_num)
            .pack_u32(self.big_tail_data_num)
            .pack_u32(self.small_loop_num)
            .pack_u32(self.big_loop_num)
            .pack_u32(self.tail_block_num)
            .pack_u32(self.is_tail_block)
            .pack_u32(self.big_compute_num)
            .pack_u32(self.small_compute_num)
            .pack_u32(self.big_tail_compute_num)
            .pack_u32(self.small_tail_compute_num);
    }

    fn decode(input: &mut Unmarshaller<'_>) -> Result<Self> {
        Ok(Self {
            small_core_data_num: input.try_unpack_u32()?,
            big_core_data_num: input.try_unpack_u32()?,
            tile_data_num: input.try_unpack_u32()?,
            small_tail_data_num: input.try_unpack_u32()?,
            big_tail_data_num: input.try_unpack_u32()?,
            small_loop_num: input.try_unpack_u32()?,
            big_loop_num: input.try_unpack_u32()?,
            tail_block_num: input.try_unpack_u32()?,
            is_tail_block: input.try_unpack_u32()?,
            big_compute_num: input.try_unpack_u32()?,
            small_compute_num: input.try_unpack_u32()?,
            big_tail_compute_num: input.try_unpack_u32()?,
            small_tail_compute_num: input.try_unpack_u32()?,
        })
    }

    fn from_plan(plan: &TilingPlan) -> Result<Self> {
        EqualTilingData::from_plan(plan).map(Self::from)
    }
}

/// Per-core span record read by the predicate kernels (is_finite family)
///
/// 40 bytes: `u64` total, two `u32` fields, three `u64` counts. These
/// kernels split work their own way: every core gets `per_core_data_count`
/// elements (a multiple of the block), the first `tail_data_core_num` cores
/// one block more, and the last core also takes the sub-block remainder.
/// Only the plan's total, block and core count feed the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoreSpanTilingData {
    pub total_data_count: u64,
    /// Scratch bytes available to one buffer
    pub usable_ub_size: u32,
    pub need_core_num: u32,
    pub per_core_data_count: u64,
    /// Cores holding one extra block
    pub tail_data_core_num: u64,
    /// `per_core_data_count` plus the sub-block remainder
    pub last_core_data_count: u64,
}

impl CoreSpanTilingData {
    pub const ENCODED_LEN: usize = 8 + 4 + 4 + 3 * 8;
}

impl TilingData for CoreSpanTilingData {
    const NAME: &'static str = "core-span";

    fn encoded_len(&self) -> usize {
        Self::ENCODED_LEN
    }

    fn encode(&self, out: &mut Marshaller) {
        out.pack_u64(self.total_data_count)
            .pack_u32(self.usable_ub_size)
            .pack_u32(self.need_core_num)
            .pack_u64(self.per_core_data_count)
            .pack_u64(self.tail_data_core_num)
            .pack_u64(self.last_core_data_count);
    }

    fn decode(input: &mut Unmarshaller<'_>) -> Result<Self> {
        Ok(Self {
            total_data_count: input.try_unpack_u64()?,
            usable_ub_size: input.try_unpack_u32()?,
            need_core_num: input.try_unpack_u32()?,
            per_core_data_count: input.try_unpack_u64()?,
            tail_data_core_num: input.try_unpack_u64()?,
            last_core_data_count: input.try_unpack_u64()?,
        })
    }

    fn from_plan(plan: &TilingPlan) -> Result<Self> {
        let assignment = &plan.core_assignment;
        let total = assignment.total_elements;
        let block = assignment.block_elements;
        let cores = u64::from(plan.used_core_count);

        let usable_ub_bytes = plan
            .max_tile_elements
            .checked_mul(u64::from(plan.element_size))
            .ok_or(RecordError::FieldOverflow {
                field: "usable_ub_size",
                value: plan.max_tile_elements,
            })?;

        let per_core_data_count = floor_div(floor_div(total, cores), block) * block;
        let remainder = total - per_core_data_count * cores;

        Ok(Self {
            total_data_count: total,
            usable_ub_size: narrow("usable_ub_size", usable_ub_bytes)?,
            need_core_num: plan.used_core_count,
            per_core_data_count,
            tail_data_core_num: floor_div(remainder, block),
            last_core_data_count: per_core_data_count + remainder % block.max(1),
        })
    }
}

fn narrow(field: &'static str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| RecordError::FieldOverflow { field, value })
}

/// Everything the launcher needs for one kernel invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPackage {
    pub launch: CLaunchConfig,
    pub tiling: Vec<u8>,
}

impl LaunchPackage {
    /// Encode `plan` with layout `T` against the default tiling capacity
    ///
    /// # Errors
    ///
    /// See [`LaunchPackage::with_capacity`].
    pub fn new<T: TilingData>(plan: &TilingPlan) -> Result<Self> {
        Self::with_capacity::<T>(plan, DEFAULT_TILING_CAPACITY)
    }

    /// Encode `plan` with layout `T`, failing if the record exceeds `capacity` bytes
    ///
    /// # Errors
    ///
    /// - [`RecordError::FieldOverflow`] from [`TilingData::from_plan`]
    /// - [`RecordError::CapacityExceeded`] when the record is larger than `capacity`
    pub fn with_capacity<T: TilingData>(plan: &TilingPlan, capacity: usize) -> Result<Self> {
        let record = T::from_plan(plan)?;
        let tiling = record.to_bytes();
        if tiling.len() > capacity {
            return Err(RecordError::CapacityExceeded {
                size: tiling.len(),
                capacity,
            });
        }
        let tiling_size = u32::try_from(tiling.len()).map_err(|_| RecordError::FieldOverflow {
            field: "tiling_size",
            value: tiling.len() as u64,
        })?;

        tracing::debug!(
            layout = T::NAME,
            block_dim = plan.used_core_count,
            tiling_key = plan.tiling_key,
            tiling_size,
            "packaged tiling record"
        );

        Ok(Self {
            launch: CLaunchConfig {
                block_dim: plan.used_core_count,
                tiling_key: plan.tiling_key,
                tiling_size,
                reserved: 0,
                workspace_bytes: 0,
            },
            tiling,
        })
    }

    /// Attach a global-memory workspace size to the launch
    pub fn with_workspace_bytes(mut self, bytes: u64) -> Self {
        self.launch.workspace_bytes = bytes;
        self
    }

    /// Decode the record back with layout `T`
    ///
    /// # Errors
    ///
    /// [`RecordError::BufferTooSmall`] if the record is shorter than `T`.
    pub fn record<T: TilingData>(&self) -> Result<T> {
        T::from_bytes(&self.tiling)
    }

    /// Call a kernel entry point with this package
    ///
    /// # Safety
    ///
    /// `entry` must follow the [`KernelLaunchFn`] contract and must not
    /// read more than `launch.tiling_size` bytes of tiling data.
    pub unsafe fn invoke(&self, entry: KernelLaunchFn) -> ErrorCode {
        entry(&self.launch, self.tiling.as_ptr(), ptr::null_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::raw::c_char;
    use ubtile_core::{DataType, OperatorKind, PlatformBudget, Tiler, TilingPolicy, WorkDescriptor};

    fn plan(scratch: u64, total: u64) -> TilingPlan {
        let budget = PlatformBudget::new(8, scratch, 32).unwrap();
        Tiler::new(budget)
            .plan(&WorkDescriptor::new(total, 4, 2).unwrap())
            .unwrap()
    }

    #[test]
    fn test_elementwise_from_plan() {
        let record = ElementwiseTilingData::from_plan(&plan(256, 1000)).unwrap();
        assert_eq!(record.small_core_data_num, 120);
        assert_eq!(record.big_core_data_num, 128);
        assert_eq!(record.ub_part_data_num, 32);
        assert_eq!(record.small_core_tail_data_num, 24);
        assert_eq!(record.big_core_tail_data_num, 32);
        assert_eq!(record.small_core_loop_num, 4);
        assert_eq!(record.big_core_loop_num, 4);
        assert_eq!(record.tail_block_num, 5);
    }

    #[test]
    fn test_elementwise_balanced_zeroes_big_fields() {
        let record = ElementwiseTilingData::from_plan(&plan(2048, 256)).unwrap();
        assert_eq!(record.small_core_data_num, 32);
        assert_eq!(record.big_core_data_num, 0);
        assert_eq!(record.big_core_loop_num, 0);
        assert_eq!(record.tail_block_num, 0);
    }

    #[test]
    fn test_core_span_from_plan() {
        let record = CoreSpanTilingData::from_plan(&plan(2048, 1003)).unwrap();
        assert_eq!(record.total_data_count, 1003);
        assert_eq!(record.usable_ub_size, 1024);
        assert_eq!(record.need_core_num, 8);
        // 1003 / 8 = 125 -> 120 per core, 43 left: 5 whole blocks and 3 elements
        assert_eq!(record.per_core_data_count, 120);
        assert_eq!(record.tail_data_core_num, 5);
        assert_eq!(record.last_core_data_count, 123);
        assert!(record.last_core_data_count >= record.per_core_data_count);
    }

    #[test]
    fn test_core_span_counts_sum_to_total() {
        for total in [0, 1, 7, 8, 63, 64, 1000, 1003, 4099] {
            let r = CoreSpanTilingData::from_plan(&plan(2048, total)).unwrap();
            let sum = r.per_core_data_count * u64::from(r.need_core_num)
                + r.tail_data_core_num * 8
                + (r.last_core_data_count - r.per_core_data_count);
            assert_eq!(sum, total, "total {total}");
            assert!(r.tail_data_core_num < u64::from(r.need_core_num));
        }
    }

    #[test]
    fn test_core_span_field_widths() {
        let bytes = CoreSpanTilingData::from_plan(&plan(2048, 1003)).unwrap().to_bytes();
        assert_eq!(bytes.len(), CoreSpanTilingData::ENCODED_LEN);
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[8..12], &1024u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &8u32.to_le_bytes());
    }

    fn aligned_plan(scratch: u64, total: u64) -> TilingPlan {
        let budget = PlatformBudget::new(8, scratch, 32).unwrap();
        Tiler::new(budget)
            .with_policy(TilingPolicy::default().with_compute_align_bytes(256))
            .plan(&WorkDescriptor::new(total, 4, 2).unwrap())
            .unwrap()
    }

    #[test]
    fn test_equal_carries_compute_lengths() {
        let record = EqualTilingData::from_plan(&aligned_plan(256, 1000)).unwrap();
        assert_eq!(record.small_core_data_num, 120);
        assert_eq!(record.big_core_data_num, 128);
        assert_eq!(record.tile_data_num, 32);
        assert_eq!(record.small_tail_data_num, 24);
        assert_eq!(record.big_tail_data_num, 32);
        assert_eq!(record.tail_block_num, 5);
        // 32 and 24 floats both round up to one 256-byte repeat
        assert_eq!(record.small_compute_num, 64);
        assert_eq!(record.small_tail_compute_num, 64);
        assert_eq!(record.big_compute_num, 64);
        assert_eq!(record.big_tail_compute_num, 64);
        assert_eq!(record.to_bytes().len(), EqualTilingData::ENCODED_LEN);
    }

    #[test]
    fn test_equal_single_tile_half_precision() {
        let tiler = Tiler::new(PlatformBudget::default());
        let plan = tiler.plan_operator(OperatorKind::Equal, DataType::Float16, 100).unwrap();
        let record = EqualTilingData::from_plan(&plan).unwrap();
        assert_eq!(record.small_core_data_num, 112);
        assert_eq!(record.small_loop_num, 1);
        assert_eq!(record.small_compute_num, 128);
        assert_eq!(record.small_tail_compute_num, 128);
        assert_eq!(record.big_compute_num, 0);

        let words: Vec<u32> = record
            .to_bytes()
            .chunks(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert!(words.contains(&128));
    }

    #[test]
    fn test_less_tail_flag() {
        let with_big = LessTilingData::from_plan(&aligned_plan(256, 1000)).unwrap();
        assert_eq!(with_big.is_tail_block, 1);
        assert_eq!(with_big.small_tail_compute_num, 64);

        let balanced = LessTilingData::from_plan(&aligned_plan(2048, 256)).unwrap();
        assert_eq!(balanced.is_tail_block, 0);
        assert_eq!(balanced.big_core_data_num, 0);
        assert_eq!(balanced.big_compute_num, 0);

        let bytes = with_big.to_bytes();
        assert_eq!(bytes.len(), LessTilingData::ENCODED_LEN);
        assert_eq!(&bytes[32..36], &1u32.to_le_bytes());
        assert_eq!(LessTilingData::from_bytes(&bytes).unwrap(), with_big);
    }

    #[test]
    fn test_equal_field_overflow() {
        let mut huge = plan(2048, 1000);
        huge.core_assignment.small_core_element_count = u64::from(u32::MAX) + 1;
        assert_eq!(
            EqualTilingData::from_plan(&huge).unwrap_err(),
            RecordError::FieldOverflow {
                field: "small_core_data_num",
                value: u64::from(u32::MAX) + 1,
            }
        );
    }

    #[test]
    fn test_decode_short_buffer() {
        let bytes = ElementwiseTilingData::default().to_bytes();
        let err = ElementwiseTilingData::from_bytes(&bytes[..60]).unwrap_err();
        assert_eq!(err, RecordError::BufferTooSmall { needed: 64, available: 60 });
    }

    #[test]
    fn test_launch_package() {
        let package = LaunchPackage::new::<ElementwiseTilingData>(&plan(2048, 1000))
            .unwrap()
            .with_workspace_bytes(4096);
        assert_eq!(package.launch.block_dim, 8);
        assert_eq!(package.launch.tiling_key, 1);
        assert_eq!(package.launch.tiling_size, 64);
        assert_eq!(package.launch.workspace_bytes, 4096);
        let record: ElementwiseTilingData = package.record().unwrap();
        assert_eq!(record.tail_block_num, 5);
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = LaunchPackage::with_capacity::<CoreSpanTilingData>(&plan(2048, 1000), 32).unwrap_err();
        assert_eq!(err, RecordError::CapacityExceeded { size: 40, capacity: 32 });
    }

    unsafe extern "C" fn check_launch(
        config: *const CLaunchConfig,
        tiling: *const u8,
        _error_msg: *mut *mut c_char,
    ) -> ErrorCode {
        let config = &*config;
        let bytes = std::slice::from_raw_parts(tiling, config.tiling_size as usize);
        match ElementwiseTilingData::from_bytes(bytes) {
            Ok(record) if record.tail_block_num == u64::from(config.tiling_key) * 5 => ErrorCode::Success,
            Ok(_) => ErrorCode::ExecutionFailed,
            Err(_) => ErrorCode::InvalidParams,
        }
    }

    #[test]
    fn test_invoke_passes_record() {
        let package = LaunchPackage::new::<ElementwiseTilingData>(&plan(2048, 1000)).unwrap();
        let code = unsafe { package.invoke(check_launch) };
        assert_eq!(code, ErrorCode::Success);
    }
}
