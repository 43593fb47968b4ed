use super::{OperatorProfile, COMPARE_RESERVED_BYTES, VECTOR_REPEAT_BYTES};
use crate::policy::{SmallInputPolicy, TilingPolicy};
use crate::work::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Double-buffered pipelines keep two copies of every live tensor
const PIPELINE_DEPTH: u32 = 2;

/// Elementwise operators with a known tiling profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorKind {
    Exp,
    Fill,
    Equal,
    Less,
    IsFinite,
    Triu,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 6] = [
        OperatorKind::Exp,
        OperatorKind::Fill,
        OperatorKind::Equal,
        OperatorKind::Less,
        OperatorKind::IsFinite,
        OperatorKind::Triu,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            OperatorKind::Exp => "exp",
            OperatorKind::Fill => "fill",
            OperatorKind::Equal => "equal",
            OperatorKind::Less => "less",
            OperatorKind::IsFinite => "is-finite",
            OperatorKind::Triu => "triu",
        }
    }

    /// Buffer multiplicity, reserved scratch and policy for `dtype`
    pub fn profile(self, dtype: DataType) -> OperatorProfile {
        let single_when_fits = TilingPolicy::default().with_small_input(SmallInputPolicy::SingleCoreWhenFits);
        let compare = single_when_fits.with_compute_align_bytes(VECTOR_REPEAT_BYTES);

        let (concurrent_buffers, reserved_scratch_bytes, policy) = match self {
            OperatorKind::Exp => {
                // bf16 is widened to f32 through an extra temporary
                let live = if dtype == DataType::BFloat16 { 3 } else { 2 };
                (live * PIPELINE_DEPTH, 0, single_when_fits)
            }
            OperatorKind::Fill => {
                let buffers = if dtype.size_bytes() == 1 { 3 } else { 1 };
                (buffers, 0, single_when_fits)
            }
            OperatorKind::Equal => match dtype {
                DataType::Int8 | DataType::UInt8 => (12, 0, compare),
                _ if dtype.size_bytes() == 4 => {
                    (5, COMPARE_RESERVED_BYTES + repeats(7), compare)
                }
                _ => (6, 0, compare),
            },
            OperatorKind::Less => match dtype {
                DataType::Int8 | DataType::UInt8 | DataType::Bool => {
                    (10, COMPARE_RESERVED_BYTES + repeats(6), compare)
                }
                DataType::BFloat16 => (10, COMPARE_RESERVED_BYTES + repeats(10), compare),
                DataType::Int64 => (6, 0, compare),
                DataType::Float32 | DataType::Int32 | DataType::UInt32 => {
                    (5, COMPARE_RESERVED_BYTES + repeats(7), compare)
                }
                DataType::Float16 | DataType::Int16 => (5, COMPARE_RESERVED_BYTES + repeats(6), compare),
            },
            OperatorKind::IsFinite => (10, 1024, TilingPolicy::default()),
            OperatorKind::Triu => (2, 0, TilingPolicy::default().with_core_limit(1)),
        };

        OperatorProfile {
            kind: self,
            dtype,
            concurrent_buffers,
            reserved_scratch_bytes,
            policy,
        }
    }
}

const fn repeats(count: u64) -> u64 {
    count * VECTOR_REPEAT_BYTES as u64
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
