//! Per-invocation tiling requests
//!
//! A [`WorkDescriptor`] is built from the operator's input tensor (element
//! count and dtype) plus how many same-sized buffers each tile keeps resident
//! in scratch at once.

use crate::error::{Result, TilingError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element types the operator catalog tiles over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Float32,
    Float16,
    BFloat16,
    Int8,
    UInt8,
    Int16,
    Int32,
    UInt32,
    Int64,
    Bool,
}

impl DataType {
    /// Size of one element in bytes
    pub const fn size_bytes(self) -> u32 {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Bool => 1,
            DataType::Float16 | DataType::BFloat16 | DataType::Int16 => 2,
            DataType::Float32 | DataType::Int32 | DataType::UInt32 => 4,
            DataType::Int64 => 8,
        }
    }

    /// Short lowercase name, matching the serde representation
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Float32 => "float32",
            DataType::Float16 => "float16",
            DataType::BFloat16 => "bfloat16",
            DataType::Int8 => "int8",
            DataType::UInt8 => "uint8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::UInt32 => "uint32",
            DataType::Int64 => "int64",
            DataType::Bool => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One tiling request: how much work, in what element size, with how many live buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWorkDescriptor")]
pub struct WorkDescriptor {
    total_elements: u64,
    element_size: u32,
    concurrent_buffers: u32,
    min_tile_elements: Option<u32>,
    reserved_scratch_bytes: u64,
}

#[derive(Deserialize)]
struct RawWorkDescriptor {
    total_elements: u64,
    element_size: u32,
    #[serde(default = "default_concurrent_buffers")]
    concurrent_buffers: u32,
    #[serde(default)]
    min_tile_elements: Option<u32>,
    #[serde(default)]
    reserved_scratch_bytes: u64,
}

fn default_concurrent_buffers() -> u32 {
    1
}

impl TryFrom<RawWorkDescriptor> for WorkDescriptor {
    type Error = TilingError;

    fn try_from(raw: RawWorkDescriptor) -> Result<Self> {
        let mut work = Self::new(raw.total_elements, raw.element_size, raw.concurrent_buffers)?;
        work.min_tile_elements = raw.min_tile_elements;
        work.reserved_scratch_bytes = raw.reserved_scratch_bytes;
        Ok(work)
    }
}

impl WorkDescriptor {
    /// Validate and build a work descriptor
    ///
    /// `total_elements == 0` is valid and tiles to a single degenerate core.
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] when `element_size` or
    /// `concurrent_buffers` is zero.
    pub fn new(total_elements: u64, element_size: u32, concurrent_buffers: u32) -> Result<Self> {
        if element_size == 0 {
            return Err(TilingError::invalid("element_size", "must be greater than zero"));
        }
        if concurrent_buffers == 0 {
            return Err(TilingError::invalid("concurrent_buffers", "must be at least one"));
        }
        Ok(Self {
            total_elements,
            element_size,
            concurrent_buffers,
            min_tile_elements: None,
            reserved_scratch_bytes: 0,
        })
    }

    /// Work descriptor for `total_elements` of `dtype` with a single live buffer
    pub fn for_dtype(total_elements: u64, dtype: DataType) -> Self {
        Self {
            total_elements,
            element_size: dtype.size_bytes(),
            concurrent_buffers: 1,
            min_tile_elements: None,
            reserved_scratch_bytes: 0,
        }
    }

    /// Set the number of same-sized buffers resident per tile
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] when `buffers` is zero.
    pub fn with_concurrent_buffers(mut self, buffers: u32) -> Result<Self> {
        if buffers == 0 {
            return Err(TilingError::invalid("concurrent_buffers", "must be at least one"));
        }
        self.concurrent_buffers = buffers;
        Ok(self)
    }

    /// Set an explicit minimum tile length in elements
    pub fn with_min_tile_elements(mut self, elements: u32) -> Self {
        self.min_tile_elements = Some(elements);
        self
    }

    /// Reserve scratch bytes for fixed temporaries before the per-buffer split
    pub fn with_reserved_scratch_bytes(mut self, bytes: u64) -> Self {
        self.reserved_scratch_bytes = bytes;
        self
    }

    pub const fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub const fn element_size(&self) -> u32 {
        self.element_size
    }

    pub const fn concurrent_buffers(&self) -> u32 {
        self.concurrent_buffers
    }

    pub const fn reserved_scratch_bytes(&self) -> u64 {
        self.reserved_scratch_bytes
    }

    /// Explicit minimum tile length, if one was set
    pub const fn min_tile_elements(&self) -> Option<u32> {
        self.min_tile_elements
    }

    /// Minimum tile length, defaulting to one alignment block
    pub fn resolved_min_tile_elements(&self, block_elements: u64) -> u64 {
        self.min_tile_elements.map_or(block_elements, u64::from)
    }

    /// Total payload size in bytes
    pub const fn total_bytes(&self) -> u64 {
        self.total_elements * self.element_size as u64
    }
}
