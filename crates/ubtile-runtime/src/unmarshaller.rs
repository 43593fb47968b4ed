use crate::error::{RecordError, Result};
use crate::types::LeScalar;

/// Reads back values packed by [`crate::Marshaller`]
///
/// Every read is bounds checked; a short buffer is a
/// [`RecordError::BufferTooSmall`], never a panic.
pub struct Unmarshaller<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Unmarshaller<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    fn aligned_offset(&self, alignment: usize) -> usize {
        let misalignment = self.offset % alignment;
        if misalignment == 0 {
            self.offset
        } else {
            self.offset + alignment - misalignment
        }
    }

    pub fn try_unpack<T: LeScalar>(&mut self) -> Result<T> {
        let start = self.aligned_offset(T::SIZE);
        let end = start + T::SIZE;
        let value = self
            .buffer
            .get(start..end)
            .and_then(T::read_le)
            .ok_or(RecordError::BufferTooSmall {
                needed: end,
                available: self.buffer.len(),
            })?;
        self.offset = end;
        Ok(value)
    }

    pub fn try_unpack_u32(&mut self) -> Result<u32> {
        self.try_unpack()
    }

    pub fn try_unpack_u64(&mut self) -> Result<u64> {
        self.try_unpack()
    }

    /// Bytes consumed so far, including alignment padding
    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }
}
