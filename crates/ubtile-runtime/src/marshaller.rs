use crate::types::LeScalar;

/// Packs scalars into a little-endian, naturally aligned parameter buffer
///
/// Layout rules match [`crate::Unmarshaller`]: every value starts at a
/// multiple of its own size, gaps are zero filled.
#[derive(Debug, Default, Clone)]
pub struct Marshaller {
    buffer: Vec<u8>,
}

impl Marshaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(bytes),
        }
    }

    fn align(&mut self, alignment: usize) {
        let misalignment = self.buffer.len() % alignment;
        if misalignment != 0 {
            self.buffer.resize(self.buffer.len() + alignment - misalignment, 0);
        }
    }

    pub fn pack<T: LeScalar>(&mut self, value: T) -> &mut Self {
        self.align(T::SIZE);
        value.write_le(&mut self.buffer);
        self
    }

    pub fn pack_u32(&mut self, value: u32) -> &mut Self {
        self.pack(value)
    }

    pub fn pack_u64(&mut self, value: u64) -> &mut Self {
        self.pack(value)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
