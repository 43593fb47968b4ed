/// Scalar types that may cross the host/device boundary
///
/// # Safety
///
/// Types implementing this trait must:
/// - Have no padding bytes
/// - Be valid for any bit pattern
/// - Have a stable memory layout (repr(C) or primitive types)
pub unsafe trait Pod: Copy {}

unsafe impl Pod for u8 {}
unsafe impl Pod for u16 {}
unsafe impl Pod for u32 {}
unsafe impl Pod for u64 {}
unsafe impl Pod for i32 {}
unsafe impl Pod for i64 {}
unsafe impl Pod for f32 {}

/// Little-endian encoding of a [`Pod`] scalar, aligned to its own size
pub trait LeScalar: Pod {
    const SIZE: usize;

    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from the first `Self::SIZE` bytes, `None` if `bytes` is shorter
    fn read_le(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_le_scalar {
    ($($ty:ty),*) => {
        $(
            impl LeScalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Option<Self> {
                    let raw: [u8; std::mem::size_of::<$ty>()] = bytes.get(..Self::SIZE)?.try_into().ok()?;
                    Some(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_le_scalar!(u8, u16, u32, u64, i32, i64, f32);
