//! Integer division and block-alignment helpers
//!
//! Every helper works on `u64` and treats a zero divisor or zero alignment
//! as "undefined": the result is `0` instead of a panic. Callers must not
//! derive further quantities from a `0` returned for a zero divisor.
//!
//! Overflow is not checked. Inputs are bounded by realistic tensor sizes,
//! far below `u64::MAX / block`.

/// `a / b` rounded up. Returns `0` when `b == 0`.
#[inline]
pub const fn ceil_div(a: u64, b: u64) -> u64 {
    if b == 0 {
        return 0;
    }
    a.div_ceil(b)
}

/// `a / b` rounded down. Returns `0` when `b == 0`.
#[inline]
pub const fn floor_div(a: u64, b: u64) -> u64 {
    if b == 0 {
        return 0;
    }
    a / b
}

/// Smallest multiple of `align` that is `>= n`. Returns `0` when `align == 0`.
#[inline]
pub const fn align_up(n: u64, align: u64) -> u64 {
    ceil_div(n, align) * align
}

/// Largest multiple of `align` that is `<= n`. Returns `0` when `align == 0`.
#[inline]
pub const fn align_down(n: u64, align: u64) -> u64 {
    floor_div(n, align) * align
}

/// Whether `n` is a multiple of `align`. A zero alignment never divides.
#[inline]
pub const fn is_aligned(n: u64, align: u64) -> bool {
    align != 0 && n % align == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_and_floor_div() {
        assert_eq!(ceil_div(4000, 32), 125);
        assert_eq!(ceil_div(4001, 32), 126);
        assert_eq!(ceil_div(0, 32), 0);
        assert_eq!(floor_div(4001, 32), 125);
        assert_eq!(floor_div(31, 32), 0);
    }

    #[test]
    fn test_zero_divisor_yields_zero() {
        assert_eq!(ceil_div(17, 0), 0);
        assert_eq!(floor_div(17, 0), 0);
        assert_eq!(align_up(17, 0), 0);
        assert_eq!(align_down(17, 0), 0);
        assert!(!is_aligned(0, 0));
    }

    #[test]
    fn test_alignment() {
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_down(15, 8), 8);
        assert_eq!(align_down(7, 8), 0);
        assert!(is_aligned(256, 32));
        assert!(!is_aligned(250, 32));
    }

    #[test]
    fn test_large_values_stay_in_range() {
        let n = 1u64 << 40;
        assert_eq!(ceil_div(n + 1, 8), (n / 8) + 1);
        assert_eq!(align_up(n + 1, 32), n + 32);
        assert_eq!(align_down(n + 31, 32), n);
    }
}
