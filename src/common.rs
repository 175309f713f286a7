//! Common definitions and helper functions used by the rest of the library

use std::borrow::Cow;
use std::fmt::Debug;

use num_traits::{Float, FloatConst, FromPrimitive};

use crate::error::{FftError, Result};

/// Direction flag for a forward transform.
pub const FORWARD: bool = true;

/// Direction flag for an inverse (backward) transform.
pub const BACK: bool = false;

/// Largest supported number of address bits (complex samples = 2^32).
pub const MAX_ADDRESS_BITS: u32 = 32;

/// Element type of a transform buffer.
///
/// Besides the usual floating-point arithmetic this carries the per-precision
/// constants the engine uses for its auto-threading heuristic and for the
/// precision diagnostics.
pub trait FftFloat: Float + FloatConst + FromPrimitive + Debug + Send + Sync + 'static {
    /// Significant bits of the mantissa, including the implicit leading bit.
    const MANTISSA_BITS: u32;

    /// Transforms with more address bits than this get extra worker threads
    /// when auto-threading is enabled.
    const OPTIMAL_THREAD_BITS: u32;

    /// Lossy conversion from `f64`.
    fn from_f64_lossy(value: f64) -> Self;

    /// Lossy conversion to `f64`.
    fn as_f64(self) -> f64;

    /// Converts an index or length.
    #[inline]
    fn from_index(value: usize) -> Self {
        Self::from_f64_lossy(value as f64)
    }
}

impl FftFloat for f32 {
    const MANTISSA_BITS: u32 = f32::MANTISSA_DIGITS;
    const OPTIMAL_THREAD_BITS: u32 = 15;

    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl FftFloat for f64 {
    const MANTISSA_BITS: u32 = f64::MANTISSA_DIGITS;
    const OPTIMAL_THREAD_BITS: u32 = 14;

    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

/// Integer log2, rounded down. Returns 0 for 0 and 1.
#[inline]
pub fn log2_floor(value: usize) -> u32 {
    if value <= 1 {
        0
    } else {
        usize::BITS - 1 - value.leading_zeros()
    }
}

/// Integer log2, rounded up.
#[inline]
pub fn log2_ceil(value: usize) -> u32 {
    if value <= 1 {
        0
    } else {
        usize::BITS - (value - 1).leading_zeros()
    }
}

/// Smallest power of two that is `>= value` (1 for 0).
#[inline]
pub fn pow2_ceil(value: usize) -> usize {
    1 << log2_ceil(value)
}

/// Number of address bits of an interleaved complex buffer of `len` scalars,
/// i.e. log2 of the number of complex samples.
///
/// Fails unless `len` is a power of two of at least 2 whose complex sample
/// count fits in [`MAX_ADDRESS_BITS`].
pub fn address_bits_of(len: usize) -> Result<u32> {
    if len < 2 || !len.is_power_of_two() {
        return Err(FftError::InvalidLength { len });
    }
    let bits = log2_floor(len >> 1);
    if bits > MAX_ADDRESS_BITS {
        return Err(FftError::InvalidLength { len });
    }
    Ok(bits)
}

/// Returns `data` zero-extended to `n` samples.
///
/// Buffers that are already at least `n` long come back unchanged (borrowed);
/// the result is never truncated.
pub fn get_padded<T: Float>(data: &[T], n: usize) -> Cow<'_, [T]> {
    if n <= data.len() {
        return Cow::Borrowed(data);
    }
    let mut padded = vec![T::zero(); n];
    padded[..data.len()].copy_from_slice(data);
    Cow::Owned(padded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2() {
        assert_eq!(log2_floor(1), 0);
        assert_eq!(log2_floor(1 << 20), 20);
        assert_eq!(log2_floor((1 << 20) - 1), 19);
        assert_eq!(log2_ceil((1 << 20) - 1), 20);
        assert_eq!(log2_ceil(1 << 20), 20);
        assert_eq!(log2_ceil((1 << 20) + 1), 21);
        assert_eq!(pow2_ceil(0), 1);
        assert_eq!(pow2_ceil(5), 8);
        assert_eq!(pow2_ceil(64), 64);
    }

    #[test]
    fn test_address_bits() {
        assert_eq!(address_bits_of(2).unwrap(), 0);
        assert_eq!(address_bits_of(8).unwrap(), 2);
        assert_eq!(address_bits_of(1024).unwrap(), 9);
        assert_eq!(address_bits_of(0), Err(FftError::InvalidLength { len: 0 }));
        assert_eq!(address_bits_of(1), Err(FftError::InvalidLength { len: 1 }));
        assert_eq!(address_bits_of(12), Err(FftError::InvalidLength { len: 12 }));
    }

    #[test]
    fn test_padded() {
        let data = [1.0f64, 2.0, 3.0];
        assert!(matches!(get_padded(&data, 2), Cow::Borrowed(_)));
        assert!(matches!(get_padded(&data, 3), Cow::Borrowed(_)));

        let padded = get_padded(&data, 8);
        assert_eq!(padded.len(), 8);
        assert_eq!(&padded[..3], &data);
        assert!(padded[3..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_mantissa_bits() {
        assert_eq!(<f32 as FftFloat>::MANTISSA_BITS, 24);
        assert_eq!(<f64 as FftFloat>::MANTISSA_BITS, 53);
    }
}
