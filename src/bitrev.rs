//! Bit-reversal permutation
//!
//! Decimation-in-time ordering: complex sample `i` trades places with the
//! sample at the bit-reversal of `i` over the address bits. Reversal is
//! composed from an 8-bit lookup table, one byte at a time.

use crate::buffer::SharedSlice;

const fn reverse_byte_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut value = i as u8;
        let mut reversed = 0u8;
        let mut bit = 0;
        while bit < 8 {
            reversed = (reversed << 1) | (value & 1);
            value >>= 1;
            bit += 1;
        }
        table[i] = reversed;
        i += 1;
    }
    table
}

static REVERSED_BYTES: [u8; 256] = reverse_byte_table();

/// Reverses the lowest `bits` bits of `i` (`bits <= 32`).
#[inline]
pub fn bit_reverse(i: usize, bits: u32) -> usize {
    debug_assert!(bits <= 32);
    let br = |shift: u32| REVERSED_BYTES[(i >> shift) & 0xFF] as usize;
    match bits {
        0 => 0,
        1..=8 => br(0) >> (8 - bits),
        9..=16 => (br(8) | br(0) << 8) >> (16 - bits),
        17..=24 => (br(16) | br(8) << 8 | br(0) << 16) >> (24 - bits),
        _ => (br(24) | br(16) << 8 | br(8) << 16 | br(0) << 24) >> (32 - bits),
    }
}

/// Swaps the complex samples whose real-part slots fall in `[from, to)` with
/// their bit-reversed partners. Each pair is resolved by the slot holding the
/// lower index, so disjoint `[from, to)` ranges never touch the same pair.
///
/// # Safety
/// `from` and `to` are even and within the buffer, and no concurrent task
/// covers an overlapping range.
pub(crate) unsafe fn permute<T: Copy>(data: SharedSlice<'_, T>, from: usize, to: usize, address_bits: u32) {
    let mut i = from;
    while i < to {
        let j = bit_reverse(i >> 1, address_bits) << 1;
        if j > i {
            data.swap(i, j);
            data.swap(i + 1, j + 1);
        }
        i += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(i: usize, bits: u32) -> usize {
        (0..bits).fold(0, |acc, b| (acc << 1) | ((i >> b) & 1))
    }

    #[test]
    fn test_bit_reverse_matches_naive() {
        for bits in [1u32, 3, 8, 9, 13, 16, 17, 24, 25, 32] {
            for i in [0usize, 1, 2, 5, 77, 255, 256, 1023, 4097, 65_535, 70_001] {
                let i = i & ((1usize << bits) - 1);
                assert_eq!(bit_reverse(i, bits), naive(i, bits), "i={i} bits={bits}");
            }
        }
        assert_eq!(bit_reverse(0, 0), 0);
    }

    #[test]
    fn test_permute_orders_samples() {
        // 8 complex samples, real part = index
        let mut data: Vec<f64> = (0..8).flat_map(|i| [i as f64, -(i as f64)]).collect();
        unsafe { permute(SharedSlice::new(&mut data), 0, 16, 3) };
        let order: Vec<f64> = data.iter().step_by(2).copied().collect();
        assert_eq!(order, vec![0.0, 4.0, 2.0, 6.0, 1.0, 5.0, 3.0, 7.0]);
        assert!(data.chunks(2).all(|c| c[0] == -c[1]));
    }

    #[test]
    fn test_permute_in_chunks_equals_whole() {
        let original: Vec<f32> = (0..256).map(|i| i as f32).collect();
        let mut whole = original.clone();
        let mut chunked = original.clone();
        unsafe {
            permute(SharedSlice::new(&mut whole), 0, 256, 7);
            let view = SharedSlice::new(&mut chunked);
            for from in (0..256).step_by(40) {
                permute(view, from, (from + 40).min(256), 7);
            }
        }
        assert_eq!(whole, chunked);

        // applying it twice restores the order
        unsafe { permute(SharedSlice::new(&mut whole), 0, 256, 7) };
        assert_eq!(whole, original);
    }
}
