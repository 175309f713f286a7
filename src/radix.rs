//! Radix-2 and radix-4 merge stages
//!
//! After bit reversal the buffer holds `2^address_bits` one-sample transforms.
//! Every merge stage combines neighbouring blocks into larger ones: radix-2
//! merges pairs of blocks, radix-4 merges quadruples. A transform with an odd
//! number of address bits starts with one radix-2 stage; radix-4 stages do the
//! rest.
//!
//! Both kernels work on a `[from, to)` range of scalar slots of the whole
//! buffer, measured as if the buffer were evenly split into work. Internally
//! the range is compacted onto the slots of the first block of each group and
//! spread back out, so that any range aligned to 8 slots maps onto a set of
//! butterflies disjoint from every other such range.

use crate::buffer::SharedSlice;
use crate::common::FftFloat;
use crate::twiddle::Twiddle;

/// Maps a compacted index onto the first block of its group, skipping
/// `(1 << extra) - 1` sibling blocks of `1 << bits` slots per group.
#[inline]
fn spread(index: usize, bits: u32, extra: u32) -> usize {
    ((index >> bits) << (bits + extra)) + (index & ((1 << bits) - 1))
}

/// Radix-2 (Danielson-Lanczos) merge of pairs of `2^block_bits`-sample blocks.
///
/// # Safety
/// `from` and `to` are multiples of 4 within the buffer, and no concurrent
/// task covers an overlapping range.
pub(crate) unsafe fn merge2<T: FftFloat>(
    data: SharedSlice<'_, T>,
    from: usize,
    to: usize,
    forward: bool,
    block_bits: u32,
    mask: usize,
) {
    // block size in scalar slots
    let bits = block_bits + 1;
    let blk = 1usize << bits;
    let blkmask = blk - 1;

    let from = spread(from >> 1, bits, 1);
    let to = spread(to >> 1, bits, 1);

    // W = exp(±2πi/blk) over the blk complex samples of a merged pair
    let mut w = Twiddle::<T>::new(blk, forward, (from & blkmask) >> 1, mask);

    let mut i1 = from;
    while i1 < to {
        // skip the second block of each pair
        if i1 & blk != 0 {
            i1 += blk;
            if i1 >= to {
                break;
            }
            w.reset();
        }
        w.recalibrate(i1);
        let (r, i) = w.get();

        let d1r = data.get(i1);
        let d1i = data.get(i1 + 1);

        let i2 = i1 + blk;
        let d2r = data.get(i2);
        let d2i = data.get(i2 + 1);

        let xr = r * d2r - i * d2i;
        let xi = r * d2i + i * d2r;

        data.set(i2, d1r - xr);
        data.set(i2 + 1, d1i - xi);
        data.set(i1, d1r + xr);
        data.set(i1 + 1, d1i + xi);

        w.advance();
        i1 += 2;
    }
}

/// Radix-4 merge of quadruples of `2^block_bits`-sample blocks.
///
/// Only `W` comes from the recurrence; `W^2` and `W^3` are derived from it.
/// The quarter blocks arrive in bit-reversed order, so the second quarter
/// holds the even-odd sub-transform and takes `W^2`, the third takes `W`.
///
/// # Safety
/// `from` and `to` are multiples of 8 within the buffer, and no concurrent
/// task covers an overlapping range.
pub(crate) unsafe fn merge4<T: FftFloat>(
    data: SharedSlice<'_, T>,
    from: usize,
    to: usize,
    forward: bool,
    block_bits: u32,
    mask: usize,
) {
    let bits = block_bits + 1;
    let blk = 1usize << bits;
    let skip = 3 * blk;
    let blkmask = blk - 1;

    let from = spread(from >> 2, bits, 2);
    let to = spread(to >> 2, bits, 2);

    let mut w = Twiddle::<T>::new(blk << 1, forward, (from & blkmask) >> 1, mask);
    let two = T::one() + T::one();

    let mut i0 = from;
    while i0 < to {
        // skip the 2nd, 3rd and 4th quarter of each group
        if i0 & skip != 0 {
            i0 += skip;
            if i0 >= to {
                break;
            }
            w.reset();
        }

        let f0r = data.get(i0);
        let f0i = data.get(i0 + 1);

        w.recalibrate(i0);
        let (wr1, wi1) = w.get();

        let wr2 = wr1 * wr1 - wi1 * wi1;
        let wi2 = two * wr1 * wi1;

        let wr3 = wr1 * wr2 - wi1 * wi2;
        let wi3 = wr1 * wi2 + wi1 * wr2;

        let i1 = i0 + blk;
        let i2 = i1 + blk;
        let i3 = i2 + blk;

        let (dr, di) = (data.get(i1), data.get(i1 + 1));
        let f2r = wr2 * dr - wi2 * di;
        let f2i = wr2 * di + wi2 * dr;

        let (dr, di) = (data.get(i2), data.get(i2 + 1));
        let f1r = wr1 * dr - wi1 * di;
        let f1i = wr1 * di + wi1 * dr;

        let (dr, di) = (data.get(i3), data.get(i3 + 1));
        let f3r = wr3 * dr - wi3 * di;
        let f3i = wr3 * di + wi3 * dr;

        w.advance();

        // odd outputs: (f0 - f2) -/+ i (f1 - f3)
        let y0r = f0r - f2r;
        let y0i = f0i - f2i;
        let y2r = f1r - f3r;
        let y2i = f1i - f3i;

        if forward {
            data.set(i3, y0r + y2i);
            data.set(i3 + 1, y0i - y2r);
            data.set(i1, y0r - y2i);
            data.set(i1 + 1, y0i + y2r);
        } else {
            data.set(i3, y0r - y2i);
            data.set(i3 + 1, y0i + y2r);
            data.set(i1, y0r + y2i);
            data.set(i1 + 1, y0i - y2r);
        }

        // even outputs: (f0 + f2) +/- (f1 + f3)
        let y0r = f0r + f2r;
        let y0i = f0i + f2i;
        let y2r = f1r + f3r;
        let y2i = f1i + f3i;

        data.set(i2, y0r - y2r);
        data.set(i2 + 1, y0i - y2i);
        data.set(i0, y0r + y2r);
        data.set(i0 + 1, y0i + y2i);

        i0 += 2;
    }
}
