//! Hermitian packing for real-valued transforms
//!
//! A real signal of `N` samples is transformed as `N/2` complex samples
//! (even samples real, odd samples imaginary). The spectrum of the real
//! signal is then untangled from the complex one in place. The packed result
//! holds `Re X(0)` and `Re X(N/2)` in slots 0 and 1 (both bins are purely
//! real), followed by `Re X(k), Im X(k)` for `k = 1 .. N/2 - 1`. The inverse
//! pass re-tangles such a spectrum ahead of the inverse complex transform.

use crate::buffer::SharedSlice;
use crate::common::FftFloat;
use crate::twiddle::Twiddle;

/// Unpacks (forward) or re-packs (inverse) the conjugate bin pairs whose
/// lower slot falls in `[from, to)`. Lower slots live in `[2, n/2)`; the
/// partner of slot `r` is `n - r`. Slots 0 and 1 are left to
/// [`finish_forward`] and [`prepare_inverse`].
///
/// # Safety
/// Ranges given to concurrent tasks must not overlap.
pub(crate) unsafe fn load_real<T: FftFloat>(
    data: SharedSlice<'_, T>,
    from: usize,
    to: usize,
    forward: bool,
    mask: usize,
) {
    let n = data.len();

    // even slots in 2 .. n/2
    let from = (from & !1).max(2);
    let to = to.min(n >> 1) & !1;
    if from >= to {
        return;
    }

    let half = T::from_f64_lossy(0.5);
    let sh = if forward { half } else { -half };

    let mut w = Twiddle::<T>::new(n, forward, from >> 1, mask);

    let mut r1 = from;
    let mut r2 = n - from;
    while r1 < to {
        let i1 = r1 + 1;
        let i2 = r2 + 1;

        let hr = sh * (data.get(i1) + data.get(i2));
        let hi = sh * (data.get(r2) - data.get(r1));

        w.recalibrate(r1);
        let (wr, wi) = w.get();

        let r = wr * hr - wi * hi;
        let i = wr * hi + wi * hr;

        let hr = half * (data.get(r1) + data.get(r2));
        let hi = half * (data.get(i1) - data.get(i2));

        data.set(r1, hr + r);
        data.set(i1, hi + i);
        data.set(r2, hr - r);
        data.set(i2, i - hi);

        w.advance();
        r1 += 2;
        r2 -= 2;
    }
}

/// Folds the DC and Nyquist bins into slots 0 and 1 after unpacking.
pub(crate) fn finish_forward<T: FftFloat>(data: &mut [T]) {
    let d0 = data[0];
    data[0] = d0 + data[1];
    data[1] = d0 - data[1];
}

/// Splits slots 0 and 1 back into the packed DC term before the inverse
/// complex transform.
pub(crate) fn prepare_inverse<T: FftFloat>(data: &mut [T]) {
    let half = T::from_f64_lossy(0.5);
    let d0 = data[0];
    data[0] = half * (d0 + data[1]);
    data[1] = half * (d0 - data[1]);
}
