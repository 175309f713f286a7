//! Twiddle-factor generation by angle recurrence
//!
//! Instead of a lookup table, the kernels rotate a `(cos, sin)` pair by a
//! fixed increment for every butterfly. Rounding error in the recurrence grows
//! with the number of steps, so the pair is periodically recomputed directly
//! from `cos`/`sin`. The recomputation interval follows from the error-bit
//! budget: after `2^(2 * (bits + 1))` scalar slots (half as many complex
//! steps), the random-walk drift amounts to about `bits` bits.

use std::f64::consts::TAU;
use std::marker::PhantomData;

use crate::common::FftFloat;

/// Largest error-bit budget honoured by [`error_mask`].
pub const MAX_ERROR_BITS: i32 = 14;

/// Slot mask for the recalculation interval of the given error-bit budget.
///
/// A slot index `i` triggers a direct recomputation when `i & mask == 0`. A
/// budget of `-1` yields mask 0, i.e. every twiddle factor is computed
/// directly.
#[inline]
pub fn error_mask(error_bits: i32) -> usize {
    let bits = error_bits.clamp(-1, MAX_ERROR_BITS);
    (1usize << ((bits + 1) << 1)) - 1
}

/// Scoped `(cos, sin)` generator. Lives on the stack of one kernel call.
///
/// The recurrence runs in `f64` whatever the element type; factors are
/// narrowed to `T` only when read.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Twiddle<T> {
    theta: f64,
    c: f64,
    s: f64,
    re: f64,
    im: f64,
    mask: usize,
    period_mask: usize,
    _element: PhantomData<T>,
}

impl<T: FftFloat> Twiddle<T> {
    /// Generator for the `period`-th roots of unity (`period` a power of two,
    /// counted in complex steps), seeded at step `m`. The forward direction
    /// rotates by `+2π/period`.
    pub(crate) fn new(period: usize, forward: bool, m: usize, mask: usize) -> Self {
        debug_assert!(period.is_power_of_two());
        let theta = if forward { TAU } else { -TAU } / period as f64;
        let period_mask = period - 1;
        let (im, re) = ((m & period_mask) as f64 * theta).sin_cos();
        Self {
            theta,
            c: theta.cos(),
            s: theta.sin(),
            re,
            im,
            mask,
            period_mask,
            _element: PhantomData,
        }
    }

    /// Current factor as `(re, im)`.
    #[inline(always)]
    pub(crate) fn get(&self) -> (T, T) {
        (T::from_f64_lossy(self.re), T::from_f64_lossy(self.im))
    }

    /// Back to angle zero, at the start of a new block.
    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        self.re = 1.0;
        self.im = 0.0;
    }

    /// Recomputes the factor directly when `slot` falls on the recalculation
    /// interval. `slot` is the scalar index of the real part; whole periods
    /// are dropped before the angle is formed.
    #[inline(always)]
    pub(crate) fn recalibrate(&mut self, slot: usize) {
        if slot & self.mask == 0 {
            let step = (slot >> 1) & self.period_mask;
            let (im, re) = (step as f64 * self.theta).sin_cos();
            self.re = re;
            self.im = im;
        }
    }

    /// Rotates by one angle increment.
    #[inline(always)]
    pub(crate) fn advance(&mut self) {
        let re = self.re;
        self.re = re * self.c - self.im * self.s;
        self.im = self.im * self.c + re * self.s;
    }
}
