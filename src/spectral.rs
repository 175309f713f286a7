//! Spectral estimation on top of the transform engine
//!
//! Welch averaged periodograms, FFT convolution and auto-correlation, and the
//! amplitude spectrum of a zero-padded buffer. All of these work on private
//! scratch buffers; the caller's data is never modified.

use num_complex::Complex;

use crate::common::{get_padded, pow2_ceil, FftFloat, FORWARD, BACK};
use crate::error::{FftError, Result};
use crate::fft::SplitFFT;
use crate::windows;

impl<T: FftFloat> SplitFFT<T> {
    /// Welch averaged power spectrum.
    ///
    /// `data` is cut into segments of `window.len()` samples overlapping by
    /// half, each weighted by `window`, zero-padded to a power of two and
    /// transformed. The squared magnitudes are averaged over all segments.
    /// The result has `pow2_ceil(window.len()) / 2 + 1` bins from DC to
    /// Nyquist and is not normalised: white noise of variance `σ²` averages
    /// to `σ² Σ w²` in every bin.
    pub fn average_power(&mut self, data: &[T], window: &[T]) -> Result<Vec<T>> {
        let window_size = window.len();
        if window_size == 0 || window_size > data.len() {
            return Err(FftError::InvalidWindow {
                window: window_size,
                len: data.len(),
            });
        }

        let step = (window_size >> 1).max(1);
        let mut block = vec![T::zero(); pow2_ceil(window_size).max(2)];
        let bins = block.len() >> 1;
        let mut spectrum = vec![T::zero(); bins + 1];

        let mut start = 0;
        let mut segments = 0usize;
        while start + window_size <= data.len() {
            for ((b, &w), &x) in block.iter_mut().zip(window).zip(&data[start..]) {
                *b = w * x;
            }
            block[window_size..].fill(T::zero());
            self.real_transform(&mut block, FORWARD)?;

            spectrum[0] = spectrum[0] + block[0] * block[0];
            spectrum[bins] = spectrum[bins] + block[1] * block[1];
            for (k, pair) in block.chunks_exact(2).enumerate().skip(1) {
                spectrum[k] = spectrum[k] + pair[0] * pair[0] + pair[1] * pair[1];
            }

            start += step;
            segments += 1;
        }

        let norm = T::one() / T::from_index(segments);
        spectrum.iter_mut().for_each(|p| *p = *p * norm);
        Ok(spectrum)
    }

    /// Welch averaged power with a Hamming window of `window_size` samples.
    /// Shorter data is zero-padded to a single segment.
    pub fn average_power_with_size(&mut self, data: &[T], window_size: usize) -> Result<Vec<T>> {
        if window_size == 0 {
            return Err(FftError::InvalidWindow {
                window: 0,
                len: data.len(),
            });
        }
        let padded = get_padded(data, window_size);
        let window = windows::hamming(window_size);
        self.average_power(&padded, &window)
    }

    /// Linear convolution of `a` and `b`.
    ///
    /// Returns the full zero-padded buffer of `pow2_ceil(a.len() + b.len())`
    /// samples; the convolution occupies its first `a.len() + b.len() - 1`.
    pub fn convolve(&mut self, a: &[T], b: &[T]) -> Result<Vec<T>> {
        let n = pow2_ceil(a.len() + b.len()).max(2);
        let mut x = get_padded(a, n).into_owned();
        let mut y = get_padded(b, n).into_owned();

        self.real_transform(&mut x, FORWARD)?;
        self.real_transform(&mut y, FORWARD)?;

        // DC and Nyquist are real
        x[0] = x[0] * y[0];
        x[1] = x[1] * y[1];
        for (p, q) in x.chunks_exact_mut(2).zip(y.chunks_exact(2)).skip(1) {
            let product = Complex::new(p[0], p[1]) * Complex::new(q[0], q[1]);
            p[0] = product.re;
            p[1] = product.im;
        }

        self.real_transform(&mut x, BACK)?;
        self.scale(&mut x, T::from_f64_lossy(2.0) / T::from_index(n))?;
        Ok(x)
    }

    /// Auto-correlation of `a`, computed from its power spectrum.
    ///
    /// Lag `k >= 0` is at index `k`; negative lags wrap around to the end of
    /// the `pow2_ceil(2 * a.len())` sample result.
    pub fn auto_correlate(&mut self, a: &[T]) -> Result<Vec<T>> {
        let n = pow2_ceil(a.len() << 1).max(2);
        let mut x = get_padded(a, n).into_owned();

        self.real_transform(&mut x, FORWARD)?;
        x[0] = x[0] * x[0];
        x[1] = x[1] * x[1];
        for pair in x.chunks_exact_mut(2).skip(1) {
            pair[0] = Complex::new(pair[0], pair[1]).norm_sqr();
            pair[1] = T::zero();
        }

        self.real_transform(&mut x, BACK)?;
        self.scale(&mut x, T::from_f64_lossy(2.0) / T::from_index(n))?;
        Ok(x)
    }

    /// Amplitude spectrum of `data` zero-padded to `n` samples: `n / 2 + 1`
    /// bins from DC to Nyquist, scaled by `2 / n` so a unit sinusoid on a bin
    /// reads as magnitude 1.
    pub fn spectrum(&mut self, data: &[T], n: usize) -> Result<Vec<Complex<T>>> {
        if data.len() > n {
            return Err(FftError::InvalidWindow {
                window: n,
                len: data.len(),
            });
        }
        let mut buf = get_padded(data, n).into_owned();
        self.real_to_amplitude(&mut buf)?;

        let bins = n >> 1;
        let mut spectrum = Vec::with_capacity(bins + 1);
        spectrum.push(Complex::new(buf[0], T::zero()));
        spectrum.extend(buf.chunks_exact(2).skip(1).map(|pair| Complex::new(pair[0], pair[1])));
        spectrum.push(Complex::new(buf[1], T::zero()));
        Ok(spectrum)
    }
}
