//! Window functions for spectral analysis
//!
//! Tables are generated for a given length. The cosine-sum windows are
//! symmetric over `n - 1` intervals; a table of length 1 is `[1]`.

use crate::common::FftFloat;

/// Window shapes available to the spectral helpers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Window {
    Rectangular,
    Hann,
    /// The default window of [`crate::SplitFFT::average_power_with_size`].
    #[default]
    Hamming,
    BlackmanHarris,
    /// Kaiser window with shape parameter `beta`.
    Kaiser { beta: f64 },
}

impl Window {
    /// Window table of length `n`.
    pub fn table<T: FftFloat>(&self, n: usize) -> Vec<T> {
        match *self {
            Window::Rectangular => rectangular(n),
            Window::Hann => hann(n),
            Window::Hamming => hamming(n),
            Window::BlackmanHarris => blackman_harris(n),
            Window::Kaiser { beta } => Kaiser::new(T::from_f64_lossy(beta)).table(n),
        }
    }
}

/// Evaluates `a0 - a1 cos(φ) + a2 cos(2φ) - a3 cos(3φ)` with `φ = 2πi/(n-1)`.
fn cosine_sum<T: FftFloat>(n: usize, coefficients: [f64; 4]) -> Vec<T> {
    if n <= 1 {
        return vec![T::one(); n];
    }
    let step = T::TAU() / T::from_index(n - 1);
    let [a0, a1, a2, a3] = coefficients.map(T::from_f64_lossy);
    let two = T::from_f64_lossy(2.0);
    let three = T::from_f64_lossy(3.0);
    (0..n)
        .map(|i| {
            let phase = step * T::from_index(i);
            a0 - a1 * phase.cos() + a2 * (two * phase).cos() - a3 * (three * phase).cos()
        })
        .collect()
}

/// All ones.
pub fn rectangular<T: FftFloat>(n: usize) -> Vec<T> {
    vec![T::one(); n]
}

/// `0.5 - 0.5 cos(2πi/(n-1))`
pub fn hann<T: FftFloat>(n: usize) -> Vec<T> {
    cosine_sum(n, [0.5, 0.5, 0.0, 0.0])
}

/// `0.54 - 0.46 cos(2πi/(n-1))`
pub fn hamming<T: FftFloat>(n: usize) -> Vec<T> {
    cosine_sum(n, [0.54, 0.46, 0.0, 0.0])
}

/// Four-term Blackman-Harris window.
pub fn blackman_harris<T: FftFloat>(n: usize) -> Vec<T> {
    cosine_sum(n, [0.35875, 0.48829, 0.14128, 0.01168])
}

/// The Kaiser window (almost) maximizes the energy in the main-lobe compared to the side-lobes.
pub struct Kaiser<T: FftFloat> {
    beta: T,
    inv_b0: T,
}

impl<T: FftFloat> Kaiser<T> {
    /// Create a Kaiser window with a given shape parameter.
    pub fn new(beta: T) -> Self {
        Self {
            beta,
            inv_b0: T::one() / Self::bessel0(beta),
        }
    }

    /// Create a Kaiser window with a specified main-lobe bandwidth (in bins).
    pub fn with_bandwidth(bandwidth: T) -> Self {
        Self::new(Self::bandwidth_to_beta(bandwidth))
    }

    pub fn bandwidth_to_beta(bandwidth: T) -> T {
        let bandwidth = bandwidth.max(T::from_f64_lossy(2.0));
        let alpha = (bandwidth * bandwidth * T::from_f64_lossy(0.25) - T::one()).sqrt();
        alpha * T::PI()
    }

    pub fn beta(&self) -> T {
        self.beta
    }

    /// Fills a slice with the window, sampled at bin centres.
    pub fn fill(&self, data: &mut [T]) {
        let inv_size = T::one() / T::from_index(data.len());
        let two = T::from_f64_lossy(2.0);
        for (i, value) in data.iter_mut().enumerate() {
            let r = (two * T::from_index(i) + T::one()) * inv_size - T::one();
            let arg = (T::one() - r * r).max(T::zero()).sqrt();
            *value = Self::bessel0(self.beta * arg) * self.inv_b0;
        }
    }

    pub fn table(&self, n: usize) -> Vec<T> {
        let mut data = vec![T::zero(); n];
        self.fill(&mut data);
        data
    }

    // Modified Bessel function of the first kind, order 0
    fn bessel0(x: T) -> T {
        let limit = T::from_f64_lossy(1e-4);
        let four = T::from_f64_lossy(4.0);
        let mut result = T::zero();
        let mut term = T::one();
        let mut m = T::zero();
        while term > limit {
            result = result + term;
            m = m + T::one();
            term = term * (x * x) / (four * m * m);
        }
        result
    }
}
