//! # Split FFT
//!
//! In-place, power-of-two Fast Fourier Transforms for `f32` and `f64`
//! buffers, with optional parallel execution on an engine-owned worker pool.
//!
//! ## Features
//!
//! - **Complex transforms**: split-radix (radix-2 + radix-4) on interleaved `re, im` buffers
//! - **Real transforms**: Hermitian-packed half spectrum, unnormalised or amplitude-scaled
//! - **Parallel stages**: every stage is split into independent tasks and run on a rayon pool
//! - **Twiddle control**: recurrence-generated twiddle factors with a tunable error-bit budget
//! - **Precision diagnostics**: error-bit, precision and dynamic-range estimates per buffer
//! - **Spectral helpers**: Welch averaged power, convolution, auto-correlation, amplitude spectra
//! - **Windows**: Hamming, Hann, Blackman-Harris, Kaiser and rectangular tables
//!
//! ## Example
//!
//! ```
//! use split_fft::SplitFFT;
//!
//! let mut fft = SplitFFT::<f64>::new();
//! let mut data: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
//! let original = data.clone();
//!
//! fft.real_to_amplitude(&mut data).unwrap();
//! fft.amplitude_to_real(&mut data).unwrap();
//!
//! for (a, b) in data.iter().zip(&original) {
//!     assert!((a - b).abs() < 1e-12);
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod twiddle;
pub mod bitrev;
pub mod fft;
pub mod spectral;
pub mod windows;

mod buffer;
mod queue;
mod radix;
mod real;

pub use bitrev::bit_reverse;
pub use common::{get_padded, FftFloat, BACK, FORWARD};
pub use config::{FftConfig, Threading};
pub use error::{FftError, Result};
pub use fft::SplitFFT;
pub use twiddle::error_mask;
pub use windows::Window;
