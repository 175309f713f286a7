//! Fast Fourier Transform engine
//!
//! [`SplitFFT`] runs in-place, power-of-two, split-radix (radix-2 and radix-4)
//! transforms on flat buffers of `f32` or `f64`. A buffer of `N` scalars is
//! read either as `N/2` interleaved complex samples (`re, im, re, im, ...`)
//! or as `N` real samples.
//!
//! Transforms run on the calling thread or are split across a worker pool
//! owned by the engine, one synchronised round per stage. The pool lives
//! until [`SplitFFT::shutdown`] or until the engine is dropped.
//!
//! The forward transform uses `exp(+2πi·jk/N)` and is not normalised.

use std::marker::PhantomData;
use std::thread;

use tracing::debug;

use crate::buffer::SharedSlice;
use crate::common::{address_bits_of, FftFloat};
use crate::config::{FftConfig, Threading};
use crate::error::{FftError, Result};
use crate::queue::{block_ranges, even_ranges, Queue, Stage, WorkerPool};
use crate::twiddle::error_mask;
use crate::{bitrev, radix, real};

/// Arithmetic operations per butterfly stage that contribute rounding error.
pub const OPS_PER_STAGE: f64 = 4.0;

/// Split-radix FFT engine with an optional worker pool.
///
/// One engine serves one call at a time (every transform borrows it
/// mutably); independent concurrent transforms need separate engines.
pub struct SplitFFT<T: FftFloat> {
    config: FftConfig,
    pool: Option<WorkerPool>,
    auto_thread: bool,
    shut_down: bool,
    last_address_bits: Option<(usize, u32)>,
    _element: PhantomData<T>,
}

impl<T: FftFloat> Default for SplitFFT<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FftFloat> SplitFFT<T> {
    /// A sequential engine with the default configuration and no pool.
    pub fn new() -> Self {
        Self {
            config: FftConfig::default(),
            pool: None,
            auto_thread: false,
            shut_down: false,
            last_address_bits: None,
            _element: PhantomData,
        }
    }

    /// An engine configured up front. A `Parallel` strategy starts its pool
    /// immediately.
    pub fn with_config(config: FftConfig) -> Result<Self> {
        let mut fft = Self::new();
        fft.config = config
            .with_chunks_per_thread(config.chunks_per_thread)
            .with_error_bits(config.error_bits);
        match config.threading {
            Threading::Sequential => fft.set_sequential(),
            Threading::Parallel(threads) => fft.set_parallel(threads)?,
            Threading::Auto => fft.auto_thread(),
        }
        Ok(fft)
    }

    /// The current configuration.
    pub fn config(&self) -> FftConfig {
        self.config
    }

    // ------------------------------------------------------------------
    // Execution strategy

    /// Runs everything on the calling thread, releasing any pool.
    pub fn set_sequential(&mut self) {
        self.auto_thread = false;
        self.shut_down = false;
        self.config.threading = Threading::Sequential;
        self.pool = None;
    }

    /// Uses a fixed pool of `threads` workers; `threads <= 1` is sequential.
    pub fn set_parallel(&mut self, threads: usize) -> Result<()> {
        self.auto_thread = false;
        self.shut_down = false;
        self.config.threading = if threads > 1 {
            Threading::Parallel(threads)
        } else {
            Threading::Sequential
        };
        self.resize_pool(threads)
    }

    /// Picks the thread count from the size of each transform.
    pub fn auto_thread(&mut self) {
        self.auto_thread = true;
        self.shut_down = false;
        self.config.threading = Threading::Auto;
    }

    pub fn is_auto_threaded(&self) -> bool {
        self.auto_thread
    }

    /// Current number of worker threads (1 when sequential).
    pub fn parallel(&self) -> usize {
        self.pool.as_ref().map_or(1, WorkerPool::threads)
    }

    /// Number of tasks each parallel stage is split into.
    pub fn chunks(&self) -> usize {
        match &self.pool {
            Some(pool) => self.config.chunks_per_thread * pool.threads(),
            None => 1,
        }
    }

    pub fn chunks_per_thread(&self) -> usize {
        self.config.chunks_per_thread
    }

    pub fn set_chunks_per_thread(&mut self, chunks: usize) {
        self.config = self.config.with_chunks_per_thread(chunks);
    }

    pub fn error_bits(&self) -> i32 {
        self.config.error_bits
    }

    /// Sets the twiddle error-bit budget (see [`crate::twiddle::error_mask`]).
    pub fn set_error_bits(&mut self, bits: i32) {
        self.config = self.config.with_error_bits(bits);
    }

    /// Releases the worker pool, waiting for its threads to exit.
    ///
    /// Transforms fail with [`FftError::Shutdown`] until the engine is
    /// reconfigured.
    pub fn shutdown(&mut self) {
        self.pool = None;
        self.auto_thread = false;
        self.shut_down = true;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn resize_pool(&mut self, threads: usize) -> Result<()> {
        if threads <= 1 {
            self.pool = None;
            return Ok(());
        }
        if self.parallel() == threads {
            return Ok(());
        }
        // let the old workers go before starting new ones
        self.pool = None;
        self.pool = Some(WorkerPool::new(threads)?);
        Ok(())
    }

    /// Hardware threads available to the process.
    pub fn max_threads() -> usize {
        thread::available_parallelism().map_or(1, |n| n.get())
    }

    /// Thread count the auto-threading heuristic picks for a transform with
    /// `address_bits` address bits.
    pub fn optimal_threads(address_bits: u32) -> usize {
        if address_bits > T::OPTIMAL_THREAD_BITS {
            let shift = (address_bits - T::OPTIMAL_THREAD_BITS).min(usize::BITS - 2);
            Self::max_threads().min(1 << shift)
        } else {
            1
        }
    }

    fn update_threads(&mut self, address_bits: u32) -> Result<()> {
        if !self.auto_thread {
            return Ok(());
        }
        let threads = Self::optimal_threads(address_bits);
        if threads != self.parallel() {
            debug!(address_bits, threads, "auto-threading");
        }
        self.resize_pool(threads)
    }

    // ------------------------------------------------------------------
    // Validation

    /// Address bits of `len`, remembered for repeated calls of one size.
    fn address_bits(&mut self, len: usize) -> Result<u32> {
        if let Some((cached_len, bits)) = self.last_address_bits {
            if cached_len == len {
                return Ok(bits);
            }
        }
        let bits = address_bits_of(len)?;
        self.last_address_bits = Some((len, bits));
        Ok(bits)
    }

    /// Checks a buffer and settles the thread count for it.
    fn prepare(&mut self, len: usize) -> Result<u32> {
        if self.shut_down {
            return Err(FftError::Shutdown);
        }
        let bits = self.address_bits(len)?;
        self.update_threads(bits)?;
        Ok(bits)
    }

    fn mask(&self) -> usize {
        error_mask(self.config.error_bits)
    }

    // ------------------------------------------------------------------
    // Complex transforms

    /// In-place forward complex transform of `data.len() / 2` interleaved
    /// samples. Not normalised.
    pub fn complex_forward(&mut self, data: &mut [T]) -> Result<()> {
        self.complex_transform(data, true)
    }

    /// In-place inverse complex transform. `complex_back(complex_forward(z))`
    /// yields `N/2 · z`.
    pub fn complex_back(&mut self, data: &mut [T]) -> Result<()> {
        self.complex_transform(data, false)
    }

    pub fn complex_transform(&mut self, data: &mut [T], forward: bool) -> Result<()> {
        let address_bits = self.prepare(data.len())?;
        self.run_complex(data, forward, address_bits)
    }

    fn run_complex(&self, data: &mut [T], forward: bool, address_bits: u32) -> Result<()> {
        match &self.pool {
            Some(pool) if self.chunks() > 1 && data.len() >= 16 => {
                parallel_complex(pool, data, forward, address_bits, self.chunks(), self.mask())
            }
            _ => {
                sequential_complex(data, forward, address_bits, self.mask());
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Real transforms

    /// In-place real transform.
    ///
    /// Forward: `N` real samples become the packed half spectrum
    /// `[Re X0, Re X(N/2), Re X1, Im X1, ...]`, not normalised.
    /// Inverse: a packed spectrum becomes `N/2` times the real signal.
    pub fn real_transform(&mut self, data: &mut [T], forward: bool) -> Result<()> {
        let address_bits = self.prepare(data.len())?;
        self.run_real(data, forward, address_bits)
    }

    fn run_real(&self, data: &mut [T], forward: bool, address_bits: u32) -> Result<()> {
        if forward {
            self.run_complex(data, true, address_bits)?;
        }

        let mask = self.mask();
        match &self.pool {
            Some(pool) if self.chunks() > 1 && data.len() >= 16 => {
                let mut queue = Queue::new(pool, mask);
                // tasks own the lower slots of the conjugate pairs
                queue.add_all(Stage::RealPack { forward }, &block_ranges(data.len() >> 1, self.chunks()));
                queue.process(data)?;
            }
            _ => {
                let half = data.len() >> 1;
                // Safety: single task over all pairs.
                unsafe { real::load_real(SharedSlice::new(data), 0, half, forward, mask) };
            }
        }

        if forward {
            real::finish_forward(data);
            Ok(())
        } else {
            real::prepare_inverse(data);
            self.run_complex(data, false, address_bits)
        }
    }

    /// Forward real transform normalised to amplitudes (scaled by `2/N`).
    pub fn real_to_amplitude(&mut self, data: &mut [T]) -> Result<()> {
        let address_bits = self.prepare(data.len())?;
        self.run_real(data, true, address_bits)?;
        let factor = T::from_f64_lossy(2.0) / T::from_index(data.len());
        self.scale(data, factor)
    }

    /// Inverse of [`SplitFFT::real_to_amplitude`].
    pub fn amplitude_to_real(&mut self, data: &mut [T]) -> Result<()> {
        self.real_transform(data, false)
    }

    /// Multiplies every element by `factor`, in parallel when configured.
    pub(crate) fn scale(&self, data: &mut [T], factor: T) -> Result<()> {
        match &self.pool {
            Some(pool) if self.chunks() > 1 => {
                let mut queue = Queue::new(pool, 0);
                queue.add_all(Stage::Scale { factor }, &even_ranges(data.len(), self.chunks()));
                queue.process(data)
            }
            _ => {
                data.iter_mut().for_each(|x| *x = *x * factor);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Precision diagnostics

    /// Estimated bits of rounding error accumulated by a transform of
    /// `data`: the twiddle budget plus `log2(stages × operations per stage)`.
    /// Zero when the length is not transformable.
    pub fn max_error_bits_for(&self, data: &[T]) -> f64 {
        match address_bits_of(data.len()) {
            Ok(bits) if bits > 0 => {
                f64::from(self.config.error_bits) + (f64::from(bits) * OPS_PER_STAGE).log2()
            }
            _ => 0.0,
        }
    }

    /// Smallest relative amplitude resolved reliably.
    pub fn min_precision_for(&self, data: &[T]) -> f64 {
        (self.max_error_bits_for(data) - f64::from(T::MANTISSA_BITS)).exp2()
    }

    /// Mantissa bits expected to survive a transform of `data`.
    pub fn min_significant_bits(&self, data: &[T]) -> f64 {
        f64::from(T::MANTISSA_BITS) - self.max_error_bits_for(data)
    }

    /// Dynamic range in dB.
    pub fn dynamic_range(&self, data: &[T]) -> f64 {
        -20.0 * self.min_precision_for(data).log10()
    }
}

fn sequential_complex<T: FftFloat>(data: &mut [T], forward: bool, address_bits: u32, mask: usize) {
    let len = data.len();
    let view = SharedSlice::new(data);
    // Safety: one task over the whole buffer.
    unsafe {
        bitrev::permute(view, 0, len, address_bits);

        let mut block_bits = 0;
        if address_bits & 1 != 0 {
            radix::merge2(view, 0, len, forward, block_bits, mask);
            block_bits += 1;
        }
        while block_bits < address_bits {
            radix::merge4(view, 0, len, forward, block_bits, mask);
            block_bits += 2;
        }
    }
}

fn parallel_complex<T: FftFloat>(
    pool: &WorkerPool,
    data: &mut [T],
    forward: bool,
    address_bits: u32,
    chunks: usize,
    mask: usize,
) -> Result<()> {
    let ranges = block_ranges(data.len(), chunks);
    let mut queue = Queue::new(pool, mask);

    queue.add_all(Stage::BitReverse { address_bits }, &ranges);
    queue.process(data)?;

    let mut block_bits = 0;
    if address_bits & 1 != 0 {
        queue.add_all(Stage::Merge2 { block_bits, forward }, &ranges);
        queue.process(data)?;
        block_bits += 1;
    }
    while block_bits < address_bits {
        queue.add_all(Stage::Merge4 { block_bits, forward }, &ranges);
        queue.process(data)?;
        block_bits += 2;
    }
    Ok(())
}
