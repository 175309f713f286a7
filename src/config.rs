//! Execution-strategy configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of task chunks handed out per worker thread.
pub const DEFAULT_CHUNKS_PER_THREAD: usize = 2;

/// Default twiddle error-bit budget.
///
/// Twiddle factors are recalculated directly every `2^(2 * (error_bits + 1))`
/// scalar slots, which keeps the recurrence drift to roughly `error_bits` bits.
pub const DEFAULT_ERROR_BITS: i32 = 3;

/// How transforms are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Threading {
    /// Everything runs on the calling thread.
    #[default]
    Sequential,
    /// A fixed pool of the given number of threads. `n <= 1` is sequential.
    Parallel(usize),
    /// Thread count derived from the transform size on every call.
    Auto,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FftConfig {
    pub threading: Threading,
    pub chunks_per_thread: usize,
    pub error_bits: i32,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            threading: Threading::Sequential,
            chunks_per_thread: DEFAULT_CHUNKS_PER_THREAD,
            error_bits: DEFAULT_ERROR_BITS,
        }
    }
}

impl FftConfig {
    /// Sets the scheduling strategy.
    pub fn with_threading(mut self, threading: Threading) -> Self {
        self.threading = threading;
        self
    }

    /// Sets the number of chunks per worker thread (at least 1).
    pub fn with_chunks_per_thread(mut self, chunks: usize) -> Self {
        self.chunks_per_thread = chunks.max(1);
        self
    }

    /// Sets the twiddle error-bit budget. Negative values select the most
    /// precise setting, `-1`, where every twiddle factor is computed directly.
    pub fn with_error_bits(mut self, bits: i32) -> Self {
        self.error_bits = bits.max(-1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FftConfig::default();
        assert_eq!(config.threading, Threading::Sequential);
        assert_eq!(config.chunks_per_thread, 2);
        assert_eq!(config.error_bits, 3);
    }

    #[test]
    fn test_builder_clamps() {
        let config = FftConfig::default()
            .with_threading(Threading::Parallel(4))
            .with_chunks_per_thread(0)
            .with_error_bits(-7);
        assert_eq!(config.threading, Threading::Parallel(4));
        assert_eq!(config.chunks_per_thread, 1);
        assert_eq!(config.error_bits, -1);
    }
}
