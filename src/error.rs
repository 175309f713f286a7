//! Error types for the transform engine

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FftError>;

/// Errors reported by the transform engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FftError {
    /// The buffer length is not a power of two (or too short to transform).
    #[error("buffer length {len} is not a supported power of two")]
    InvalidLength { len: usize },

    /// The window is empty or longer than the data it should slide over.
    #[error("window of {window} samples cannot be applied to {len} samples")]
    InvalidWindow { window: usize, len: usize },

    /// A worker task failed; the whole transform was aborted.
    #[error("{stage} stage failed: {message}")]
    Computation { stage: &'static str, message: String },

    /// The engine was shut down and has not been reconfigured since.
    #[error("transform engine used after shutdown")]
    Shutdown,

    /// The worker pool could not be created.
    #[error("worker pool unavailable: {0}")]
    Pool(String),
}

impl FftError {
    /// Name of the failing stage, for computation failures.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            FftError::Computation { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for FftError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        FftError::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = FftError::Computation {
            stage: "merge4",
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "merge4 stage failed: boom");
        assert_eq!(err.stage(), Some("merge4"));
        assert_eq!(FftError::Shutdown.stage(), None);
        assert_eq!(
            FftError::InvalidLength { len: 12 }.to_string(),
            "buffer length 12 is not a supported power of two"
        );
    }
}
