//! Error types for the proximity engine.

use proxmap_raster::RasterError;
use thiserror::Error;

/// Errors returned by [`compute_proximity`](crate::compute_proximity).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input and output bands differ in size.
    #[error("Input band is {input_width}x{input_height} but output band is {output_width}x{output_height}")]
    DimensionMismatch {
        /// Input width.
        input_width: usize,
        /// Input height.
        input_height: usize,
        /// Output width.
        output_width: usize,
        /// Output height.
        output_height: usize,
    },

    /// An algorithm option is malformed.
    #[error("Invalid option {key}={value}: {reason}")]
    InvalidOption {
        /// Option key as given.
        key: String,
        /// Offending value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Reading or writing one of the bands failed.
    #[error("Raster I/O failure: {0}")]
    Io(#[from] RasterError),

    /// The progress sink asked to stop.
    #[error("Proximity computation cancelled")]
    Cancelled,
}

impl EngineError {
    pub(crate) fn invalid_option(key: &str, value: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
