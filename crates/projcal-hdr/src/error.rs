//! HDR error types.

use thiserror::Error;

/// Result type for HDR operations.
pub type HdrResult<T> = Result<T, HdrError>;

/// Errors raised while recovering a camera response or merging brackets.
#[derive(Debug, Error)]
pub enum HdrError {
    /// No brackets were supplied.
    #[error("empty bracket set")]
    EmptyStack,

    /// A bracket does not match the size of the first one.
    #[error("bracket {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        /// Bracket index
        index: usize,
        /// Bracket width
        width: u32,
        /// Bracket height
        height: u32,
        /// Width of the first bracket
        expected_width: u32,
        /// Height of the first bracket
        expected_height: u32,
    },

    /// A bracket exposure is zero, negative or not finite.
    #[error("bracket {index} has invalid exposure {exposure}")]
    InvalidExposure {
        /// Bracket index
        index: usize,
        /// Offending exposure
        exposure: f32,
    },

    /// A response table does not have 256 entries.
    #[error("response curve for channel {channel} has {len} entries, expected 256")]
    InvalidResponse {
        /// Channel index
        channel: usize,
        /// Number of entries
        len: usize,
    },

    /// The least-squares response solve failed.
    #[error("response solve failed: {0}")]
    SolveFailed(String),

    /// Core raster error.
    #[error(transparent)]
    Core(#[from] projcal_core::Error),
}
