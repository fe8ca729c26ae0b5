//! Raster errors.
//!
//! Frames, radiance images and masks validate their size on construction;
//! binary operations check that both operands share a size.
//!
//! ```rust
//! use projcal_core::{Error, LdrFrame};
//!
//! let err = LdrFrame::from_raw(4, 4, vec![0; 5]).unwrap_err();
//! assert!(matches!(err, Error::InvalidDimensions { width: 4, height: 4, .. }));
//! ```

use thiserror::Error;

/// Result alias for raster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Raster construction and combination failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Two rasters of different size were combined.
    #[error("size mismatch: {left:?} vs {right:?}")]
    DimensionMismatch {
        /// Left operand (width, height)
        left: (u32, u32),
        /// Right operand (width, height)
        right: (u32, u32),
    },

    /// Zero-sized raster, or a buffer that does not fit the size.
    #[error("bad raster {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Width
        width: u32,
        /// Height
        height: u32,
        /// What is wrong
        reason: String,
    },
}

impl Error {
    /// [`Error::InvalidDimensions`] for a `width` x `height` raster.
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::InvalidDimensions { width, height, reason }
    }

    /// [`Error::DimensionMismatch`] from two (width, height) pairs.
    pub fn dimension_mismatch(left: (u32, u32), right: (u32, u32)) -> Self {
        Self::DimensionMismatch { left, right }
    }
}
