//! Spline error types.

use thiserror::Error;

/// Result type for spline operations.
pub type SplineResult<T> = Result<T, SplineError>;

/// Errors raised while fitting or evaluating an interpolating spline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplineError {
    /// Not enough knots for the requested interpolation kind.
    #[error("insufficient number of points: {kind} needs {required}, got {got}")]
    TooFewPoints {
        /// Interpolation kind name
        kind: &'static str,
        /// Minimum number of points
        required: usize,
        /// Points provided
        got: usize,
    },

    /// Knot abscissas and ordinates have different lengths.
    #[error("length mismatch: {xs} abscissas vs {ys} ordinates")]
    LengthMismatch {
        /// Number of abscissas
        xs: usize,
        /// Number of ordinates
        ys: usize,
    },

    /// Abscissas are not strictly increasing.
    #[error("x values must be strictly increasing (index {index})")]
    NotIncreasing {
        /// First offending index
        index: usize,
    },

    /// A knot value is NaN or infinite.
    #[error("non-finite knot value at index {index}")]
    NonFinite {
        /// Offending index
        index: usize,
    },

    /// Evaluation outside the interpolation domain.
    #[error("interpolation error: {x} outside [{min}, {max}]")]
    OutOfDomain {
        /// Query
        x: f64,
        /// Domain minimum
        min: f64,
        /// Domain maximum
        max: f64,
    },
}
