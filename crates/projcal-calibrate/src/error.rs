//! Error types for the calibration pipeline.
//!
//! Errors fall in two groups:
//!
//! - run-level failures (camera, capture, region detection, configuration)
//!   that abort a calibration run
//! - per-projector failures (degenerate curves, singular mixing matrices,
//!   numeric failures) that are recorded in the report while the run goes on
//!
//! [`CalibrationError::is_localized`] tells them apart.

use projcal_core::Channel;
use thiserror::Error;

/// Calibration pipeline error.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The camera reported it is not ready or could not be acquired.
    #[error("calibration camera is not ready")]
    CameraNotReady,

    /// A single frame capture or decode failed.
    #[error("capture failed during {stage}: {reason}")]
    CaptureFailure {
        /// Pipeline stage
        stage: &'static str,
        /// Camera error message
        reason: String,
    },

    /// A sampled channel has no usable dynamic range.
    #[error("degenerate response curve for projector {projector}, {channel} channel")]
    DegenerateCurve {
        /// Projector name
        projector: String,
        /// Affected channel
        channel: Channel,
    },

    /// The channel mixing matrix cannot be inverted.
    #[error("singular color mixing matrix for projector {projector}")]
    SingularMixMatrix {
        /// Projector name
        projector: String,
    },

    /// Spline fitting or evaluation failed.
    #[error("numeric failure for projector {projector}, {channel} channel: {reason}")]
    NumericFailure {
        /// Projector name
        projector: String,
        /// Affected channel
        channel: Channel,
        /// Underlying error message
        reason: String,
    },

    /// An iterative search hit its iteration cap.
    #[error("{stage} did not converge after {iterations} iterations")]
    ConvergenceFailure {
        /// Pipeline stage
        stage: &'static str,
        /// Iterations performed
        iterations: usize,
    },

    /// No projected region could be found in the difference image.
    #[error("projector region not found: {reason}")]
    RegionNotFound {
        /// Why detection failed
        reason: String,
    },

    /// The control plane listed no projectors.
    #[error("no projectors found in category '{category}'")]
    NoProjectors {
        /// Category that was queried
        category: String,
    },

    /// A calibration run is already in progress.
    #[error("a calibration run is already in progress")]
    AlreadyRunning,

    /// Invalid configuration value or file.
    #[error("configuration error: {0}")]
    Config(String),

    /// HDR capture error.
    #[error("HDR error: {0}")]
    Hdr(#[from] projcal_hdr::HdrError),

    /// LUT error.
    #[error("LUT error: {0}")]
    Lut(#[from] projcal_lut::LutError),

    /// Raster error.
    #[error(transparent)]
    Core(#[from] projcal_core::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or YAML (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CalibrationError {
    /// Returns true for failures scoped to one projector or channel.
    pub fn is_localized(&self) -> bool {
        matches!(
            self,
            CalibrationError::DegenerateCurve { .. }
                | CalibrationError::SingularMixMatrix { .. }
                | CalibrationError::NumericFailure { .. }
        )
    }
}

impl From<serde_json::Error> for CalibrationError {
    fn from(e: serde_json::Error) -> Self {
        CalibrationError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for CalibrationError {
    fn from(e: serde_yaml::Error) -> Self {
        CalibrationError::Serialization(e.to_string())
    }
}

/// Result type for calibration operations.
pub type CalibrationResult<T> = Result<T, CalibrationError>;
