//! Per-projector calibration state.

use projcal_core::{Channel, ProjectorRegion, RgbValue};
use projcal_lut::ColorLut;
use projcal_math::Mat3;
use serde::{Deserialize, Serialize};

/// One sampled input level and the radiance measured for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Driven level in `[0, 1]`
    pub input: f32,
    /// Mean radiance over the projector's region
    pub measured: RgbValue,
}

impl CurvePoint {
    /// Pairs an input level with its measurement.
    pub const fn new(input: f32, measured: RgbValue) -> Self {
        Self { input, measured }
    }
}

/// Sampled response of one channel, in capture order.
pub type Curve = Vec<CurvePoint>;

/// Everything measured and derived for one projector during a run.
///
/// Created when the run starts and dropped once published.
#[derive(Debug, Clone)]
pub struct CalibrationParams {
    /// Projector name on the control plane
    pub name: String,
    /// Where its light falls in the camera frame
    pub region: Option<ProjectorRegion>,
    /// Radiance measured for full white
    pub white_point: RgbValue,
    /// White point normalized by its green channel
    pub white_balance: RgbValue,
    /// Sampled response per channel
    pub curves: [Curve; 3],
    /// Inverted response per channel
    pub lut: ColorLut,
    /// Measured value of each channel at level 0
    pub min_values: RgbValue,
    /// Measured value of each channel at level 1
    pub max_values: RgbValue,
    /// Cross-talk correction, absent if it could not be solved
    pub mix_matrix: Option<Mat3>,
    /// Channels that fell back to the identity table
    pub degenerate_channels: Vec<Channel>,
    /// Failures that only affect this projector
    pub errors: Vec<String>,
}

impl CalibrationParams {
    /// Fresh state for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: None,
            white_point: RgbValue::ZERO,
            white_balance: RgbValue::ONE,
            curves: Default::default(),
            lut: ColorLut::identity(),
            min_values: RgbValue::ZERO,
            max_values: RgbValue::ONE,
            mix_matrix: None,
            degenerate_channels: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Records a localized failure.
    pub fn record(&mut self, error: impl ToString) {
        self.errors.push(error.to_string());
    }
}
