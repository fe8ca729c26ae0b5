//! Calibration run summary.
//!
//! Everything published, plus what went wrong per projector, in a form that
//! serializes to JSON for later inspection or export.

use crate::config::EqualizationMethod;
use crate::params::CalibrationParams;
use crate::CalibrationResult;
use projcal_core::{Channel, RgbValue};
use projcal_lut::ColorLut;
use projcal_math::Mat3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Luminance range every projector can reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommonRange {
    /// Per-channel maximum of the projector minimums
    pub min: RgbValue,
    /// Per-channel minimum of the projector maximums
    pub max: RgbValue,
    /// Maximum of the projector minimum luminances
    pub min_luminance: f32,
    /// Minimum of the projector maximum luminances
    pub max_luminance: f32,
}

impl CommonRange {
    /// Returns true if no luminance is reachable by every projector.
    pub fn is_empty(&self) -> bool {
        self.min_luminance > self.max_luminance
    }
}

/// Result for one projector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectorReport {
    /// Projector name
    pub name: String,
    /// Published LUT, if the projector got that far
    pub lut: Option<ColorLut>,
    /// Published cross-talk correction
    pub mix_matrix: Option<Mat3>,
    /// Measured white point
    pub white_point: RgbValue,
    /// White balance before correction
    pub white_balance: RgbValue,
    /// Balanced channel minimums
    pub min_values: RgbValue,
    /// Balanced channel maximums
    pub max_values: RgbValue,
    /// Region centroid in camera pixels
    pub region_centroid: Option<(f32, f32)>,
    /// Region area in camera pixels
    pub region_area: Option<f32>,
    /// Channels that fell back to identity
    pub degenerate_channels: Vec<Channel>,
    /// Localized failures
    pub errors: Vec<String>,
    /// Whether corrections were sent
    pub published: bool,
}

impl ProjectorReport {
    /// Snapshot of a projector's calibration state.
    pub fn from_params(params: &CalibrationParams, published: bool) -> Self {
        Self {
            name: params.name.clone(),
            lut: published.then(|| params.lut.clone()),
            mix_matrix: params.mix_matrix,
            white_point: params.white_point,
            white_balance: params.white_balance,
            min_values: params.min_values,
            max_values: params.max_values,
            region_centroid: params.region.as_ref().map(|r| r.centroid()),
            region_area: params.region.as_ref().map(|r| r.area()),
            degenerate_channels: params.degenerate_channels.clone(),
            errors: params.errors.clone(),
            published,
        }
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Per projector results, in control-plane order
    pub projectors: Vec<ProjectorReport>,
    /// Common target white balance
    pub target_white_balance: RgbValue,
    /// Strategy that produced the target
    pub equalization_method: EqualizationMethod,
    /// Why the configured strategy was abandoned, if it was
    pub equalization_error: Option<String>,
    /// Range shared by all projectors
    pub common_range: Option<CommonRange>,
    /// Exposure that put the scene at mid-gray
    pub mid_exposure: f32,
}

impl CalibrationReport {
    /// Report for `name`, if present.
    pub fn projector(&self, name: &str) -> Option<&ProjectorReport> {
        self.projectors.iter().find(|p| p.name == name)
    }

    /// Number of projectors that received corrections.
    pub fn published_count(&self) -> usize {
        self.projectors.iter().filter(|p| p.published).count()
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> CalibrationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a report written by [`CalibrationReport::save`].
    pub fn from_json(json: &str) -> CalibrationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the report as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> CalibrationResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads a report from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> CalibrationResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_file() {
        let mut params = CalibrationParams::new("left");
        params.degenerate_channels.push(Channel::Blue);
        params.record("singular color mixing matrix for projector left");

        let report = CalibrationReport {
            projectors: vec![
                ProjectorReport::from_params(&params, true),
                ProjectorReport::from_params(&CalibrationParams::new("right"), false),
            ],
            target_white_balance: RgbValue::ONE,
            equalization_method: EqualizationMethod::EqualizeOnly,
            equalization_error: None,
            common_range: None,
            mid_exposure: 0.25,
        };
        assert_eq!(report.published_count(), 1);
        assert!(report.projector("right").unwrap().lut.is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save(&path).unwrap();
        let back = CalibrationReport::load(&path).unwrap();
        assert_eq!(back, report);
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"blue\""));
    }

    #[test]
    fn test_common_range_empty() {
        let r = CommonRange {
            min: RgbValue::ZERO,
            max: RgbValue::ONE,
            min_luminance: 0.6,
            max_luminance: 0.5,
        };
        assert!(r.is_empty());
    }
}
