//! Calibration configuration.
//!
//! Loaded from YAML, every field optional:
//!
//! ```yaml
//! color_samples: 8
//! detection_threshold: 1.0
//! image_per_hdr: 1
//! hdr_step: 1.0
//! equalization: maximize_min_luminance
//! ```
//!
//! Out-of-range values are clamped by [`CalibrationConfig::sanitized`],
//! which logs each adjustment.

use crate::{CalibrationError, CalibrationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Strategy used to pick the common target white balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualizationMethod {
    /// Mean of all projector balances
    EqualizeOnly,
    /// Balance of the projector with the dimmest white point
    WeakestLuminance,
    /// Fixed-point search raising the dimmest corrected projector
    #[default]
    MaximizeMinLuminance,
}

impl EqualizationMethod {
    /// All methods in selector order.
    pub const ALL: [EqualizationMethod; 3] = [
        EqualizationMethod::EqualizeOnly,
        EqualizationMethod::WeakestLuminance,
        EqualizationMethod::MaximizeMinLuminance,
    ];

    /// Method for a numeric selector, clamped to `0..=2`.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.clamp(0, 2) as usize]
    }

    /// Configuration name.
    pub const fn name(self) -> &'static str {
        match self {
            EqualizationMethod::EqualizeOnly => "equalize_only",
            EqualizationMethod::WeakestLuminance => "weakest_luminance",
            EqualizationMethod::MaximizeMinLuminance => "maximize_min_luminance",
        }
    }
}

impl fmt::Display for EqualizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EqualizationMethod {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Ok(index) = key.parse::<i64>() {
            return Ok(Self::from_index(index));
        }
        Self::ALL
            .into_iter()
            .find(|m| m.name() == key)
            .ok_or_else(|| CalibrationError::Config(format!("unknown equalization method '{}'", s)))
    }
}

/// Tunables for a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Sampled input levels per channel (>= 3)
    pub color_samples: usize,
    /// Scale applied to the "all others" image before differencing (>= 0.5)
    pub detection_threshold: f32,
    /// Brackets per HDR capture (>= 1)
    pub image_per_hdr: usize,
    /// Stops between HDR brackets (>= 0.3)
    pub hdr_step: f32,
    /// White balance strategy
    pub equalization: EqualizationMethod,
    /// Minimum region area as a fraction of the frame
    pub min_area_fraction: f32,
    /// Control-plane category listing the projectors
    pub projector_category: String,
    /// Exposure search iteration cap
    pub max_exposure_iterations: usize,
    /// Region threshold search iteration cap
    pub max_region_iterations: usize,
    /// White balance search iteration cap
    pub max_equalization_iterations: usize,
    /// Brackets used to estimate the camera response
    pub crf_brackets: usize,
    /// Stops between response estimation brackets
    pub crf_step: f32,
    /// Where to write bracket and HDR frames, if anywhere
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            color_samples: 8,
            detection_threshold: 1.0,
            image_per_hdr: 1,
            hdr_step: 1.0,
            equalization: EqualizationMethod::MaximizeMinLuminance,
            min_area_fraction: 0.005,
            projector_category: "camera".to_string(),
            max_exposure_iterations: 32,
            max_region_iterations: 64,
            max_equalization_iterations: 256,
            crf_brackets: 9,
            crf_step: 0.33,
            diagnostics_dir: None,
        }
    }
}

fn clamp_min<T: PartialOrd + Copy + fmt::Display>(field: &str, value: &mut T, min: T) {
    // NaN compares false and is replaced too
    if !(*value >= min) {
        warn!(field, %value, %min, "config value below minimum, clamped");
        *value = min;
    }
}

impl CalibrationConfig {
    /// Loads a configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> CalibrationResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalibrationError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parses a configuration from YAML.
    pub fn from_yaml_str(yaml: &str) -> CalibrationResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| CalibrationError::Config(e.to_string()))
    }

    /// Serializes to YAML.
    pub fn to_yaml_string(&self) -> CalibrationResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Returns a copy with every value forced into its valid range.
    pub fn sanitized(&self) -> Self {
        let mut c = self.clone();
        clamp_min("color_samples", &mut c.color_samples, 3);
        clamp_min("detection_threshold", &mut c.detection_threshold, 0.5);
        clamp_min("image_per_hdr", &mut c.image_per_hdr, 1);
        clamp_min("hdr_step", &mut c.hdr_step, 0.3);
        clamp_min("min_area_fraction", &mut c.min_area_fraction, 1e-4);
        if c.min_area_fraction > 1.0 {
            warn!(value = c.min_area_fraction, "min_area_fraction above 1, clamped");
            c.min_area_fraction = 1.0;
        }
        clamp_min("max_exposure_iterations", &mut c.max_exposure_iterations, 1);
        clamp_min("max_region_iterations", &mut c.max_region_iterations, 1);
        clamp_min("max_equalization_iterations", &mut c.max_equalization_iterations, 1);
        clamp_min("crf_brackets", &mut c.crf_brackets, 2);
        clamp_min("crf_step", &mut c.crf_step, 0.1);
        if c.projector_category.trim().is_empty() {
            warn!("empty projector_category, using default");
            c.projector_category = Self::default().projector_category;
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = CalibrationConfig::default();
        assert_eq!(c.color_samples, 8);
        assert_eq!(c.equalization, EqualizationMethod::MaximizeMinLuminance);
        assert_eq!(c.projector_category, "camera");
        assert_eq!(c.sanitized(), c);
    }

    #[test]
    fn test_partial_yaml() {
        let c = CalibrationConfig::from_yaml_str(
            "color_samples: 5\nequalization: weakest_luminance\n",
        )
        .unwrap();
        assert_eq!(c.color_samples, 5);
        assert_eq!(c.equalization, EqualizationMethod::WeakestLuminance);
        assert_eq!(c.hdr_step, 1.0);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            CalibrationConfig::from_yaml_str("").unwrap(),
            CalibrationConfig::default()
        );
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            CalibrationConfig::from_yaml_str("color_samples: many"),
            Err(CalibrationError::Config(_))
        ));
    }

    #[test]
    fn test_sanitized_clamps() {
        let c = CalibrationConfig {
            color_samples: 1,
            detection_threshold: 0.1,
            image_per_hdr: 0,
            hdr_step: f32::NAN,
            min_area_fraction: 3.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(c.color_samples, 3);
        assert_eq!(c.detection_threshold, 0.5);
        assert_eq!(c.image_per_hdr, 1);
        assert_eq!(c.hdr_step, 0.3);
        assert_eq!(c.min_area_fraction, 1.0);
    }

    #[test]
    fn test_yaml_round_trip_keeps_fields() {
        let c = CalibrationConfig {
            diagnostics_dir: Some(PathBuf::from("/tmp/projcal")),
            ..Default::default()
        };
        let back = CalibrationConfig::from_yaml_str(&c.to_yaml_string().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(
            "maximize-min-luminance".parse::<EqualizationMethod>().unwrap(),
            EqualizationMethod::MaximizeMinLuminance
        );
        assert_eq!(
            "0".parse::<EqualizationMethod>().unwrap(),
            EqualizationMethod::EqualizeOnly
        );
        assert_eq!(EqualizationMethod::from_index(7), EqualizationMethod::MaximizeMinLuminance);
        assert!("brightest".parse::<EqualizationMethod>().is_err());
    }
}
