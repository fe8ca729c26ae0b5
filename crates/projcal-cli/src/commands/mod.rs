//! CLI command implementations

pub mod config;
pub mod export;
pub mod simulate;

use anyhow::{Context, Result};
use projcal_calibrate::CalibrationConfig;
use projcal_calibrate::sim::SimConfig;
use std::path::Path;

/// Load a calibration configuration, or the defaults
pub fn load_config(path: Option<&Path>) -> Result<CalibrationConfig> {
    match path {
        Some(p) => CalibrationConfig::from_file(p)
            .with_context(|| format!("Failed to load config: {}", p.display())),
        None => Ok(CalibrationConfig::default()),
    }
}

/// Load a scene description, or the built-in scene
pub fn load_scene(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(p) => {
            SimConfig::from_file(p).with_context(|| format!("Failed to load scene: {}", p.display()))
        }
        None => Ok(SimConfig::default()),
    }
}

/// Create a directory and its parents
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}
