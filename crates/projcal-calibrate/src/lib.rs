//! # projcal-calibrate
//!
//! Camera-driven color calibration for multi-projector walls.
//!
//! A single calibration camera watches the wall while each projector is
//! driven through known colors. From those measurements the pipeline
//! derives, per projector, a per-channel correction LUT and a cross-talk
//! matrix so that neighbouring projectors agree in black level, white point
//! and brightness.
//!
//! # Pipeline
//!
//! 1. [`exposure`] - exposure search on a gray flash
//! 2. [`hdr_capture`] - bracketed capture merged through the camera response
//! 3. [`region`] - locate each projector by differencing HDR captures
//! 4. [`sampler`] - per-channel response curves over the region
//! 5. [`inverter`] - invert each curve into a 256-entry table
//! 6. [`mixing`] - cross-talk correction matrix
//! 7. [`white_balance`] - common target balance across projectors
//! 8. [`Calibrator`] - runs the stages, rescales to the common range and
//!    publishes
//!
//! # Collaborators
//!
//! - [`Camera`] - the physical camera, held through a [`CameraLease`]
//! - [`ControlPlane`] - message bus reaching the projectors
//! - [`sim::SimulatedRig`] - both of the above over a synthetic scene
//!
//! # Usage
//!
//! ```rust
//! use projcal_calibrate::{Calibrator, CalibrationConfig, ResponseCache};
//! use projcal_calibrate::sim::{SimConfig, SimulatedRig};
//!
//! let rig = SimulatedRig::new(&SimConfig::default());
//! let calibrator = Calibrator::new(CalibrationConfig::default());
//! let mut cache = ResponseCache::new();
//!
//! match calibrator.run(&mut rig.camera(), &rig.control(), &mut cache) {
//!     Ok(report) => {
//!         for p in &report.projectors {
//!             println!("{}: published={}", p.name, p.published);
//!         }
//!     }
//!     Err(e) => eprintln!("calibration failed: {e}"),
//! }
//! // The camera response estimated on the way is kept for the next run
//! assert!(!cache.is_empty());
//! ```
//!
//! # Dependencies
//!
//! - [`projcal-core`] - Frames, regions, RGB values
//! - [`projcal-math`] - Matrices and splines
//! - [`projcal-lut`] - Correction tables
//! - [`projcal-hdr`] - Camera response and HDR merge
//! - [`serde`], [`serde_yaml`], [`serde_json`] - Configuration, cache and report files
//! - [`image`] - Diagnostic image output
//! - [`thiserror`] - Error handling
//! - [`tracing`] - Structured logging
//!
//! # Used By
//!
//! - `projcal-cli` - Command line front end

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod camera;
mod config;
mod control;
mod error;
pub mod exposure;
pub mod hdr_capture;
pub mod inverter;
pub mod mixing;
mod orchestrator;
mod params;
pub mod region;
mod report;
pub mod sampler;
pub mod sim;
pub mod white_balance;

pub use cache::ResponseCache;
pub use camera::{Camera, CameraError, CameraLease};
pub use config::{CalibrationConfig, EqualizationMethod};
pub use control::{AttrValue, ControlPlane, Display, NEUTRAL_BRIGHTNESS, NEUTRAL_COLOR_TEMPERATURE, attr};
pub use error::{CalibrationError, CalibrationResult};
pub use orchestrator::{Calibrator, EXPOSURE_GRAY, common_range, rescale_to_common};
pub use params::{CalibrationParams, Curve, CurvePoint};
pub use report::{CalibrationReport, CommonRange, ProjectorReport};
