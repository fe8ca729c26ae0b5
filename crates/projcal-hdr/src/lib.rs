//! # projcal-hdr
//!
//! High dynamic range capture support for camera-based calibration.
//!
//! - [`CameraResponse`] - per-channel code-to-radiance tables, recovered
//!   from a bracket set (Debevec-Malik) or assumed linear
//! - [`assemble`] - exposure-weighted fusion of [`Bracket`]s into a
//!   [`RadianceImage`](projcal_core::RadianceImage)
//!
//! # Usage
//!
//! ```rust
//! use projcal_core::LdrFrame;
//! use projcal_hdr::{Bracket, CameraResponse, assemble};
//!
//! let brackets: Vec<Bracket> = [0.5f32, 1.0, 2.0]
//!     .iter()
//!     .map(|&t| {
//!         let code = (100.0 * t) as u8;
//!         Bracket::new(LdrFrame::filled(8, 8, [code, code, code]), t)
//!     })
//!     .collect();
//! let hdr = assemble(&brackets, &CameraResponse::linear()).unwrap();
//! assert!(hdr.pixel(4, 4).g > 0.0);
//! ```
//!
//! # Dependencies
//!
//! - [`projcal-core`] - Frames and radiance images
//! - [`nalgebra`] - SVD least-squares solve for the response curve
//! - [`tracing`] - Diagnostics
//!
//! # Used By
//!
//! - `projcal-calibrate` - HDR capture stage

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod merge;
mod response;

pub use error::{HdrError, HdrResult};
pub use merge::{Bracket, assemble, fusion_weight, validate_brackets};
pub use response::{CameraResponse, EstimateOptions, RESPONSE_SIZE};
