//! # projcal-math
//!
//! Math utilities for projector color calibration.
//!
//! - [`Mat3`] - 3x3 matrices for channel mixing and its inverse
//! - [`Spline`] - Linear and Akima interpolating splines used to invert
//!   measured projector responses
//! - Scalar helpers ([`saturate`], [`unit_steps`])
//!
//! # Design
//!
//! All matrix operations assume **row-major** storage and **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! Spline construction and evaluation never panic and never report through
//! global state: every failure is returned as a [`SplineError`] so callers
//! can decide locally how to degrade.
//!
//! # Usage
//!
//! ```rust
//! use projcal_math::{Mat3, Spline};
//!
//! let m = Mat3::diagonal(2.0, 4.0, 8.0);
//! let inv = m.inverse().unwrap();
//! assert_eq!(inv.m[1][1], 0.25);
//!
//! let s = Spline::linear(&[0.0, 1.0], &[0.0, 2.0]).unwrap();
//! assert_eq!(s.eval(0.5).unwrap(), 1.0);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - Matrix inverse and products
//! - [`projcal-core`] - `RgbValue`
//!
//! # Used By
//!
//! - `projcal-calibrate` - Curve inversion and color mixing

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod interp;
mod mat3;
mod spline;

pub use error::{SplineError, SplineResult};
pub use interp::*;
pub use mat3::*;
pub use spline::{Spline, SplineKind};
