//! # projcal-core
//!
//! Core types for multi-projector color calibration.
//!
//! This crate provides the foundational types used throughout the projcal workspace:
//!
//! - [`RgbValue`], [`Channel`] - Color triplets with Rec.709 luminance
//! - [`LdrFrame`] - 8-bit RGB frame decoded from a camera capture
//! - [`RadianceImage`] - Floating-point radiance raster produced by HDR assembly
//! - [`Rect`] - Pixel rectangle for regions of interest
//! - [`BoundingRegion`], [`RegionMask`], [`ProjectorRegion`] - Where a projector's light falls
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. All other projcal crates depend on it:
//!
//! ```text
//! projcal-core (this crate)
//!    ^
//!    |
//!    +-- projcal-math (matrices, splines)
//!    +-- projcal-lut (correction tables)
//!    +-- projcal-hdr (camera response, HDR assembly)
//!    +-- projcal-calibrate (pipeline)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod frame;
pub mod rect;
pub mod region;
pub mod rgb;

// Re-exports for convenience
pub use error::*;
pub use frame::*;
pub use rect::*;
pub use region::*;
pub use rgb::*;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use projcal_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::frame::{LdrFrame, RadianceImage};
    pub use crate::rect::Rect;
    pub use crate::region::{BoundingRegion, ProjectorRegion, RegionMask};
    pub use crate::rgb::{Channel, RgbValue, luminance_rec709, REC709_LUMA};
}
