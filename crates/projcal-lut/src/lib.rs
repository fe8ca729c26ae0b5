//! # projcal-lut
//!
//! Correction lookup tables published to projectors.
//!
//! - [`ColorLut`] - three 256-entry channel tables mapping a desired output
//!   level to the input level that produces it
//! - [`cube`] - `.cube` 1D export and import for offline inspection
//!
//! # Usage
//!
//! ```rust
//! use projcal_lut::ColorLut;
//!
//! let mut lut = ColorLut::identity();
//! lut.rescale(0.8, 0.1);
//! assert_eq!(lut.flatten_interleaved().len(), 768);
//! ```
//!
//! # Dependencies
//!
//! - [`projcal-core`] - `Channel`, `RgbValue`
//! - [`thiserror`] - Error handling
//! - [`serde`] - Report serialization
//!
//! # Used By
//!
//! - `projcal-calibrate` - Curve inversion output and publication
//! - `projcal-cli` - LUT export

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod lut;
pub mod cube;

pub use error::{LutError, LutResult};
pub use lut::{ColorLut, LUT_SIZE, identity_channel};
pub use cube::{read_1d as read_cube_1d, write_1d as write_cube_1d};
