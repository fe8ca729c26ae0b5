//! Control-plane collaborator.
//!
//! Projectors are remote objects addressed by name. Messages are
//! fire-and-forget: nothing is returned and delivery is not confirmed, so
//! the pipeline assumes each change is visible by the next capture.
//!
//! [`Display`] wraps the handful of display overrides the pipeline toggles
//! during a run (test content hidden, background flash, forced clear color)
//! and the final publication of corrections.

use projcal_core::RgbValue;
use projcal_lut::ColorLut;
use projcal_math::Mat3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Attribute names understood by projectors.
pub mod attr {
    /// Hide test content (`Int` 1 / 0)
    pub const HIDE: &str = "hide";
    /// Show the clear color as background (`Int` 1 / 0)
    pub const FLASH_BG: &str = "flashBG";
    /// Background color as four floats (r, g, b, a); no value resets it
    pub const CLEAR_COLOR: &str = "clearColor";
    /// 768 floats, entry-major interleaved RGB
    pub const COLOR_LUT: &str = "colorLUT";
    /// Enables the color LUT
    pub const ACTIVATE_COLOR_LUT: &str = "activateColorLUT";
    /// Nine floats, row-major
    pub const COLOR_MIX_MATRIX: &str = "colorMixMatrix";
    /// Brightness multiplier
    pub const BRIGHTNESS: &str = "brightness";
    /// Color temperature in kelvin
    pub const COLOR_TEMPERATURE: &str = "colorTemperature";
}

/// Neutral brightness sent with a published calibration.
pub const NEUTRAL_BRIGHTNESS: f32 = 1.0;

/// Neutral color temperature sent with a published calibration.
pub const NEUTRAL_COLOR_TEMPERATURE: f32 = 6500.0;

/// One attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Scalar
    Float(f32),
    /// Float array
    Floats(Vec<f32>),
}

impl AttrValue {
    /// Integer view (`Bool` maps to 0 / 1).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Scalar view of `Float` and `Int`.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }
}

/// Messaging bus reaching the projectors.
pub trait ControlPlane {
    /// Names of all objects in a category.
    fn list_objects_by_category(&self, category: &str) -> Vec<String>;

    /// Sends an attribute update. No return value, no confirmation.
    fn send(&self, object: &str, attribute: &str, values: Vec<AttrValue>);
}

/// Display overrides and publication for a fixed set of projectors.
pub struct Display<'a> {
    control: &'a dyn ControlPlane,
    projectors: &'a [String],
}

impl<'a> Display<'a> {
    /// Wraps the control plane for `projectors`.
    pub fn new(control: &'a dyn ControlPlane, projectors: &'a [String]) -> Self {
        Self {
            control,
            projectors,
        }
    }

    /// Projector names.
    pub fn projectors(&self) -> &[String] {
        self.projectors
    }

    /// Hides or shows test content on every projector.
    pub fn hide_all(&self, hide: bool) {
        for p in self.projectors {
            self.control.send(p, attr::HIDE, vec![AttrValue::Int(hide as i64)]);
        }
    }

    /// Turns the background flash on or off on every projector.
    pub fn flash_all(&self, flash: bool) {
        for p in self.projectors {
            self.control
                .send(p, attr::FLASH_BG, vec![AttrValue::Int(flash as i64)]);
        }
    }

    /// Sets one projector's clear color (opaque).
    pub fn clear(&self, projector: &str, color: RgbValue) {
        debug!(projector, %color, "clear color");
        self.control.send(
            projector,
            attr::CLEAR_COLOR,
            vec![
                AttrValue::Float(color.r),
                AttrValue::Float(color.g),
                AttrValue::Float(color.b),
                AttrValue::Float(1.0),
            ],
        );
    }

    /// Sets every projector's clear color.
    pub fn clear_all(&self, color: RgbValue) {
        for p in self.projectors {
            self.clear(p, color);
        }
    }

    /// Shows white on `target` only, black elsewhere.
    pub fn isolate(&self, target: &str) {
        for p in self.projectors {
            let color = if p == target { RgbValue::ONE } else { RgbValue::ZERO };
            self.clear(p, color);
        }
    }

    /// Shows white everywhere except on `target`.
    pub fn all_but(&self, target: &str) {
        for p in self.projectors {
            let color = if p == target { RgbValue::ZERO } else { RgbValue::ONE };
            self.clear(p, color);
        }
    }

    /// Clears every calibration-only override.
    pub fn reset(&self) {
        for p in self.projectors {
            self.control.send(p, attr::HIDE, vec![AttrValue::Int(0)]);
            self.control.send(p, attr::FLASH_BG, vec![AttrValue::Int(0)]);
            self.control.send(p, attr::CLEAR_COLOR, Vec::new());
        }
    }

    /// Publishes a calibration to one projector.
    pub fn publish(&self, projector: &str, lut: &ColorLut, mix: Option<&Mat3>) {
        self.control.send(
            projector,
            attr::COLOR_LUT,
            vec![AttrValue::Floats(lut.flatten_interleaved())],
        );
        self.control
            .send(projector, attr::ACTIVATE_COLOR_LUT, vec![AttrValue::Bool(true)]);
        if let Some(m) = mix {
            self.control.send(
                projector,
                attr::COLOR_MIX_MATRIX,
                vec![AttrValue::Floats(m.to_row_major().to_vec())],
            );
        }
        self.control.send(
            projector,
            attr::BRIGHTNESS,
            vec![AttrValue::Float(NEUTRAL_BRIGHTNESS)],
        );
        self.control.send(
            projector,
            attr::COLOR_TEMPERATURE,
            vec![AttrValue::Float(NEUTRAL_COLOR_TEMPERATURE)],
        );
    }
}
