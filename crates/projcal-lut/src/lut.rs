//! Three-channel correction table.
//!
//! A [`ColorLut`] maps a desired normalized output level to the projector
//! input level that produces it, independently for red, green and blue.
//! Every channel holds exactly [`LUT_SIZE`] entries sampled at `i / 255`.

use crate::{LutError, LutResult};
use projcal_core::{Channel, RgbValue};
use serde::{Deserialize, Serialize};

/// Number of entries per channel.
pub const LUT_SIZE: usize = 256;

/// Per-channel 256-entry lookup table.
///
/// # Example
///
/// ```rust
/// use projcal_core::{Channel, RgbValue};
/// use projcal_lut::ColorLut;
///
/// let mut lut = ColorLut::identity();
/// lut.scale_channel(Channel::Blue, 0.5);
/// let out = lut.apply(RgbValue::splat(1.0));
/// assert_eq!(out, RgbValue::new(1.0, 1.0, 0.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorLut {
    red: Vec<f32>,
    green: Vec<f32>,
    blue: Vec<f32>,
}

impl ColorLut {
    /// Pass-through table: entry `i` is `i / 255` on every channel.
    pub fn identity() -> Self {
        let ramp = identity_channel();
        Self {
            red: ramp.clone(),
            green: ramp.clone(),
            blue: ramp,
        }
    }

    /// Builds a table from three channel vectors of [`LUT_SIZE`] entries.
    pub fn from_channels(red: Vec<f32>, green: Vec<f32>, blue: Vec<f32>) -> LutResult<Self> {
        for (channel, data) in Channel::ALL.iter().zip([&red, &green, &blue]) {
            check_channel(*channel, data)?;
        }
        Ok(Self { red, green, blue })
    }

    /// Entries of one channel.
    #[inline]
    pub fn channel(&self, channel: Channel) -> &[f32] {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut Vec<f32> {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// Replaces one channel.
    pub fn set_channel(&mut self, channel: Channel, data: Vec<f32>) -> LutResult<()> {
        check_channel(channel, &data)?;
        *self.channel_mut(channel) = data;
        Ok(())
    }

    /// Multiplies every entry of one channel by `factor`.
    pub fn scale_channel(&mut self, channel: Channel, factor: f32) {
        for v in self.channel_mut(channel) {
            *v *= factor;
        }
    }

    /// Applies `v * scale + offset` to every entry of every channel.
    pub fn rescale(&mut self, scale: f32, offset: f32) {
        for channel in Channel::ALL {
            for v in self.channel_mut(channel) {
                *v = *v * scale + offset;
            }
        }
    }

    /// Looks up an RGB value, interpolating linearly between entries.
    ///
    /// Inputs are clamped to [0, 1].
    pub fn apply(&self, rgb: RgbValue) -> RgbValue {
        RgbValue::new(
            interpolate(&self.red, rgb.r),
            interpolate(&self.green, rgb.g),
            interpolate(&self.blue, rgb.b),
        )
    }

    /// Entry-major interleaved values: `[r0, g0, b0, r1, g1, b1, ...]`.
    ///
    /// This is the 768-float layout carried by the `colorLUT` attribute.
    pub fn flatten_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(LUT_SIZE * 3);
        for i in 0..LUT_SIZE {
            out.push(self.red[i]);
            out.push(self.green[i]);
            out.push(self.blue[i]);
        }
        out
    }

    /// Inverse of [`ColorLut::flatten_interleaved`].
    pub fn from_interleaved(values: &[f32]) -> LutResult<Self> {
        if values.len() != LUT_SIZE * 3 {
            return Err(LutError::InvalidSize(format!(
                "expected {} interleaved values, got {}",
                LUT_SIZE * 3,
                values.len()
            )));
        }
        let channel = |c: usize| values.iter().skip(c).step_by(3).copied().collect::<Vec<f32>>();
        Self::from_channels(channel(0), channel(1), channel(2))
    }
}

impl Default for ColorLut {
    fn default() -> Self {
        Self::identity()
    }
}

/// Identity ramp for a single channel.
pub fn identity_channel() -> Vec<f32> {
    (0..LUT_SIZE)
        .map(|i| i as f32 / (LUT_SIZE - 1) as f32)
        .collect()
}

fn check_channel(channel: Channel, data: &[f32]) -> LutResult<()> {
    if data.len() != LUT_SIZE {
        return Err(LutError::InvalidSize(format!(
            "{} channel has {} entries, expected {}",
            channel,
            data.len(),
            LUT_SIZE
        )));
    }
    if let Some(index) = data.iter().position(|v| !v.is_finite()) {
        return Err(LutError::NonFinite { channel, index });
    }
    Ok(())
}

fn interpolate(data: &[f32], value: f32) -> f32 {
    let t = value.clamp(0.0, 1.0);
    let idx_f = t * (data.len() - 1) as f32;
    let idx0 = (idx_f.floor() as usize).min(data.len() - 1);
    let idx1 = (idx0 + 1).min(data.len() - 1);
    let frac = idx_f - idx0 as f32;
    data[idx0] * (1.0 - frac) + data[idx1] * frac
}
