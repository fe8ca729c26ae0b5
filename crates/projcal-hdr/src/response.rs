//! Camera response function (CRF).
//!
//! The response maps an 8-bit sensor code to relative scene radiance, one
//! 256-entry table per channel. It is recovered from a bracket set of the
//! same static scene with the Debevec-Malik least-squares method:
//!
//! ```text
//! g(Z_ij) = ln E_i + ln t_j
//! ```
//!
//! solved jointly for `g` (256 unknowns) and `ln E_i` (one per sample pixel)
//! with hat weighting, a second-derivative smoothness term and `g(128) = 0`
//! fixing the scale. The table stores `exp(g)`.

use crate::{Bracket, HdrError, HdrResult, validate_brackets};
use nalgebra::{DMatrix, DVector, SVD};
use projcal_core::{Channel, luminance_rec709};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of code values per channel.
pub const RESPONSE_SIZE: usize = 256;

/// Tuning for [`CameraResponse::estimate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateOptions {
    /// Number of sample pixels
    pub samples: usize,
    /// Smoothness weight
    pub lambda: f64,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            samples: 200,
            lambda: 20.0,
        }
    }
}

/// Per-channel code-to-radiance tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraResponse {
    red: Vec<f32>,
    green: Vec<f32>,
    blue: Vec<f32>,
}

/// Debevec hat weight over the 8-bit range.
#[inline]
fn hat(z: usize) -> f64 {
    if z <= 127 { (z + 1) as f64 } else { (256 - z) as f64 }
}

impl CameraResponse {
    /// Linear sensor: code `z` maps to `z / 255`.
    pub fn linear() -> Self {
        let ramp: Vec<f32> = (0..RESPONSE_SIZE).map(|z| z as f32 / 255.0).collect();
        Self {
            red: ramp.clone(),
            green: ramp.clone(),
            blue: ramp,
        }
    }

    /// Builds a response from explicit tables of 256 entries each.
    pub fn from_curves(red: Vec<f32>, green: Vec<f32>, blue: Vec<f32>) -> HdrResult<Self> {
        for (channel, c) in [&red, &green, &blue].into_iter().enumerate() {
            if c.len() != RESPONSE_SIZE {
                return Err(HdrError::InvalidResponse {
                    channel,
                    len: c.len(),
                });
            }
        }
        Ok(Self { red, green, blue })
    }

    /// Table for one channel.
    #[inline]
    pub fn curve(&self, channel: Channel) -> &[f32] {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Relative radiance of `code` on a channel.
    #[inline]
    pub fn linearize(&self, channel: Channel, code: u8) -> f32 {
        self.curve(channel)[code as usize]
    }

    /// Recovers the response from a bracket set with default options.
    pub fn estimate(brackets: &[Bracket]) -> HdrResult<Self> {
        Self::estimate_with(brackets, EstimateOptions::default())
    }

    /// Recovers the response from a bracket set.
    ///
    /// Sample pixels are picked at evenly spaced luminance quantiles of the
    /// middle bracket so the whole tonal range is represented.
    pub fn estimate_with(brackets: &[Bracket], options: EstimateOptions) -> HdrResult<Self> {
        validate_brackets(brackets)?;
        let samples = select_samples(brackets, options.samples);
        debug!(
            brackets = brackets.len(),
            samples = samples.len(),
            "estimating camera response"
        );

        let ln_t: Vec<f64> = brackets.iter().map(|b| (b.exposure as f64).ln()).collect();
        let mut curves: [Vec<f32>; 3] = Default::default();
        for channel in Channel::ALL {
            let g = solve_channel(brackets, &samples, &ln_t, channel, options.lambda)?;
            // exp(g), forced monotone non-decreasing
            let mut running = 0.0f32;
            curves[channel.index()] = g
                .into_iter()
                .map(|v| {
                    running = (v.exp() as f32).max(running);
                    running
                })
                .collect();
        }

        let [red, green, blue] = curves;
        Ok(Self { red, green, blue })
    }
}

// Pixel indices at luminance quantiles of the middle bracket.
fn select_samples(brackets: &[Bracket], wanted: usize) -> Vec<usize> {
    let frame = &brackets[brackets.len() / 2].frame;
    let mut order: Vec<(f32, usize)> = frame
        .data()
        .chunks_exact(3)
        .map(|p| luminance_rec709([p[0] as f32, p[1] as f32, p[2] as f32]))
        .enumerate()
        .map(|(i, l)| (l, i))
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let n = wanted.min(order.len()).max(1);
    if n == 1 {
        return vec![order[order.len() / 2].1];
    }
    (0..n)
        .map(|k| order[k * (order.len() - 1) / (n - 1)].1)
        .collect()
}

fn solve_channel(
    brackets: &[Bracket],
    samples: &[usize],
    ln_t: &[f64],
    channel: Channel,
    lambda: f64,
) -> HdrResult<Vec<f64>> {
    let n = RESPONSE_SIZE;
    let rows = samples.len() * brackets.len() + 1 + (n - 2);
    let cols = n + samples.len();
    let mut a = DMatrix::<f64>::zeros(rows, cols);
    let mut b = DVector::<f64>::zeros(rows);

    // Data fitting equations
    let mut k = 0;
    for (i, &pixel) in samples.iter().enumerate() {
        for (j, bracket) in brackets.iter().enumerate() {
            let z = bracket.frame.data()[pixel * 3 + channel.index()] as usize;
            let w = hat(z);
            a[(k, z)] = w;
            a[(k, n + i)] = -w;
            b[k] = w * ln_t[j];
            k += 1;
        }
    }

    // Fix the curve by setting its middle value to 0
    a[(k, 128)] = 1.0;
    k += 1;

    // Smoothness equations
    for z in 1..n - 1 {
        let w = lambda * hat(z);
        a[(k, z - 1)] = w;
        a[(k, z)] = -2.0 * w;
        a[(k, z + 1)] = w;
        k += 1;
    }

    let svd = SVD::new(a, true, true);
    let x = svd
        .solve(&b, 1e-10)
        .map_err(|e| HdrError::SolveFailed(e.to_string()))?;
    let g: Vec<f64> = x.iter().take(n).copied().collect();
    if g.iter().any(|v| !v.is_finite()) {
        return Err(HdrError::SolveFailed(format!(
            "non-finite response on {} channel",
            channel
        )));
    }
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use projcal_core::LdrFrame;

    // Horizontal radiance ramp seen through a linear sensor at several exposures
    fn ramp_brackets(exposures: &[f32]) -> Vec<Bracket> {
        let (w, h) = (64u32, 4u32);
        exposures
            .iter()
            .map(|&t| {
                let mut data = Vec::with_capacity((w * h * 3) as usize);
                for _y in 0..h {
                    for x in 0..w {
                        let radiance = 0.02 + 0.3 * x as f32 / (w - 1) as f32;
                        let code = (255.0 * radiance * t).round().clamp(0.0, 255.0) as u8;
                        data.extend_from_slice(&[code, code, code]);
                    }
                }
                Bracket::new(LdrFrame::from_raw(w, h, data).unwrap(), t)
            })
            .collect()
    }

    #[test]
    fn test_linear_response() {
        let r = CameraResponse::linear();
        assert_eq!(r.linearize(Channel::Red, 0), 0.0);
        assert_eq!(r.linearize(Channel::Blue, 255), 1.0);
    }

    #[test]
    fn test_from_curves_checks_size() {
        assert!(CameraResponse::from_curves(vec![0.0; 256], vec![0.0; 256], vec![0.0; 10]).is_err());
    }

    #[test]
    fn test_estimate_is_monotone_and_proportional() {
        let brackets = ramp_brackets(&[0.5, 1.0, 2.0, 4.0]);
        let r = CameraResponse::estimate(&brackets).unwrap();
        for channel in Channel::ALL {
            let c = r.curve(channel);
            assert_eq!(c.len(), RESPONSE_SIZE);
            assert!(c.windows(2).all(|w| w[1] >= w[0]));
        }
        // g(128) = 0 anchors the scale
        assert_relative_eq!(r.linearize(Channel::Green, 128), 1.0, epsilon = 1e-3);
        // A linear sensor should give a response roughly proportional to code
        let ratio = r.linearize(Channel::Green, 200) / r.linearize(Channel::Green, 100);
        assert!((ratio - 2.0).abs() < 0.2, "ratio {}", ratio);
    }

    #[test]
    fn test_sample_selection_bounded_by_pixels() {
        let brackets = ramp_brackets(&[1.0, 2.0]);
        let s = select_samples(&brackets, 1000);
        assert_eq!(s.len(), 64 * 4);
        let s = select_samples(&brackets, 10);
        assert_eq!(s.len(), 10);
    }
}
