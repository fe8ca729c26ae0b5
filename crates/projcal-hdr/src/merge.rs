//! Exposure-weighted fusion of a bracket set into one radiance image.
//!
//! Each code value `z` captured at exposure `t` contributes `response(z) / t`
//! weighted by a Gaussian centered on mid-gray:
//!
//! ```text
//! w(z) = exp(-16 * (z/255 - 0.5)^2),   w(0) = w(255) = 0
//! ```
//!
//! A pixel clipped in every bracket falls back to the unweighted mean of its
//! linearized values. The result is clamped to be non-negative.

use crate::{CameraResponse, HdrError, HdrResult};
use projcal_core::{Channel, LdrFrame, RadianceImage};

/// One bracketed capture together with the exposure that produced it.
#[derive(Debug, Clone)]
pub struct Bracket {
    /// Decoded frame
    pub frame: LdrFrame,
    /// Exposure actually applied by the camera
    pub exposure: f32,
}

impl Bracket {
    /// Pairs a frame with its exposure.
    pub fn new(frame: LdrFrame, exposure: f32) -> Self {
        Self { frame, exposure }
    }
}

/// Mid-tone weight for an 8-bit code value.
#[inline]
pub fn fusion_weight(code: u8) -> f32 {
    if code == 0 || code == 255 {
        return 0.0;
    }
    let t = code as f32 / 255.0 - 0.5;
    (-16.0 * t * t).exp()
}

/// Checks that a bracket set is non-empty, uniformly sized and has usable exposures.
pub fn validate_brackets(brackets: &[Bracket]) -> HdrResult<()> {
    let first = brackets.first().ok_or(HdrError::EmptyStack)?;
    let (w, h) = (first.frame.width(), first.frame.height());
    for (index, b) in brackets.iter().enumerate() {
        if b.frame.width() != w || b.frame.height() != h {
            return Err(HdrError::DimensionMismatch {
                index,
                width: b.frame.width(),
                height: b.frame.height(),
                expected_width: w,
                expected_height: h,
            });
        }
        if !(b.exposure.is_finite() && b.exposure > 0.0) {
            return Err(HdrError::InvalidExposure {
                index,
                exposure: b.exposure,
            });
        }
    }
    Ok(())
}

/// Merges a bracket set into a radiance image through `response`.
///
/// # Example
///
/// ```rust
/// use projcal_core::LdrFrame;
/// use projcal_hdr::{Bracket, CameraResponse, assemble};
///
/// let brackets = vec![
///     Bracket::new(LdrFrame::filled(4, 4, [64, 64, 64]), 1.0),
///     Bracket::new(LdrFrame::filled(4, 4, [128, 128, 128]), 2.0),
/// ];
/// let hdr = assemble(&brackets, &CameraResponse::linear()).unwrap();
/// assert!((hdr.pixel(0, 0).r - 64.0 / 255.0).abs() < 1e-4);
/// ```
pub fn assemble(brackets: &[Bracket], response: &CameraResponse) -> HdrResult<RadianceImage> {
    validate_brackets(brackets)?;
    let first = &brackets[0].frame;
    let (width, height) = (first.width(), first.height());
    let values = first.pixel_count() * 3;

    let inv_exposure: Vec<f32> = brackets.iter().map(|b| 1.0 / b.exposure).collect();
    let curves = Channel::ALL.map(|c| response.curve(c));
    let mut data = Vec::with_capacity(values);

    for i in 0..values {
        let curve = curves[i % 3];
        let mut weighted = 0.0f32;
        let mut weight_sum = 0.0f32;
        let mut plain = 0.0f32;

        for (b, inv_t) in brackets.iter().zip(&inv_exposure) {
            let z = b.frame.data()[i];
            let radiance = curve[z as usize] * inv_t;
            let w = fusion_weight(z);
            weighted += w * radiance;
            weight_sum += w;
            plain += radiance;
        }

        let v = if weight_sum > 0.0 {
            weighted / weight_sum
        } else {
            plain / brackets.len() as f32
        };
        data.push(v);
    }

    let mut image = RadianceImage::from_raw(width, height, data)?;
    image.clamp_non_negative();
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weight_shape() {
        assert_eq!(fusion_weight(0), 0.0);
        assert_eq!(fusion_weight(255), 0.0);
        assert!(fusion_weight(128) > fusion_weight(200));
        assert!(fusion_weight(128) > fusion_weight(30));
        assert_relative_eq!(fusion_weight(128), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_linear_merge_recovers_radiance() {
        // Scene radiance 0.1 per unit exposure; 8-bit code = 255 * 0.1 * t
        let make = |t: f32| {
            let code = (255.0f32 * 0.1 * t).round().min(255.0) as u8;
            Bracket::new(LdrFrame::filled(3, 2, [code, code, code]), t)
        };
        let brackets = vec![make(1.0), make(2.0), make(4.0), make(8.0)];
        let hdr = assemble(&brackets, &CameraResponse::linear()).unwrap();
        assert_relative_eq!(hdr.pixel(2, 1).g, 0.1, epsilon = 5e-3);
    }

    #[test]
    fn test_all_clipped_falls_back_to_mean() {
        let brackets = vec![
            Bracket::new(LdrFrame::filled(1, 1, [255, 255, 255]), 1.0),
            Bracket::new(LdrFrame::filled(1, 1, [255, 255, 255]), 2.0),
        ];
        let hdr = assemble(&brackets, &CameraResponse::linear()).unwrap();
        assert_relative_eq!(hdr.pixel(0, 0).r, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_bad_stacks() {
        assert!(matches!(
            assemble(&[], &CameraResponse::linear()),
            Err(HdrError::EmptyStack)
        ));
        let mismatched = vec![
            Bracket::new(LdrFrame::filled(2, 2, [1, 1, 1]), 1.0),
            Bracket::new(LdrFrame::filled(3, 2, [1, 1, 1]), 2.0),
        ];
        assert!(matches!(
            assemble(&mismatched, &CameraResponse::linear()),
            Err(HdrError::DimensionMismatch { index: 1, .. })
        ));
        let zero = vec![Bracket::new(LdrFrame::filled(2, 2, [1, 1, 1]), 0.0)];
        assert!(matches!(
            assemble(&zero, &CameraResponse::linear()),
            Err(HdrError::InvalidExposure { index: 0, .. })
        ));
    }
}
