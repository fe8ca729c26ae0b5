//! Projected region detection.
//!
//! One projector is located by differencing an HDR capture where only it
//! shows white against one where every other projector does. The residual
//! is thresholded on luminance relative to its own maximum, lowering the
//! threshold until enough pixels are kept.

use crate::{CalibrationError, CalibrationResult};
use projcal_core::{BoundingRegion, RadianceImage, RegionMask};
use tracing::debug;

/// `max(0, only_target - factor * all_others)`.
pub fn difference_image(
    only_target: &RadianceImage,
    all_others: &RadianceImage,
    factor: f32,
) -> CalibrationResult<RadianceImage> {
    Ok(only_target.subtract_scaled(all_others, factor)?)
}

// Max luminance, rejecting images with nothing to find
fn peak_luminance(image: &RadianceImage) -> CalibrationResult<f32> {
    if !image.is_valid() {
        return Err(CalibrationError::RegionNotFound {
            reason: "empty image".into(),
        });
    }
    let max = image.max_luminance();
    if !(max > 0.0) || !max.is_finite() {
        return Err(CalibrationError::RegionNotFound {
            reason: format!("maximum luminance is {}", max),
        });
    }
    Ok(max)
}

/// Finds the brightest blob and returns its centroid and half side.
///
/// Binary moments are taken over pixels with luminance in
/// `[max / 2^(k+2), max / 2^k]`, with `k` advancing by half a stop until
/// the kept area reaches `min_area_fraction` of the frame.
pub fn detect_bounding_region(
    image: &RadianceImage,
    min_area_fraction: f32,
    max_iterations: usize,
) -> CalibrationResult<BoundingRegion> {
    let max = peak_luminance(image)?;
    let width = image.width() as usize;
    let min_area = min_area_fraction as f64 * image.pixel_count() as f64;

    for iteration in 0..max_iterations {
        let k = iteration as f32 * 0.5;
        let low = max / 2f32.powf(k + 2.0);
        let high = max / 2f32.powf(k);

        let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);
        for (i, p) in image.pixels().enumerate() {
            let lum = p.luminance();
            if lum >= low && lum <= high {
                m00 += 1.0;
                m10 += (i % width) as f64;
                m01 += (i / width) as f64;
            }
        }
        debug!(iteration, low, high, area = m00, "bounding region threshold");

        if m00 >= min_area && m00 > 0.0 {
            return Ok(BoundingRegion {
                centroid_x: (m10 / m00) as f32,
                centroid_y: (m01 / m00) as f32,
                half_size: (m00.sqrt() / 2.0) as f32,
            });
        }
    }

    Err(CalibrationError::ConvergenceFailure {
        stage: "region detection",
        iterations: max_iterations,
    })
}

/// Finds the pixels lit by the projector.
///
/// Keeps pixels with luminance in `(max / 2^(k+8), max]` for `k = 0, 1, ...`
/// until the kept count reaches `min_area_fraction` of the frame.
pub fn detect_mask_region(
    image: &RadianceImage,
    min_area_fraction: f32,
    max_iterations: usize,
) -> CalibrationResult<RegionMask> {
    let max = peak_luminance(image)?;
    let min_area = min_area_fraction as f64 * image.pixel_count() as f64;
    let luminance: Vec<f32> = image.pixels().map(|p| p.luminance()).collect();

    for iteration in 0..max_iterations {
        let low = max / 2f32.powi(iteration as i32 + 8);
        let bits: Vec<bool> = luminance.iter().map(|&l| l > low && l <= max).collect();
        let count = bits.iter().filter(|b| **b).count();
        debug!(iteration, low, count, "mask threshold");

        if count as f64 >= min_area && count > 0 {
            return Ok(RegionMask::from_bits(image.width(), image.height(), bits)?);
        }
    }

    Err(CalibrationError::ConvergenceFailure {
        stage: "region detection",
        iterations: max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use projcal_core::RgbValue;

    // Bright square of side `side` at (x0, y0) on a black frame
    fn square(w: u32, h: u32, x0: u32, y0: u32, side: u32, value: f32) -> RadianceImage {
        let mut img = RadianceImage::new(w, h);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.set_pixel(x, y, RgbValue::splat(value));
            }
        }
        img
    }

    #[test]
    fn test_bounding_region_of_square() {
        let img = square(64, 48, 10, 12, 16, 2.0);
        let r = detect_bounding_region(&img, 0.01, 16).unwrap();
        assert_relative_eq!(r.centroid_x, 17.5, epsilon = 1.0);
        assert_relative_eq!(r.centroid_y, 19.5, epsilon = 1.0);
        assert_relative_eq!(r.area(), 256.0, epsilon = 1.0);
    }

    #[test]
    fn test_mask_region_of_square() {
        let img = square(64, 48, 30, 5, 10, 0.5);
        let m = detect_mask_region(&img, 0.01, 16).unwrap();
        assert_eq!(m.pixel_count(), 100);
        let (cx, cy) = m.centroid();
        assert_relative_eq!(cx, 34.5, epsilon = 1.0);
        assert_relative_eq!(cy, 9.5, epsilon = 1.0);
        assert!(m.contains(30, 5));
        assert!(!m.contains(29, 5));
    }

    #[test]
    fn test_mask_lowers_threshold_for_dim_edges() {
        // Bright core plus a dim halo: the halo sits below max/2^8 at first
        let mut img = square(32, 32, 8, 8, 16, 0.001);
        for y in 14..18 {
            for x in 14..18 {
                img.set_pixel(x, y, RgbValue::splat(1.0));
            }
        }
        let m = detect_mask_region(&img, 0.2, 16).unwrap();
        assert_eq!(m.pixel_count(), 256);
    }

    #[test]
    fn test_black_image_not_found() {
        let img = RadianceImage::new(16, 16);
        assert!(matches!(
            detect_bounding_region(&img, 0.01, 8),
            Err(CalibrationError::RegionNotFound { .. })
        ));
        assert!(matches!(
            detect_mask_region(&img, 0.01, 8),
            Err(CalibrationError::RegionNotFound { .. })
        ));
        assert!(matches!(
            detect_mask_region(&RadianceImage::new(0, 0), 0.01, 8),
            Err(CalibrationError::RegionNotFound { .. })
        ));
    }

    #[test]
    fn test_area_never_reached() {
        // A single lit pixel cannot cover half the frame
        let img = square(16, 16, 3, 3, 1, 1.0);
        assert!(matches!(
            detect_mask_region(&img, 0.5, 4),
            Err(CalibrationError::ConvergenceFailure { iterations: 4, .. })
        ));
    }

    #[test]
    fn test_difference_cancels_shared_light() {
        let a = square(8, 8, 0, 0, 4, 1.0);
        let b = square(8, 8, 2, 0, 4, 1.0);
        let d = difference_image(&a, &b, 1.0).unwrap();
        assert_eq!(d.pixel(0, 0), RgbValue::ONE);
        assert_eq!(d.pixel(3, 0), RgbValue::ZERO);
        assert_eq!(d.pixel(5, 0), RgbValue::ZERO);
    }
}
