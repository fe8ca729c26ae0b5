//! Response curve inversion.
//!
//! A sampled curve maps input level to measured radiance. The inverse maps
//! a normalized target output back to the input level that produces it and
//! is tabulated into 256 entries.

use crate::params::Curve;
use crate::{CalibrationError, CalibrationResult};
use projcal_core::Channel;
use projcal_lut::{ColorLut, LUT_SIZE};
use projcal_math::Spline;
use tracing::{debug, warn};

/// Minimum spacing between accepted abscissas.
pub const ABSCISSA_EPSILON: f64 = 0.001;

/// Inverts one channel's curve into a 256-entry table.
///
/// Points are sorted by the measured channel value and normalized to
/// `[0, 1]`; near-duplicates are dropped and the ends are pushed just past
/// the unit interval so every query is inside the fitted domain.
pub fn invert_channel(
    projector: &str,
    curve: &Curve,
    channel: Channel,
) -> CalibrationResult<Vec<f32>> {
    let degenerate = || CalibrationError::DegenerateCurve {
        projector: projector.to_string(),
        channel,
    };

    let mut points: Vec<(f64, f64)> = curve
        .iter()
        .map(|p| (p.measured[channel] as f64, p.input as f64))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (y_offset, y_range) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.0, last.0 - first.0),
        _ => return Err(degenerate()),
    };
    if !(y_range > 0.0) || !y_range.is_finite() {
        return Err(degenerate());
    }

    let mut xs: Vec<f64> = Vec::with_capacity(points.len());
    let mut ys: Vec<f64> = Vec::with_capacity(points.len());
    for (measured, input) in points {
        let x = (measured - y_offset) / y_range;
        if let Some(&prev) = xs.last() {
            if x - prev < ABSCISSA_EPSILON {
                debug!(projector, %channel, x, "dropping near-duplicate sample");
                continue;
            }
        }
        xs.push(x);
        ys.push(input);
    }
    if xs.len() < 2 {
        return Err(degenerate());
    }

    let last = xs.len() - 1;
    xs[0] = xs[0].max(0.0) - ABSCISSA_EPSILON;
    xs[last] = xs[last].min(1.0) + ABSCISSA_EPSILON;

    let numeric = |e: projcal_math::SplineError| CalibrationError::NumericFailure {
        projector: projector.to_string(),
        channel,
        reason: e.to_string(),
    };
    let spline = Spline::fit(&xs, &ys).map_err(numeric)?;
    debug!(projector, %channel, kind = spline.kind().name(), points = xs.len(), "fitted inverse");

    (0..LUT_SIZE)
        .map(|i| {
            let q = (i as f64 / (LUT_SIZE - 1) as f64).min(1.0);
            spline.eval(q).map(|v| v as f32).map_err(numeric)
        })
        .collect()
}

/// Inverts all three channels independently.
pub fn invert_curves(projector: &str, curves: &[Curve; 3]) -> [CalibrationResult<Vec<f32>>; 3] {
    Channel::ALL.map(|c| invert_channel(projector, &curves[c.index()], c))
}

/// Builds a LUT from inversion results, using the identity table for any
/// failed channel.
///
/// Returns the LUT, the channels that fell back and their errors.
pub fn lut_with_fallback(
    results: [CalibrationResult<Vec<f32>>; 3],
) -> (ColorLut, Vec<Channel>, Vec<CalibrationError>) {
    let mut lut = ColorLut::identity();
    let mut degenerate = Vec::new();
    let mut errors = Vec::new();

    for (channel, result) in Channel::ALL.into_iter().zip(results) {
        let table = match result {
            Ok(t) => t,
            Err(e) => {
                warn!(%channel, error = %e, "channel falls back to identity");
                degenerate.push(channel);
                errors.push(e);
                continue;
            }
        };
        if let Err(e) = lut.set_channel(channel, table) {
            warn!(%channel, error = %e, "channel falls back to identity");
            degenerate.push(channel);
            errors.push(e.into());
        }
    }
    (lut, degenerate, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CurvePoint;
    use approx::assert_abs_diff_eq;
    use projcal_core::RgbValue;
    use projcal_lut::identity_channel;

    fn curve(f: impl Fn(f32) -> f32, samples: usize) -> Curve {
        (0..samples)
            .map(|s| {
                let x = s as f32 / (samples - 1) as f32;
                CurvePoint::new(x, RgbValue::splat(f(x)))
            })
            .collect()
    }

    #[test]
    fn test_linear_response_gives_identity() {
        for samples in [3, 8] {
            let lut = invert_channel("p", &curve(|x| x, samples), Channel::Red).unwrap();
            assert_eq!(lut.len(), 256);
            for (i, v) in lut.iter().enumerate() {
                assert_abs_diff_eq!(*v, i as f32 / 255.0, epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn test_affine_response_is_normalized() {
        // Offset and gain cancel out after normalization
        let lut = invert_channel("p", &curve(|x| 0.8 * x + 0.05, 8), Channel::Green).unwrap();
        assert_abs_diff_eq!(lut[0], 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(lut[128], 128.0 / 255.0, epsilon = 1e-2);
        assert_abs_diff_eq!(lut[255], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_gamma_response_is_inverted() {
        let lut = invert_channel("p", &curve(|x| x * x, 16), Channel::Blue).unwrap();
        // Half output needs sqrt(0.5) input
        assert_abs_diff_eq!(lut[128], (128.0f32 / 255.0).sqrt(), epsilon = 2e-2);
        assert!(lut.windows(2).all(|w| w[1] >= w[0] - 1e-4));
    }

    #[test]
    fn test_unsorted_capture_order() {
        let mut c = curve(|x| x, 6);
        c.reverse();
        let lut = invert_channel("p", &c, Channel::Red).unwrap();
        assert_abs_diff_eq!(lut[64], 64.0 / 255.0, epsilon = 1e-2);
    }

    #[test]
    fn test_flat_curve_is_degenerate() {
        let err = invert_channel("p", &curve(|_| 0.3, 8), Channel::Red).unwrap_err();
        assert!(matches!(err, CalibrationError::DegenerateCurve { channel: Channel::Red, .. }));
        assert!(invert_channel("p", &Vec::new(), Channel::Red).is_err());
    }

    #[test]
    fn test_near_duplicates_are_dropped() {
        // Saturating response: the top samples collapse onto one value
        let c = curve(|x| x.min(0.5), 9);
        let lut = invert_channel("p", &c, Channel::Green).unwrap();
        assert_eq!(lut.len(), 256);
        assert!(lut.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fallback_marks_channels() {
        let curves = [curve(|x| x, 8), curve(|_| 0.0, 8), curve(|x| x, 8)];
        let (lut, degenerate, errors) = lut_with_fallback(invert_curves("p", &curves));
        assert_eq!(degenerate, vec![Channel::Green]);
        assert_eq!(errors.len(), 1);
        assert_eq!(lut.channel(Channel::Green), identity_channel().as_slice());
        assert_abs_diff_eq!(lut.channel(Channel::Red)[200], 200.0 / 255.0, epsilon = 1e-2);
    }
}
