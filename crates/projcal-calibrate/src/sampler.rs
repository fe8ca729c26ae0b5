//! Per-channel response sampling.
//!
//! Drives one channel of one projector through evenly spaced levels and
//! measures the HDR radiance over its region at each level.

use crate::cache::ResponseCache;
use crate::camera::Camera;
use crate::control::Display;
use crate::hdr_capture::{Diagnostics, capture_hdr};
use crate::params::{Curve, CurvePoint};
use crate::{CalibrationConfig, CalibrationResult};
use projcal_core::{Channel, ProjectorRegion, RgbValue};
use projcal_math::unit_steps;
use tracing::{debug, info};

/// Sampled curves for one projector.
#[derive(Debug, Clone, Default)]
pub struct SampledCurves {
    /// One curve per channel
    pub curves: [Curve; 3],
    /// Channel value measured at the lowest level
    pub min_values: RgbValue,
    /// Channel value measured at the highest level
    pub max_values: RgbValue,
}

/// Samples the three channel curves of `projector`.
///
/// The camera exposure is reset to `mid_exposure` before each capture.
/// Any capture failure aborts sampling.
#[allow(clippy::too_many_arguments)]
pub fn sample_curves(
    camera: &mut dyn Camera,
    display: &Display<'_>,
    projector: &str,
    region: &ProjectorRegion,
    mid_exposure: f32,
    config: &CalibrationConfig,
    cache: &mut ResponseCache,
    diagnostics: Option<&std::path::Path>,
) -> CalibrationResult<SampledCurves> {
    let samples = config.color_samples.max(3);
    let mut out = SampledCurves::default();

    for channel in Channel::ALL {
        info!(projector, %channel, samples, "sampling channel");
        let mut curve: Curve = Vec::with_capacity(samples);

        for (s, input) in unit_steps(samples).into_iter().enumerate() {
            display.clear(projector, RgbValue::ZERO.with(channel, input));
            camera.set_exposure(mid_exposure);

            let prefix = format!("{}_{}_{}", projector, channel, s);
            let diag = diagnostics.map(|dir| Diagnostics {
                dir,
                prefix: &prefix,
            });
            let hdr = capture_hdr(camera, config.image_per_hdr, config.hdr_step, cache, diag)?;
            let measured = region.mean_of(&hdr);
            debug!(projector, %channel, input, %measured, "sample");
            curve.push(CurvePoint::new(input, measured));

            display.clear(projector, RgbValue::ZERO);
        }

        if let (Some(first), Some(last)) = (curve.first(), curve.last()) {
            out.min_values[channel] = first.measured[channel];
            out.max_values[channel] = last.measured[channel];
        }
        out.curves[channel.index()] = curve;
    }

    Ok(out)
}
