//! Calibration run orchestration.
//!
//! A run has two phases. The measurement phase (exposure, camera response,
//! regions, curves, inversion, cross-talk) needs the camera and aborts the
//! whole run on failure. The finishing phase (white balance, common range,
//! publication) works on measured data only; its failures are recorded per
//! projector and the other projectors still publish.
//!
//! Whatever happens, display overrides are reset and the camera is released
//! before [`Calibrator::run`] returns.

use crate::cache::ResponseCache;
use crate::camera::{Camera, CameraLease};
use crate::control::{ControlPlane, Display};
use crate::hdr_capture::{Diagnostics, capture_hdr};
use crate::inverter::{invert_curves, lut_with_fallback};
use crate::mixing::solve_mix;
use crate::params::CalibrationParams;
use crate::region::{detect_mask_region, difference_image};
use crate::report::{CalibrationReport, CommonRange, ProjectorReport};
use crate::sampler::sample_curves;
use crate::white_balance::{correction, equalize, white_balance};
use crate::{
    CalibrationConfig, CalibrationError, CalibrationResult, EqualizationMethod, exposure,
};
use projcal_core::{Channel, ProjectorRegion, RgbValue};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// Gray level flashed while searching the exposure and the camera response.
pub const EXPOSURE_GRAY: f32 = 0.7;

/// Brackets per capture used for region detection.
const REGION_BRACKETS: usize = 1;

// Single-flight flag, cleared on drop
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> CalibrationResult<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(CalibrationError::AlreadyRunning);
        }
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs calibrations with a fixed configuration.
///
/// # Example
///
/// ```rust
/// use projcal_calibrate::{Calibrator, CalibrationConfig, ResponseCache};
/// use projcal_calibrate::sim::{SimConfig, SimulatedRig};
///
/// let rig = SimulatedRig::new(&SimConfig::default());
/// let calibrator = Calibrator::new(CalibrationConfig {
///     color_samples: 4,
///     ..Default::default()
/// });
/// let mut cache = ResponseCache::with_response(projcal_hdr::CameraResponse::linear());
/// let report = calibrator
///     .run(&mut rig.camera(), &rig.control(), &mut cache)
///     .unwrap();
/// assert_eq!(report.published_count(), 2);
/// ```
#[derive(Debug)]
pub struct Calibrator {
    config: CalibrationConfig,
    running: AtomicBool,
}

impl Calibrator {
    /// Creates a calibrator; the configuration is sanitized first.
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config: config.sanitized(),
            running: AtomicBool::new(false),
        }
    }

    /// Effective configuration.
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Returns true while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Calibrates every projector listed by the control plane.
    ///
    /// The camera response is taken from `cache`, or estimated and stored
    /// there if it is empty.
    pub fn run(
        &self,
        camera: &mut dyn Camera,
        control: &dyn ControlPlane,
        cache: &mut ResponseCache,
    ) -> CalibrationResult<CalibrationReport> {
        self.session(camera, control, |camera, display| {
            let diagnostics = self.diagnostics_dir();
            let (mut params, mid_exposure) =
                self.measure(camera, display, cache, diagnostics.as_deref())?;
            Ok(self.finish(&mut params, mid_exposure, display))
        })
    }

    /// Re-estimates the camera response without calibrating.
    ///
    /// Returns the exposure the brackets were centered on.
    pub fn update_response(
        &self,
        camera: &mut dyn Camera,
        control: &dyn ControlPlane,
        cache: &mut ResponseCache,
    ) -> CalibrationResult<f32> {
        self.session(camera, control, |camera, display| {
            let mid = self.find_mid_exposure(camera, display)?;
            cache.invalidate();
            let diagnostics = self.diagnostics_dir();
            capture_hdr(
                camera,
                self.config.crf_brackets,
                self.config.crf_step,
                cache,
                diag(diagnostics.as_deref(), "crf"),
            )?;
            info!(mid, "camera response updated");
            Ok(mid)
        })
    }

    // Acquire, list projectors, run `body`, then reset displays and release.
    fn session<T>(
        &self,
        camera: &mut dyn Camera,
        control: &dyn ControlPlane,
        body: impl FnOnce(&mut dyn Camera, &Display<'_>) -> CalibrationResult<T>,
    ) -> CalibrationResult<T> {
        let _guard = RunGuard::enter(&self.running)?;

        let mut lease = CameraLease::acquire(camera).map_err(|e| {
            warn!(error = %e, "cannot acquire camera");
            CalibrationError::CameraNotReady
        })?;
        if !lease.is_ready() {
            lease.release();
            return Err(CalibrationError::CameraNotReady);
        }

        let projectors = control.list_objects_by_category(&self.config.projector_category);
        if projectors.is_empty() {
            lease.release();
            return Err(CalibrationError::NoProjectors {
                category: self.config.projector_category.clone(),
            });
        }
        info!(count = projectors.len(), "projectors found");

        let display = Display::new(control, &projectors);
        let result = body(&mut *lease, &display);

        display.reset();
        lease.release();
        if let Err(e) = &result {
            error!(error = %e, "calibration aborted, display state restored");
        }
        result
    }

    fn diagnostics_dir(&self) -> Option<PathBuf> {
        let dir = self.config.diagnostics_dir.as_ref()?;
        match std::fs::create_dir_all(dir) {
            Ok(()) => Some(dir.clone()),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "diagnostics disabled");
                None
            }
        }
    }

    fn find_mid_exposure(
        &self,
        camera: &mut dyn Camera,
        display: &Display<'_>,
    ) -> CalibrationResult<f32> {
        display.hide_all(true);
        display.clear_all(RgbValue::splat(EXPOSURE_GRAY));
        display.flash_all(true);
        exposure::find_exposure(camera, self.config.max_exposure_iterations)
    }

    // Steps that need the camera. Any error aborts the run.
    fn measure(
        &self,
        camera: &mut dyn Camera,
        display: &Display<'_>,
        cache: &mut ResponseCache,
        diagnostics: Option<&Path>,
    ) -> CalibrationResult<(Vec<CalibrationParams>, f32)> {
        let config = &self.config;
        let mid = self.find_mid_exposure(camera, display)?;

        if cache.is_empty() {
            info!(brackets = config.crf_brackets, "capturing camera response brackets");
            capture_hdr(
                camera,
                config.crf_brackets,
                config.crf_step,
                cache,
                diag(diagnostics, "crf"),
            )?;
        }
        display.clear_all(RgbValue::ZERO);

        let mut all: Vec<CalibrationParams> = display
            .projectors()
            .iter()
            .map(CalibrationParams::new)
            .collect();

        for params in &mut all {
            let name = params.name.clone();
            info!(projector = %name, "detecting region");

            display.isolate(&name);
            camera.set_exposure(mid);
            let only = capture_hdr(
                camera,
                REGION_BRACKETS,
                config.hdr_step,
                cache,
                diag(diagnostics, &format!("{}_only", name)),
            )?;

            display.all_but(&name);
            camera.set_exposure(mid);
            let others = capture_hdr(
                camera,
                REGION_BRACKETS,
                config.hdr_step,
                cache,
                diag(diagnostics, &format!("{}_others", name)),
            )?;

            let diff = difference_image(&only, &others, config.detection_threshold)?;
            let mask = detect_mask_region(&diff, config.min_area_fraction, config.max_region_iterations)?;
            let region = ProjectorRegion::Mask(mask);

            params.white_point = region.mean_of(&only);
            params.white_balance = white_balance(params.white_point).unwrap_or(RgbValue::ONE);
            info!(
                projector = %name,
                pixels = region.area(),
                white_point = %params.white_point,
                "region found"
            );
            params.region = Some(region);
        }
        display.clear_all(RgbValue::ZERO);

        for params in &mut all {
            let Some(region) = params.region.as_ref() else {
                continue;
            };
            let sampled = sample_curves(
                camera,
                display,
                &params.name,
                region,
                mid,
                config,
                cache,
                diagnostics,
            )?;
            params.curves = sampled.curves;
            params.min_values = sampled.min_values;
            params.max_values = sampled.max_values;
        }

        for params in &mut all {
            let (lut, degenerate, errors) = lut_with_fallback(invert_curves(&params.name, &params.curves));
            params.lut = lut;
            params.degenerate_channels = degenerate;
            for e in errors {
                params.record(e);
            }

            match solve_mix(&params.name, &params.curves) {
                Ok(m) => params.mix_matrix = Some(m),
                Err(e) => {
                    warn!(projector = %params.name, error = %e, "no mixing matrix");
                    params.record(e);
                }
            }
        }

        Ok((all, mid))
    }

    // Steps on measured data only. Failures stay with their projector.
    fn finish(
        &self,
        all: &mut [CalibrationParams],
        mid_exposure: f32,
        display: &Display<'_>,
    ) -> CalibrationReport {
        let (target, method, equalization_error) = self.equalize(all);
        for params in all.iter_mut() {
            match white_balance(params.white_point) {
                Some(balance) => {
                    let c = correction(target, balance);
                    for channel in Channel::ALL {
                        params.lut.scale_channel(channel, c[channel]);
                    }
                    params.min_values = params.min_values * c;
                    params.max_values = params.max_values * c;
                }
                None => {
                    warn!(projector = %params.name, "white point unusable, balance left as is");
                    params.record(format!(
                        "white point {} has no green component",
                        params.white_point
                    ));
                }
            }
        }

        let common = common_range(all);
        let mut skip = vec![false; all.len()];
        match &common {
            Some(range) if range.is_empty() => {
                warn!(
                    min = range.min_luminance,
                    max = range.max_luminance,
                    "projectors share no luminance range, LUTs not rescaled"
                );
            }
            Some(range) => {
                for (params, skip) in all.iter_mut().zip(skip.iter_mut()) {
                    if let Err(reason) = rescale_to_common(params, range) {
                        warn!(projector = %params.name, %reason, "projector not published");
                        params.record(reason);
                        *skip = true;
                    }
                }
            }
            None => {}
        }

        let mut projectors = Vec::with_capacity(all.len());
        for (params, skip) in all.iter().zip(skip) {
            if !skip {
                display.publish(&params.name, &params.lut, params.mix_matrix.as_ref());
                info!(projector = %params.name, "calibration published");
            }
            projectors.push(ProjectorReport::from_params(params, !skip));
        }

        CalibrationReport {
            projectors,
            target_white_balance: target,
            equalization_method: method,
            equalization_error,
            common_range: common,
            mid_exposure,
        }
    }

    fn equalize(&self, all: &[CalibrationParams]) -> (RgbValue, EqualizationMethod, Option<String>) {
        let white_points: Vec<RgbValue> = all.iter().map(|p| p.white_point).collect();
        let method = self.config.equalization;
        match equalize(method, &white_points, self.config.max_equalization_iterations) {
            Ok(target) => (target, method, None),
            Err(e) => {
                warn!(error = %e, "falling back to plain white balance equalization");
                let fallback = EqualizationMethod::EqualizeOnly;
                let target = equalize(fallback, &white_points, 1).unwrap_or(RgbValue::ONE);
                (target, fallback, Some(e.to_string()))
            }
        }
    }
}

fn diag<'a>(dir: Option<&'a Path>, prefix: &'a str) -> Option<Diagnostics<'a>> {
    dir.map(|dir| Diagnostics { dir, prefix })
}

/// Range reachable by every projector: the largest minimum and the
/// smallest maximum, per channel and in luminance.
pub fn common_range(all: &[CalibrationParams]) -> Option<CommonRange> {
    let first = all.first()?;
    let mut range = CommonRange {
        min: first.min_values,
        max: first.max_values,
        min_luminance: first.min_values.luminance(),
        max_luminance: first.max_values.luminance(),
    };
    for p in &all[1..] {
        range.min = range.min.max(p.min_values);
        range.max = range.max.min(p.max_values);
        range.min_luminance = range.min_luminance.max(p.min_values.luminance());
        range.max_luminance = range.max_luminance.min(p.max_values.luminance());
    }
    Some(range)
}

/// Remaps a projector's LUT so its luminance range lands on `range`.
pub fn rescale_to_common(params: &mut CalibrationParams, range: &CommonRange) -> Result<(), String> {
    let low = params.min_values.luminance();
    let span = params.max_values.luminance() - low;
    if !(span > 0.0) {
        return Err(format!("non-positive luminance range {}", span));
    }
    let offset = (range.min_luminance - low) / span;
    let scale = (range.max_luminance - range.min_luminance) / span;
    params.lut.rescale(scale, offset);
    Ok(())
}
