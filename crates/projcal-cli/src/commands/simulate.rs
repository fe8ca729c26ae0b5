//! Calibration against the simulated wall

use crate::{ResponseArgs, SimulateArgs};
use anyhow::{Context, Result};
use projcal_calibrate::sim::SimulatedRig;
use projcal_calibrate::{Calibrator, ResponseCache};
use projcal_lut::write_cube_1d;
use std::path::Path;
use tracing::{info, warn};

fn load_cache(path: Option<&Path>) -> Result<ResponseCache> {
    match path {
        Some(p) if p.exists() => {
            info!(path = %p.display(), "loading camera response");
            ResponseCache::load(p)
                .with_context(|| format!("Failed to load camera response: {}", p.display()))
        }
        _ => Ok(ResponseCache::new()),
    }
}

fn save_cache(cache: &ResponseCache, path: &Path) -> Result<()> {
    if cache
        .save(path)
        .with_context(|| format!("Failed to save camera response: {}", path.display()))?
    {
        info!(path = %path.display(), "camera response saved");
    }
    Ok(())
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let scene = super::load_scene(args.scene.as_deref())?;
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(samples) = args.samples {
        config.color_samples = samples;
    }
    if let Some(method) = args.method {
        config.equalization = method;
    }
    if args.diagnostics.is_some() {
        config.diagnostics_dir = args.diagnostics.clone();
    }

    super::ensure_dir(&args.output)?;
    let mut cache = load_cache(args.cache.as_deref())?;

    let rig = SimulatedRig::new(&scene);
    let calibrator = Calibrator::new(config);
    let report = calibrator
        .run(&mut rig.camera(), &rig.control(), &mut cache)
        .context("Calibration failed")?;

    if let Some(path) = &args.cache {
        save_cache(&cache, path)?;
    }

    let report_path = args.output.join("report.json");
    report
        .save(&report_path)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;

    for p in &report.projectors {
        match &p.lut {
            Some(lut) => {
                let path = args.output.join(format!("{}.cube", p.name));
                write_cube_1d(&path, lut, Some(&p.name))
                    .with_context(|| format!("Failed to write LUT: {}", path.display()))?;
            }
            None => warn!(projector = %p.name, "not published"),
        }
        for e in &p.errors {
            warn!(projector = %p.name, "{}", e);
        }
    }

    println!(
        "Calibrated {}/{} projectors ({}), report: {}",
        report.published_count(),
        report.projectors.len(),
        report.equalization_method,
        report_path.display()
    );
    Ok(())
}

pub fn run_response(args: ResponseArgs) -> Result<()> {
    let scene = super::load_scene(args.scene.as_deref())?;
    let config = super::load_config(args.config.as_deref())?;

    let rig = SimulatedRig::new(&scene);
    let mut cache = ResponseCache::new();
    let exposure = Calibrator::new(config)
        .update_response(&mut rig.camera(), &rig.control(), &mut cache)
        .context("Camera response estimation failed")?;

    save_cache(&cache, &args.cache)?;
    println!(
        "Camera response estimated at exposure {:.4}: {}",
        exposure,
        args.cache.display()
    );
    Ok(())
}
