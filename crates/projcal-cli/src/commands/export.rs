//! LUT export from a calibration report

use crate::ExportArgs;
use anyhow::{Context, Result};
use projcal_calibrate::CalibrationReport;
use projcal_lut::write_cube_1d;
use tracing::{debug, warn};

pub fn run(args: ExportArgs) -> Result<()> {
    let report = CalibrationReport::load(&args.report)
        .with_context(|| format!("Failed to load report: {}", args.report.display()))?;
    super::ensure_dir(&args.output)?;

    let mut written = 0;
    for p in &report.projectors {
        let Some(lut) = &p.lut else {
            warn!(projector = %p.name, "no LUT in report, skipped");
            continue;
        };
        let path = args.output.join(format!("{}.cube", p.name));
        write_cube_1d(&path, lut, Some(&p.name))
            .with_context(|| format!("Failed to write LUT: {}", path.display()))?;
        debug!(path = %path.display(), "LUT written");
        written += 1;
    }

    println!("Wrote {} LUT(s) to {}", written, args.output.display());
    Ok(())
}
