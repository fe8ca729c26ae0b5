//! Configuration inspection

use crate::ConfigArgs;
use anyhow::{Context, Result};

pub fn run(args: ConfigArgs) -> Result<()> {
    let config = super::load_config(args.input.as_deref())?;
    let sanitized = config.sanitized();

    if args.check {
        if sanitized != config {
            anyhow::bail!("Configuration has out-of-range values (see warnings)");
        }
        return Ok(());
    }

    let yaml = sanitized
        .to_yaml_string()
        .context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}
