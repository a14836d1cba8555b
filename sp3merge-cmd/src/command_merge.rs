use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use sp3merge::{config::Config, Pipeline};

pub fn merge(
    config_path: &Path,
    output: Option<PathBuf>,
    satellite: Option<String>,
) -> Result<()> {
    let mut config = Config::with_path(config_path)
        .with_context(|| format!("loading config from {config_path:?}"))?;
    if let Some(output) = output {
        config.output_file_name = output;
    }
    if satellite.is_some() {
        config.satellite = satellite;
    }

    let pipeline = Pipeline::sp3(config.writer.clone());
    let merged = pipeline.run(&config).context("merging ephemerides")?;

    info!(
        "saved {} samples for {} to {:?}",
        merged.len(),
        merged.object_id,
        config.output_file_name
    );

    Ok(())
}
