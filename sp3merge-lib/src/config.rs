use std::{
    fs::File,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    writer::WriterConfig,
};

/// Merge run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Inputs in merge order. Later files take precedence for duplicate epochs.
    pub measurement_files: Vec<PathBuf>,
    pub output_file_name: PathBuf,
    /// Directory relative measurement files are resolved against.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Object to merge instead of the first object in the first file.
    #[serde(default)]
    pub satellite: Option<String>,
    #[serde(flatten)]
    pub writer: WriterConfig,
}

impl Config {
    fn validate(self) -> Result<Self> {
        if self.measurement_files.is_empty() {
            return Err(Error::ConfigInvalid(
                "measurementFiles must list at least one file".to_string(),
            ));
        }
        if self.output_file_name.as_os_str().is_empty() {
            return Err(Error::ConfigInvalid(
                "outputFileName must not be empty".to_string(),
            ));
        }
        if let Some(satellite) = &self.satellite {
            if satellite.trim().is_empty() {
                return Err(Error::ConfigInvalid(
                    "satellite must not be empty".to_string(),
                ));
            }
        }
        self.writer.validate()?;

        Ok(self)
    }

    pub fn with_path(fpath: &Path) -> Result<Config> {
        let fin = File::open(fpath)
            .map_err(|e| Error::ConfigInvalid(format!("cannot open {fpath:?}: {e}")))?;
        let config: Config = serde_yaml::from_reader(fin)?;

        config.validate()
    }

    pub fn with_data(dat: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(dat)?;
        config.validate()
    }

    /// Measurement files with relative paths resolved against `data_dir`, if set.
    pub fn input_paths(&self) -> Vec<PathBuf> {
        self.measurement_files
            .iter()
            .map(|p| match &self.data_dir {
                Some(dir) if p.is_relative() => dir.join(p),
                _ => p.clone(),
            })
            .collect()
    }
}

static EXAMPLE_CONFIG: &str = include_str!(concat!(env!("OUT_DIR"), "/example.config.yaml"));

/// Annotated example configuration with all defaults spelled out.
pub fn get_example_content() -> &'static str {
    EXAMPLE_CONFIG
}

pub fn get_example() -> Result<Config> {
    Config::with_data(EXAMPLE_CONFIG)
}
