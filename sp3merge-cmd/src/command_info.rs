use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use sp3merge::{summarize, InputSummary, OrbitReader, Sp3Reader, TimeSystem};

#[derive(Serialize)]
struct FileInfo {
    name: String,
    version: char,
    agency: String,
    time_system: TimeSystem,
    objects: Vec<InputSummary>,
}

pub fn info(inputs: &[PathBuf]) -> Result<()> {
    let mut files = Vec::default();
    for input in inputs {
        let file = Sp3Reader
            .read(input)
            .with_context(|| format!("reading {input:?}"))?;
        files.push(FileInfo {
            name: file.name.clone(),
            version: file.version,
            agency: file.agency.clone(),
            time_system: file.time_system,
            objects: summarize(&file),
        });
    }

    print!("{}", serde_json::to_string_pretty(&files)?);

    Ok(())
}
