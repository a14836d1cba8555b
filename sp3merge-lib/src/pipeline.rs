use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    merge::merge,
    reader::{OrbitFile, OrbitReader, Sp3Reader},
    sample::{MergedEphemeris, ObjectEphemeris},
    time::Time,
    writer::{Sp3Writer, WriterConfig},
};

/// Diagnostic summary of one object in one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSummary {
    pub name: String,
    pub frame: String,
    pub number_of_epochs: usize,
    pub object_id: String,
    pub samples: usize,
    pub start: Option<Time>,
    pub end: Option<Time>,
}

impl InputSummary {
    pub fn new(file: &OrbitFile, object: &ObjectEphemeris) -> Self {
        Self {
            name: file.name.clone(),
            frame: file.coordinate_system.clone(),
            number_of_epochs: file.number_of_epochs,
            object_id: object.object_id.clone(),
            samples: object.samples.len(),
            start: object.start(),
            end: object.stop(),
        }
    }
}

/// Summaries for every object in `file`.
pub fn summarize(file: &OrbitFile) -> Vec<InputSummary> {
    file.objects
        .iter()
        .map(|o| InputSummary::new(file, o))
        .collect()
}

/// The object merged when none is configured; the first object of the first file.
///
/// # Errors
/// [Error::NoSatelliteData] if there are no files or the first file has no objects.
pub fn select_object(files: &[OrbitFile]) -> Result<String> {
    let Some(first) = files.first() else {
        return Err(Error::NoSatelliteData("no inputs".to_string()));
    };
    first
        .objects
        .first()
        .map(|o| o.object_id.clone())
        .ok_or_else(|| Error::NoSatelliteData(format!("no satellites in {}", first.name)))
}

/// Reads inputs, merges a single object, and writes the result as SP3.
pub struct Pipeline<R> {
    reader: R,
    writer: Sp3Writer,
}

impl Pipeline<Sp3Reader> {
    pub fn sp3(config: WriterConfig) -> Self {
        Self::new(Sp3Reader, Sp3Writer::new(config))
    }
}

impl<R: OrbitReader> Pipeline<R> {
    pub fn new(reader: R, writer: Sp3Writer) -> Self {
        Self { reader, writer }
    }

    /// Read all inputs, in order.
    ///
    /// # Errors
    /// The first read error encountered.
    pub fn read_inputs<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<OrbitFile>> {
        paths
            .iter()
            .map(|p| {
                let path = p.as_ref();
                debug!(?path, "reading input");
                self.reader.read(path)
            })
            .collect()
    }

    /// Merge `satellite`, or the first object of the first file if not provided, from all
    /// `files`. Files are merged in order so later files take precedence.
    ///
    /// # Errors
    /// [Error::NoSatelliteData] if there is no object to merge or there are no samples for
    /// it, otherwise any error from [merge].
    pub fn merge_files(
        &self,
        files: &[OrbitFile],
        satellite: Option<&str>,
    ) -> Result<MergedEphemeris> {
        let object_id = match satellite {
            Some(id) => id.to_string(),
            None => select_object(files)?,
        };

        for file in files {
            match file.object(&object_id) {
                Some(object) => {
                    let summary = InputSummary::new(file, object);
                    info!(
                        input = %summary.name,
                        frame = %summary.frame,
                        epochs = summary.number_of_epochs,
                        samples = summary.samples,
                        start = ?summary.start.map(|t| t.to_string()),
                        end = ?summary.end.map(|t| t.to_string()),
                        "new ephemeris"
                    );
                }
                None => warn!(input = %file.name, %object_id, "object not in input"),
            }
        }

        let merged = merge(files.iter().flat_map(|f| f.objects.iter()), &object_id)?;
        let (Some(start), Some(end)) = (merged.start(), merged.stop()) else {
            return Err(Error::NoSatelliteData(format!("no samples for {object_id}")));
        };
        info!(
            %object_id,
            samples = merged.len(),
            %start,
            %end,
            "merged {} inputs",
            files.len()
        );

        Ok(merged)
    }

    /// Create `path` and write `merged` to it.
    ///
    /// # Errors
    /// [Error::Output] if the file cannot be created, otherwise any write error. A failed write
    /// may leave a partial file behind.
    pub fn write_output(&self, merged: &MergedEphemeris, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })?;
        let mut sink = BufWriter::new(file);
        self.writer.write(&mut sink, merged)?;
        sink.flush()?;
        Ok(())
    }

    /// Read, merge, and write according to `config`.
    ///
    /// # Errors
    /// Any error from reading, merging, or writing. Nothing is written unless all inputs were
    /// read and merged successfully.
    pub fn run(&self, config: &Config) -> Result<MergedEphemeris> {
        let files = self.read_inputs(&config.input_paths())?;
        let merged = self.merge_files(&files, config.satellite.as_deref())?;
        self.write_output(&merged, &config.output_file_name)?;
        info!(path = ?config.output_file_name, "wrote {}", merged.object_id);
        Ok(merged)
    }
}
