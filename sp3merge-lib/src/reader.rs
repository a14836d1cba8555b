//! Minimal SP3 reader.
//!
//! Reads the header fields needed for merging along with position and velocity records. Clock
//! values, accuracy codes, and correlation records are ignored.
//!
//! # Reference
//! <https://files.igs.org/pub/data/format/sp3d.pdf>
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    ops::Range,
    path::Path,
    str::FromStr,
};

use flate2::read::MultiGzDecoder;
use lazy_static::lazy_static;
use nalgebra::Vector3;
use regex::Regex;
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    sample::{ObjectEphemeris, Sample},
    time::{Time, TimeSystem},
};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Unix `compress` (`.Z`)
const COMPRESS_MAGIC: [u8; 2] = [0x1f, 0x9d];

lazy_static! {
    static ref EPOCH_LINE: Regex = Regex::new(
        r"^\*\s+(\d{4})\s+(\d{1,2})\s+(\d{1,2})\s+(\d{1,2})\s+(\d{1,2})\s+(\d{1,2}(?:\.\d*)?)"
    )
    .expect("epoch line regex is valid");
}

/// A parsed orbit file.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitFile {
    /// Name used in diagnostics, typically the path.
    pub name: String,
    pub version: char,
    pub coordinate_system: String,
    pub agency: String,
    pub time_system: TimeSystem,
    /// Number of epochs declared in the header.
    pub number_of_epochs: usize,
    /// One entry per satellite in header order.
    pub objects: Vec<ObjectEphemeris>,
}

impl OrbitFile {
    pub fn object(&self, object_id: &str) -> Option<&ObjectEphemeris> {
        self.objects.iter().find(|o| o.object_id == object_id)
    }
}

/// Source of parsed orbit files.
pub trait OrbitReader {
    /// # Errors
    /// [Error::InputAccess] if `path` cannot be read, or [Error::Parse] for invalid content.
    fn read(&self, path: &Path) -> Result<OrbitFile>;
}

/// Reads SP3-a/b/c/d files, optionally gzip compressed. Unix compress (`.Z`) is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sp3Reader;

impl OrbitReader for Sp3Reader {
    fn read(&self, path: &Path) -> Result<OrbitFile> {
        let access = |source| Error::InputAccess {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = BufReader::new(File::open(path).map_err(access)?);
        let head = reader.fill_buf().map_err(access)?;
        let compressed = head.starts_with(&GZIP_MAGIC);

        let name = path.display().to_string();
        if head.starts_with(&COMPRESS_MAGIC) {
            return Err(Error::Parse {
                name,
                line: 0,
                msg: "unix compress (.Z) input is not supported; decompress it first".to_string(),
            });
        }
        if compressed {
            debug!(?path, "reading gzip compressed input");
            self.parse(BufReader::new(MultiGzDecoder::new(reader)), &name)
        } else {
            self.parse(reader, &name)
        }
    }
}

impl Sp3Reader {
    /// Parse SP3 content from `reader`. `name` is only used for error messages.
    ///
    /// # Errors
    /// [Error::InputAccess] on read errors, [Error::Parse] on invalid content.
    pub fn parse<R: BufRead>(&self, reader: R, name: &str) -> Result<OrbitFile> {
        let mut parser = Parser::new(name);
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| Error::InputAccess {
                path: name.into(),
                source,
            })?;
            parser.line = idx + 1;
            if !parser.feed(&line)? {
                break;
            }
        }
        parser.finish()
    }
}

/// Field at the 0-based column range, or empty if the line is too short.
fn field(line: &str, cols: Range<usize>) -> &str {
    let end = cols.end.min(line.len());
    line.get(cols.start..end).unwrap_or_default()
}

struct Parser {
    name: String,
    line: usize,

    version: Option<char>,
    coordinate_system: String,
    agency: String,
    number_of_epochs: usize,
    time_system: Option<TimeSystem>,
    satellite_count: Option<usize>,
    satellite_ids: Vec<String>,

    objects: Vec<ObjectEphemeris>,
    // Maps satellite id to index in objects
    index: HashMap<String, usize>,
    epoch: Option<Time>,
}

impl Parser {
    fn new(name: &str) -> Self {
        Parser {
            name: name.to_string(),
            line: 0,
            version: None,
            coordinate_system: String::default(),
            agency: String::default(),
            number_of_epochs: 0,
            time_system: None,
            satellite_count: None,
            satellite_ids: Vec::default(),
            objects: Vec::default(),
            index: HashMap::default(),
            epoch: None,
        }
    }

    fn error<S: Into<String>>(&self, msg: S) -> Error {
        Error::Parse {
            name: self.name.clone(),
            line: self.line,
            msg: msg.into(),
        }
    }

    fn time_system(&self) -> TimeSystem {
        self.time_system.unwrap_or_default()
    }

    /// Handle a single line, returning false once the end of file marker is reached.
    fn feed(&mut self, line: &str) -> Result<bool> {
        if self.line == 1 {
            self.first_line(line)?;
            return Ok(true);
        }
        if line.starts_with("EOF") {
            return Ok(false);
        }

        if line.starts_with("++")
            || line.starts_with("##")
            || line.starts_with("%f")
            || line.starts_with("%i")
            || line.starts_with("/*")
            || line.starts_with("EP")
            || line.starts_with("EV")
            || line.trim().is_empty()
        {
            trace!(line = self.line, "skipping");
        } else if line.starts_with('+') {
            self.satellite_line(line)?;
        } else if line.starts_with("%c") {
            self.time_system_line(line)?;
        } else if line.starts_with('*') {
            self.epoch_line(line)?;
        } else if line.starts_with('P') {
            self.position_line(line)?;
        } else if line.starts_with('V') {
            self.velocity_line(line)?;
        } else {
            return Err(self.error(format!("unexpected record: {line:?}")));
        }
        Ok(true)
    }

    fn first_line(&mut self, line: &str) -> Result<()> {
        let mut chars = line.chars();
        if chars.next() != Some('#') {
            return Err(self.error("not an SP3 file; first line must start with '#'"));
        }
        let version = chars
            .next()
            .ok_or_else(|| self.error("missing format version"))?;
        self.version = Some(version);

        let epochs = field(line, 32..39).trim();
        self.number_of_epochs = epochs
            .parse()
            .map_err(|_| self.error(format!("invalid number of epochs {epochs:?}")))?;
        self.coordinate_system = field(line, 46..51).trim().to_string();
        self.agency = field(line, 56..60).trim().to_string();
        Ok(())
    }

    fn satellite_line(&mut self, line: &str) -> Result<()> {
        if self.satellite_count.is_none() {
            let count = field(line, 3..6).trim();
            self.satellite_count = Some(
                count
                    .parse()
                    .map_err(|_| self.error(format!("invalid satellite count {count:?}")))?,
            );
        }
        let count = self.satellite_count.unwrap_or_default();
        let ids = field(line, 9..60);
        for chunk in ids.as_bytes().chunks(3) {
            if self.satellite_ids.len() >= count {
                break;
            }
            let id = String::from_utf8_lossy(chunk).trim().to_string();
            if id.is_empty() || id.chars().all(|c| c == '0') {
                continue;
            }
            self.satellite_ids.push(id);
        }
        Ok(())
    }

    // Only the first %c line carries the time system
    fn time_system_line(&mut self, line: &str) -> Result<()> {
        if self.time_system.is_some() {
            return Ok(());
        }
        let tag = field(line, 9..12).trim();
        let system = if tag.is_empty() || tag == "ccc" {
            TimeSystem::Gps
        } else {
            TimeSystem::from_str(tag).map_err(|e| self.error(e.to_string()))?
        };
        self.time_system = Some(system);
        Ok(())
    }

    fn epoch_line(&mut self, line: &str) -> Result<()> {
        if self.objects.is_empty() && !self.satellite_ids.is_empty() {
            self.init_objects();
        }
        let caps = EPOCH_LINE
            .captures(line)
            .ok_or_else(|| self.error(format!("invalid epoch line {line:?}")))?;
        let num = |idx: usize| -> Result<u8> {
            caps[idx]
                .parse()
                .map_err(|_| self.error(format!("invalid epoch field {:?}", &caps[idx])))
        };
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| self.error(format!("invalid year {:?}", &caps[1])))?;
        let second: f64 = caps[6]
            .parse()
            .map_err(|_| self.error(format!("invalid seconds {:?}", &caps[6])))?;
        let time = Time::from_gregorian(
            year,
            num(2)?,
            num(3)?,
            num(4)?,
            num(5)?,
            second,
            self.time_system(),
        )
        .map_err(|e| self.error(e.to_string()))?;
        self.epoch = Some(time);
        Ok(())
    }

    fn init_objects(&mut self) {
        let frame = self.coordinate_system.clone();
        let system = self.time_system();
        for (idx, id) in self.satellite_ids.iter().enumerate() {
            self.objects.push(ObjectEphemeris::new(id, &frame, system));
            self.index.insert(id.clone(), idx);
        }
    }

    /// Satellite id, and x, y, z values from a position or velocity line.
    fn state_line(&self, line: &str) -> Result<(usize, Time, Vector3<f64>)> {
        let epoch = self
            .epoch
            .ok_or_else(|| self.error("state record before any epoch"))?;
        let id = field(line, 1..4).trim();
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| self.error(format!("satellite {id:?} not in header")))?;
        let mut values = [0.0; 3];
        for (i, value) in values.iter_mut().enumerate() {
            let start = 4 + i * 14;
            let text = field(line, start..start + 14).trim();
            *value = text
                .parse()
                .map_err(|_| self.error(format!("invalid value {text:?}")))?;
        }
        Ok((idx, epoch, Vector3::from(values)))
    }

    fn position_line(&mut self, line: &str) -> Result<()> {
        let (idx, time, km) = self.state_line(line)?;
        // All zero position means bad or absent
        if km == Vector3::zeros() {
            debug!(line = self.line, "skipping absent position");
            return Ok(());
        }
        self.objects[idx]
            .samples
            .push(Sample::new(time, km * 1000.0));
        Ok(())
    }

    fn velocity_line(&mut self, line: &str) -> Result<()> {
        let (idx, time, dms) = self.state_line(line)?;
        match self.objects[idx].samples.last_mut() {
            Some(sample) if sample.time == time => sample.velocity = Some(dms / 10.0),
            _ => debug!(line = self.line, "velocity without position; skipping"),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<OrbitFile> {
        let version = self.version.ok_or_else(|| self.error("empty input"))?;
        if self.objects.is_empty() {
            self.init_objects();
        }
        Ok(OrbitFile {
            name: self.name,
            version,
            coordinate_system: self.coordinate_system,
            agency: self.agency,
            time_system: self.time_system.unwrap_or_default(),
            number_of_epochs: self.number_of_epochs,
            objects: self.objects,
        })
    }
}
