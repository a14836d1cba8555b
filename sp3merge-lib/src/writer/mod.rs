mod header;

use std::io::Write;

use hifitime::Duration;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sample::{MergedEphemeris, Sample},
    time::TimeSystem,
};

pub use header::{header_lines, HeaderConfig, HEADER_LINES};

/// Written after the last record.
pub const END_OF_FILE: &str = "EOF";

/// Record markers and placeholders used in the body of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordConfig {
    pub epoch_marker: String,
    pub position_marker: String,
    pub velocity_marker: String,
    /// Written before the object id in the header satellite list.
    pub satellite_marker: String,
    /// Clock field value meaning "no clock provided".
    pub clock_placeholder: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            epoch_marker: "*  ".to_string(),
            position_marker: "PL".to_string(),
            velocity_marker: "VL".to_string(),
            satellite_marker: "L".to_string(),
            clock_placeholder: "999999.999999".to_string(),
        }
    }
}

/// What to do with samples that have no velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingVelocity {
    /// Write a velocity record with all components zero.
    #[default]
    Zero,
    /// Do not write a velocity record for the sample. The header is flagged position only
    /// (`P`) when any sample lacks velocity.
    Omit,
    /// Fail before writing anything.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriterConfig {
    pub header: HeaderConfig,
    pub records: RecordConfig,
    pub missing_velocity: MissingVelocity,
}

impl WriterConfig {
    /// # Errors
    /// [Error::ConfigInvalid] if any header field does not fit its columns.
    pub fn validate(&self) -> Result<()> {
        self.header.validate()
    }
}

/// Writes a [MergedEphemeris] as an SP3 file.
#[derive(Debug, Clone, Default)]
pub struct Sp3Writer {
    config: WriterConfig,
}

impl Sp3Writer {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write the header, one record block per sample, and the end of file marker.
    ///
    /// # Errors
    /// [Error::MissingVelocity] if configured to reject samples without velocity, in which case
    /// nothing is written. Otherwise, any error writing to `sink`. Nothing is done to clean up
    /// a partially written sink.
    pub fn write<W: Write>(&self, mut sink: W, ephemeris: &MergedEphemeris) -> Result<()> {
        if self.config.missing_velocity == MissingVelocity::Reject {
            if let Some(sample) = ephemeris.samples.iter().find(|s| s.velocity.is_none()) {
                return Err(Error::MissingVelocity(sample.time.to_string()));
            }
        }

        let velocities = self.config.missing_velocity != MissingVelocity::Omit
            || ephemeris.samples.iter().all(|s| s.velocity.is_some());
        self.write_header(&mut sink, &ephemeris.object_id, velocities)?;
        for sample in &ephemeris.samples {
            self.write_record(
                &mut sink,
                &ephemeris.object_id,
                ephemeris.time_system,
                sample,
            )?;
        }
        self.write_end_of_file(&mut sink)
    }

    fn write_header<W: Write>(
        &self,
        sink: &mut W,
        object_id: &str,
        velocities: bool,
    ) -> Result<()> {
        let (hdr, records) = (&self.config.header, &self.config.records);
        for line in header_lines(hdr, records, object_id, velocities) {
            writeln!(sink, "{line}")?;
        }
        Ok(())
    }

    /// Write the epoch, position, and velocity lines for a single sample.
    fn write_record<W: Write>(
        &self,
        sink: &mut W,
        object_id: &str,
        system: TimeSystem,
        sample: &Sample,
    ) -> Result<()> {
        let records = &self.config.records;
        // Rounded to the 8 decimals written so the seconds never render as 60
        let cal = sample
            .time
            .rounded(Duration::from_parts(0, 10))
            .gregorian(system)?;
        writeln!(
            sink,
            "{}{:4} {:2} {:2} {:2} {:2} {:11.8}",
            records.epoch_marker, cal.year, cal.month, cal.day, cal.hour, cal.minute, cal.second
        )?;

        // km
        write_vector(
            sink,
            &records.position_marker,
            object_id,
            &(sample.position / 1000.0),
            &records.clock_placeholder,
        )?;

        // dm/s
        let velocity = match (sample.velocity, self.config.missing_velocity) {
            (Some(v), _) => Some(v * 10.0),
            (None, MissingVelocity::Zero) => Some(Vector3::zeros()),
            (None, _) => None,
        };
        if let Some(velocity) = velocity {
            write_vector(
                sink,
                &records.velocity_marker,
                object_id,
                &velocity,
                &records.clock_placeholder,
            )?;
        }

        Ok(())
    }

    fn write_end_of_file<W: Write>(&self, sink: &mut W) -> Result<()> {
        writeln!(sink, "{END_OF_FILE}")?;
        Ok(())
    }
}

fn write_vector<W: Write>(
    sink: &mut W,
    marker: &str,
    object_id: &str,
    values: &Vector3<f64>,
    clock: &str,
) -> std::io::Result<()> {
    write!(sink, "{marker}{object_id}")?;
    for value in values.iter() {
        write!(sink, "{value:14.6}")?;
    }
    writeln!(sink, " {clock}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;

    fn sample(second: f64, pos: [f64; 3], vel: Option<[f64; 3]>) -> Sample {
        let time = Time::from_gregorian(2023, 3, 14, 12, 5, second, TimeSystem::Gps).unwrap();
        let sample = Sample::new(time, Vector3::from(pos));
        match vel {
            Some(v) => sample.with_velocity(Vector3::from(v)),
            None => sample,
        }
    }

    fn ephemeris(samples: Vec<Sample>) -> MergedEphemeris {
        MergedEphemeris {
            object_id: "51".to_string(),
            frame: "ITRF".to_string(),
            time_system: TimeSystem::Gps,
            samples,
        }
    }

    fn render(writer: &Sp3Writer, eph: &MergedEphemeris) -> String {
        let mut buf: Vec<u8> = Vec::default();
        writer.write(&mut buf, eph).expect("write failed");
        String::from_utf8(buf).unwrap()
    }

    mod records {
        use super::*;

        #[test]
        fn record_layout() {
            let eph = ephemeris(vec![sample(
                12.5,
                [1_234_567.891, -7_654_321.0, 42.0],
                Some([1234.5678, -0.25, 0.0]),
            )]);

            let text = render(&Sp3Writer::default(), &eph);
            let lines: Vec<&str> = text.lines().collect();

            assert_eq!(lines[HEADER_LINES], "*  2023  3 14 12  5 12.50000000");
            assert_eq!(
                lines[HEADER_LINES + 1],
                "PL51   1234.567891  -7654.321000      0.042000 999999.999999"
            );
            assert_eq!(
                lines[HEADER_LINES + 2],
                "VL51  12345.678000     -2.500000      0.000000 999999.999999"
            );
        }

        #[test]
        fn seconds_round_into_next_minute() {
            let eph = ephemeris(vec![
                sample(59.999_999_999, [1.0; 3], Some([1.0; 3])),
                sample(12.123_456_784, [1.0; 3], Some([1.0; 3])),
            ]);

            let text = render(&Sp3Writer::default(), &eph);
            let lines: Vec<&str> = text.lines().collect();

            assert_eq!(lines[HEADER_LINES], "*  2023  3 14 12  6  0.00000000");
            assert_eq!(lines[HEADER_LINES + 3], "*  2023  3 14 12  5 12.12345678");
        }

        #[test]
        fn scaling() {
            let position = [6_378_137.123_456, -1.0, 0.5];
            let velocity = [-3_987.654_321, 0.001, 7.5];
            let eph = ephemeris(vec![sample(0.0, position, Some(velocity))]);

            let text = render(&Sp3Writer::default(), &eph);
            let lines: Vec<&str> = text.lines().collect();

            let fields = |line: &str| -> Vec<f64> {
                line[4..46]
                    .as_bytes()
                    .chunks(14)
                    .map(|c| std::str::from_utf8(c).unwrap().trim().parse().unwrap())
                    .collect()
            };
            let km = fields(lines[HEADER_LINES + 1]);
            let dms = fields(lines[HEADER_LINES + 2]);
            for idx in 0..3 {
                assert!((km[idx] - position[idx] / 1000.0).abs() <= 5e-7, "{km:?}");
                assert!((dms[idx] - velocity[idx] * 10.0).abs() <= 5e-7, "{dms:?}");
            }
        }

        #[test]
        fn configured_markers() {
            let config = WriterConfig {
                records: RecordConfig {
                    position_marker: "P".to_string(),
                    velocity_marker: "V".to_string(),
                    ..RecordConfig::default()
                },
                ..WriterConfig::default()
            };
            let mut eph = ephemeris(vec![sample(0.0, [1.0; 3], Some([1.0; 3]))]);
            eph.object_id = "L51".to_string();

            let text = render(&Sp3Writer::new(config), &eph);
            let lines: Vec<&str> = text.lines().collect();

            assert!(lines[HEADER_LINES + 1].starts_with("PL51 "));
            assert!(lines[HEADER_LINES + 2].starts_with("VL51 "));
        }
    }

    mod structure {
        use super::*;

        #[test]
        fn line_count() {
            let samples = (0..5)
                .map(|s| sample(f64::from(s), [1.0; 3], Some([1.0; 3])))
                .collect();
            let text = render(&Sp3Writer::default(), &ephemeris(samples));
            let lines: Vec<&str> = text.lines().collect();

            assert_eq!(lines.len(), HEADER_LINES + 3 * 5 + 1);
            assert_eq!(*lines.last().unwrap(), END_OF_FILE);
        }

        #[test]
        fn empty_ephemeris() {
            let text = render(&Sp3Writer::default(), &ephemeris(vec![]));

            assert_eq!(text.lines().count(), HEADER_LINES + 1);
            assert!(text.ends_with("EOF\n"));
        }

        #[test]
        fn no_comma_decimal_separator() {
            let eph = ephemeris(vec![sample(
                1.25,
                [1.5e6, -2.25e6, 3.125e6],
                Some([-1.5, 2.5, -3.5]),
            )]);
            let text = render(&Sp3Writer::default(), &eph);

            for line in text.lines().skip(HEADER_LINES) {
                assert!(!line.contains(','), "comma in {line:?}");
            }
        }
    }

    mod missing_velocity {
        use super::*;

        fn writer(policy: MissingVelocity) -> Sp3Writer {
            Sp3Writer::new(WriterConfig {
                missing_velocity: policy,
                ..WriterConfig::default()
            })
        }

        #[test]
        fn zero() {
            let eph = ephemeris(vec![sample(0.0, [1.0; 3], None)]);
            let text = render(&writer(MissingVelocity::Zero), &eph);
            let lines: Vec<&str> = text.lines().collect();

            assert_eq!(lines.len(), HEADER_LINES + 3 + 1);
            assert_eq!(
                lines[HEADER_LINES + 2],
                "VL51      0.000000      0.000000      0.000000 999999.999999"
            );
        }

        #[test]
        fn omit() {
            let eph = ephemeris(vec![
                sample(0.0, [1.0; 3], None),
                sample(1.0, [1.0; 3], Some([1.0; 3])),
            ]);
            let text = render(&writer(MissingVelocity::Omit), &eph);
            let lines: Vec<&str> = text.lines().collect();

            assert_eq!(lines.len(), HEADER_LINES + 2 + 3 + 1);
            assert!(lines[HEADER_LINES + 2].starts_with('*'));
        }

        #[test]
        fn omit_flags_position_only() {
            let eph = ephemeris(vec![sample(0.0, [1.0; 3], None)]);

            let text = render(&writer(MissingVelocity::Omit), &eph);
            assert!(text.starts_with("#cP"), "{}", &text[..3]);

            let eph = ephemeris(vec![sample(0.0, [1.0; 3], Some([1.0; 3]))]);
            let text = render(&writer(MissingVelocity::Omit), &eph);
            assert!(text.starts_with("#cV"), "{}", &text[..3]);

            let eph = ephemeris(vec![sample(0.0, [1.0; 3], None)]);
            let text = render(&writer(MissingVelocity::Zero), &eph);
            assert!(text.starts_with("#cV"), "{}", &text[..3]);
        }

        #[test]
        fn reject() {
            let eph = ephemeris(vec![
                sample(0.0, [1.0; 3], Some([1.0; 3])),
                sample(1.0, [1.0; 3], None),
            ]);
            let mut buf: Vec<u8> = Vec::default();

            let zult = writer(MissingVelocity::Reject).write(&mut buf, &eph);

            assert!(matches!(zult, Err(Error::MissingVelocity(_))));
            assert!(buf.is_empty(), "nothing should be written");
        }
    }

    #[test]
    fn write_error_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let zult = Sp3Writer::default().write(Broken, &ephemeris(vec![]));

        assert!(matches!(zult, Err(Error::Io(_))));
    }
}
