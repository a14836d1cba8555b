//! The fixed 22 line SP3 header.
//!
//! None of the header content is derived from the ephemeris other than the object id. All
//! descriptive fields come from [HeaderConfig], whose defaults produce the same header the
//! merger has always written.
use serde::{Deserialize, Serialize};

use super::RecordConfig;
use crate::error::{Error, Result};

/// Number of lines produced by [header_lines].
pub const HEADER_LINES: usize = 22;

/// Satellite id slots per `+` and `++` line.
const SLOTS_PER_LINE: usize = 17;

/// Descriptive header fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderConfig {
    /// Format version character, e.g., `c` for SP3-c.
    pub version: String,
    /// Pre-rendered first epoch, `YYYY MM DD hh mm ss.ssssssss` in SP3 columns.
    pub start_epoch: String,
    pub number_of_epochs: u32,
    pub data_used: String,
    pub coordinate_system: String,
    pub orbit_type: String,
    pub agency: String,
    pub gps_week: u32,
    pub seconds_of_week: f64,
    pub epoch_interval: f64,
    pub mjd: u32,
    pub fractional_day: f64,
    pub file_type: String,
    pub time_system: String,
    pub base_pos_vel: f64,
    pub base_clock: f64,
    /// Exactly 4 comment lines, written after the `/* ` marker.
    pub comments: [String; 4],
}

impl Default for HeaderConfig {
    fn default() -> Self {
        let filler = "C".repeat(57);
        Self {
            version: "c".to_string(),
            start_epoch: "2014  1  4 21 56  0.00000000".to_string(),
            number_of_epochs: 30413,
            data_used: "ORBIT".to_string(),
            coordinate_system: "ITRF".to_string(),
            orbit_type: "FIT".to_string(),
            agency: "CNES".to_string(),
            gps_week: 1773,
            seconds_of_week: 597_360.0,
            epoch_interval: 60.0,
            mjd: 56661,
            fractional_day: 0.913_888_888_888_9,
            file_type: "L".to_string(),
            time_system: "TAI".to_string(),
            base_pos_vel: 1.25,
            base_clock: 1.025,
            comments: [filler.clone(), filler.clone(), filler.clone(), filler],
        }
    }
}

impl HeaderConfig {
    /// Verify all fields fit their fixed columns.
    ///
    /// # Errors
    /// [Error::ConfigInvalid] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.version.chars().count() != 1 {
            return Err(Error::ConfigInvalid(format!(
                "header version must be a single character, got {:?}",
                self.version
            )));
        }
        if self.start_epoch.len() != 28 {
            return Err(Error::ConfigInvalid(format!(
                "header startEpoch must be 28 characters, got {:?}",
                self.start_epoch
            )));
        }
        for (name, value, width) in [
            ("dataUsed", &self.data_used, 5),
            ("coordinateSystem", &self.coordinate_system, 5),
            ("orbitType", &self.orbit_type, 3),
            ("agency", &self.agency, 4),
            ("fileType", &self.file_type, 2),
            ("timeSystem", &self.time_system, 3),
        ] {
            if value.len() > width {
                return Err(Error::ConfigInvalid(format!(
                    "header {name} {value:?} is wider than {width} columns"
                )));
            }
        }
        for (name, value, max) in [
            ("numberOfEpochs", self.number_of_epochs, 9_999_999),
            ("gpsWeek", self.gps_week, 9_999),
            ("mjd", self.mjd, 99_999),
        ] {
            if value > max {
                return Err(Error::ConfigInvalid(format!(
                    "header {name} {value} is greater than {max}"
                )));
            }
        }
        for (name, value, rendered, width) in [
            (
                "secondsOfWeek",
                self.seconds_of_week,
                format!("{:15.8}", self.seconds_of_week),
                15,
            ),
            (
                "epochInterval",
                self.epoch_interval,
                format!("{:14.8}", self.epoch_interval),
                14,
            ),
            (
                "fractionalDay",
                self.fractional_day,
                format!("{:15.13}", self.fractional_day),
                15,
            ),
            (
                "basePosVel",
                self.base_pos_vel,
                format!("{:10.7}", self.base_pos_vel),
                10,
            ),
            (
                "baseClock",
                self.base_clock,
                format!("{:12.9}", self.base_clock),
                12,
            ),
        ] {
            // width is checked on the rendered text so rounding up is caught too
            if !value.is_finite() || value < 0.0 || rendered.len() > width {
                return Err(Error::ConfigInvalid(format!(
                    "header {name} {value} does not fit {width} columns"
                )));
            }
        }
        if !format!("{:.13}", self.fractional_day).starts_with("0.") {
            return Err(Error::ConfigInvalid(format!(
                "header fractionalDay {} must be less than 1",
                self.fractional_day
            )));
        }
        for comment in &self.comments {
            if comment.len() > 57 {
                return Err(Error::ConfigInvalid(format!(
                    "header comment longer than 57 columns: {comment:?}"
                )));
            }
        }
        Ok(())
    }
}

fn zeros(count: usize) -> String {
    "  0".repeat(count)
}

fn first_line(hdr: &HeaderConfig, velocities: bool) -> String {
    format!(
        "#{}{}{} {:>7} {:<5} {:<5} {:<3} {:<4}",
        hdr.version,
        if velocities { 'V' } else { 'P' },
        hdr.start_epoch,
        hdr.number_of_epochs,
        hdr.data_used,
        hdr.coordinate_system,
        hdr.orbit_type,
        hdr.agency,
    )
}

fn second_line(hdr: &HeaderConfig) -> String {
    format!(
        "## {:4} {:15.8} {:14.8} {:5} {:15.13}",
        hdr.gps_week, hdr.seconds_of_week, hdr.epoch_interval, hdr.mjd, hdr.fractional_day,
    )
}

// Only one satellite is ever written, the rest of the slots are zero.
fn satellite_line(records: &RecordConfig, object_id: &str) -> String {
    format!(
        "+    1   {}{}{}",
        records.satellite_marker,
        object_id,
        zeros(SLOTS_PER_LINE - 1)
    )
}

fn empty_satellite_line() -> String {
    format!("+        {}", zeros(SLOTS_PER_LINE))
}

fn blank_accuracy_line() -> String {
    "++".to_string()
}

fn zero_accuracy_line() -> String {
    format!("++       {}", zeros(SLOTS_PER_LINE))
}

fn file_type_line(hdr: &HeaderConfig) -> String {
    format!(
        "%c {:<2} cc {:<3} ccc cccc cccc cccc cccc ccccc ccccc ccccc ccccc",
        hdr.file_type, hdr.time_system
    )
}

fn second_type_line() -> String {
    "%c cc cc ccc ccc cccc cccc cccc cccc ccccc ccccc ccccc ccccc".to_string()
}

fn base_line(hdr: &HeaderConfig) -> String {
    format!(
        "%f {:10.7} {:12.9}  0.00000000000  0.000000000000000",
        hdr.base_pos_vel, hdr.base_clock
    )
}

fn zero_base_line() -> String {
    "%f  0.0000000  0.000000000  0.00000000000  0.000000000000000".to_string()
}

fn int_line() -> String {
    "%i    0    0    0    0      0      0      0      0         0".to_string()
}

fn comment_line(comment: &str) -> String {
    format!("/* {comment}")
}

/// Render all header lines, without line terminators, in file order.
///
/// `velocities` selects the `V` (position and velocity) or `P` (position only) flag on the
/// first line.
pub fn header_lines(
    hdr: &HeaderConfig,
    records: &RecordConfig,
    object_id: &str,
    velocities: bool,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(HEADER_LINES);
    lines.push(first_line(hdr, velocities));
    lines.push(second_line(hdr));
    lines.push(satellite_line(records, object_id));
    lines.extend(std::iter::repeat_with(empty_satellite_line).take(4));
    lines.extend(std::iter::repeat_with(blank_accuracy_line).take(2));
    lines.extend(std::iter::repeat_with(zero_accuracy_line).take(3));
    lines.push(file_type_line(hdr));
    lines.push(second_type_line());
    lines.push(base_line(hdr));
    lines.push(zero_base_line());
    lines.extend(std::iter::repeat_with(int_line).take(2));
    lines.extend(hdr.comments.iter().map(|c| comment_line(c)));
    lines
}
