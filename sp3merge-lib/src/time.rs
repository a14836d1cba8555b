use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

use hifitime::efmt::{Format, Formatter};
use hifitime::{Duration, Epoch, TimeScale};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Time systems that may appear in the `%c` header line of an SP3 file.
///
/// GLONASS and IRNSS system times have no counterpart in [TimeScale] and are not supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSystem {
    #[default]
    #[serde(rename = "GPS")]
    Gps,
    #[serde(rename = "GAL")]
    Galileo,
    #[serde(rename = "BDT")]
    BeiDou,
    #[serde(rename = "QZS")]
    Qzss,
    #[serde(rename = "UTC")]
    Utc,
    #[serde(rename = "TAI")]
    Tai,
}

impl TimeSystem {
    pub fn time_scale(&self) -> TimeScale {
        match self {
            // QZSS time is steered to GPS time
            Self::Gps | Self::Qzss => TimeScale::GPST,
            Self::Galileo => TimeScale::GST,
            Self::BeiDou => TimeScale::BDT,
            Self::Utc => TimeScale::UTC,
            Self::Tai => TimeScale::TAI,
        }
    }

    /// The 3 character tag used in SP3 headers.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Gps => "GPS",
            Self::Galileo => "GAL",
            Self::BeiDou => "BDT",
            Self::Qzss => "QZS",
            Self::Utc => "UTC",
            Self::Tai => "TAI",
        }
    }
}

impl FromStr for TimeSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "GPS" => Ok(Self::Gps),
            "GAL" => Ok(Self::Galileo),
            "BDT" => Ok(Self::BeiDou),
            "QZS" => Ok(Self::Qzss),
            "UTC" => Ok(Self::Utc),
            "TAI" => Ok(Self::Tai),
            other => Err(Error::UnsupportedTimeSystem(other.to_string())),
        }
    }
}

impl Display for TimeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Calendar breakdown of a [Time] in a specific time system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gregorian {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    /// Seconds of minute including the fractional part.
    pub second: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Time(Epoch);

impl AsRef<Epoch> for Time {
    fn as_ref(&self) -> &Epoch {
        &self.0
    }
}

impl Deref for Time {
    type Target = Epoch;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Time {
    pub fn from_epoch(epoch: Epoch) -> Self {
        Time(epoch)
    }

    /// Create [Time] from calendar fields expressed in `system`.
    ///
    /// `second` may carry a fraction which is kept to nanosecond resolution.
    ///
    /// # Errors
    /// If the fields do not form a valid date in the time system.
    pub fn from_gregorian(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: f64,
        system: TimeSystem,
    ) -> Result<Self> {
        if !(0.0..61.0).contains(&second) {
            return Err(Error::InvalidTime(format!("seconds out of range: {second}")));
        }
        let total_nanos = (second * 1e9).round() as u64;
        let whole = (total_nanos / 1_000_000_000) as u8;
        let nanos = (total_nanos % 1_000_000_000) as u32;

        Epoch::maybe_from_gregorian(
            year,
            month,
            day,
            hour,
            minute,
            whole,
            nanos,
            system.time_scale(),
        )
        .map(Time)
        .map_err(|e| {
            Error::InvalidTime(format!(
                "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second} {system}: {e}"
            ))
        })
    }

    /// Break this time down into calendar fields in `system`.
    ///
    /// # Errors
    /// If the calendar representation cannot be produced, e.g., for years hifitime cannot
    /// render.
    pub fn gregorian(&self, system: TimeSystem) -> Result<Gregorian> {
        let scale = system.time_scale();
        let text = self.format(system, "%Y %m %d %H %M %S")?;
        let fields = text
            .split_whitespace()
            .map(str::parse::<i32>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidTime(format!("{text}: {e}")))?;
        let [year, month, day, hour, minute, second] = fields[..] else {
            return Err(Error::InvalidTime(format!("unexpected calendar fields: {text}")));
        };
        let (month, day, hour, minute, second) = (
            month as u8,
            day as u8,
            hour as u8,
            minute as u8,
            second as u8,
        );

        // Whole second in the target scale; whatever remains is the sub-second part.
        let whole = Epoch::maybe_from_gregorian(year, month, day, hour, minute, second, 0, scale)
            .map_err(|e| Error::InvalidTime(format!("{text}: {e}")))?;
        let fraction = (self.0 - whole).to_seconds();

        Ok(Gregorian {
            year,
            month,
            day,
            hour,
            minute,
            second: f64::from(second) + fraction,
        })
    }

    /// Round to the nearest multiple of `precision`.
    #[must_use]
    pub fn rounded(&self, precision: Duration) -> Self {
        Time(self.0.round(precision))
    }

    /// Format ourself in `system` using the provided format string.
    ///
    /// See [hifitime::efmt::Format].
    pub fn format(&self, system: TimeSystem, fmt: &str) -> Result<String> {
        let fmt = Format::from_str(fmt).map_err(|e| Error::InvalidTime(format!("{fmt}: {e}")))?;
        let formatter = Formatter::to_time_scale(self.0, fmt, system.time_scale());
        Ok(format!("{formatter}"))
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gregorian_whole_seconds() {
        let time = Time::from_gregorian(2014, 1, 4, 21, 56, 0.0, TimeSystem::Gps).unwrap();
        let zult = time.gregorian(TimeSystem::Gps).unwrap();

        assert_eq!(
            zult,
            Gregorian {
                year: 2014,
                month: 1,
                day: 4,
                hour: 21,
                minute: 56,
                second: 0.0,
            }
        );
    }

    #[test]
    fn test_gregorian_fractional_seconds() {
        let time = Time::from_gregorian(2023, 12, 31, 23, 59, 59.125, TimeSystem::Utc).unwrap();
        let zult = time.gregorian(TimeSystem::Utc).unwrap();

        assert_eq!((zult.year, zult.month, zult.day), (2023, 12, 31));
        assert_eq!((zult.hour, zult.minute), (23, 59));
        assert!((zult.second - 59.125).abs() < 1e-9, "got {}", zult.second);
    }

    #[test]
    fn test_from_gregorian_invalid() {
        assert!(Time::from_gregorian(2023, 13, 1, 0, 0, 0.0, TimeSystem::Gps).is_err());
        assert!(Time::from_gregorian(2023, 1, 1, 0, 0, 75.0, TimeSystem::Gps).is_err());
    }

    #[test]
    fn test_rounded_carries_into_minute() {
        let time = Time::from_gregorian(2023, 3, 14, 12, 5, 59.999_999_999, TimeSystem::Gps)
            .unwrap()
            .rounded(Duration::from_parts(0, 10));
        let zult = time.gregorian(TimeSystem::Gps).unwrap();

        assert_eq!((zult.hour, zult.minute), (12, 6));
        assert!(zult.second.abs() < 1e-9, "got {}", zult.second);
    }

    #[test]
    fn test_ordering() {
        let t0 = Time::from_gregorian(2020, 6, 1, 0, 0, 0.0, TimeSystem::Gps).unwrap();
        let t1 = Time::from_gregorian(2020, 6, 1, 0, 0, 0.5, TimeSystem::Gps).unwrap();

        assert!(t0 < t1);
        assert_eq!(
            t0,
            Time::from_gregorian(2020, 6, 1, 0, 0, 0.0, TimeSystem::Gps).unwrap()
        );
    }

    #[test]
    fn test_time_system_tags() {
        for tag in ["GPS", "GAL", "BDT", "QZS", "UTC", "TAI"] {
            let system = TimeSystem::from_str(tag).unwrap();
            assert_eq!(system.tag(), tag);
        }
        assert!(matches!(
            TimeSystem::from_str("GLO"),
            Err(Error::UnsupportedTimeSystem(_))
        ));
    }
}
