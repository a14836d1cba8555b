use nalgebra::Vector3;

use crate::time::{Time, TimeSystem};

/// A single state for an object at one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: Time,
    /// Position in meters.
    pub position: Vector3<f64>,
    /// Velocity in meters/second, if the source provided one.
    pub velocity: Option<Vector3<f64>>,
}

impl Sample {
    pub fn new(time: Time, position: Vector3<f64>) -> Self {
        Self {
            time,
            position,
            velocity: None,
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

/// All samples for one object from a single source.
///
/// All samples share the same frame and time system.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEphemeris {
    pub object_id: String,
    pub frame: String,
    pub time_system: TimeSystem,
    pub samples: Vec<Sample>,
}

impl ObjectEphemeris {
    pub fn new(object_id: &str, frame: &str, time_system: TimeSystem) -> Self {
        Self {
            object_id: object_id.to_string(),
            frame: frame.to_string(),
            time_system,
            samples: Vec::default(),
        }
    }

    /// Earliest sample time. Samples need not be sorted.
    pub fn start(&self) -> Option<Time> {
        self.samples.iter().map(|s| s.time).min()
    }

    /// Latest sample time. Samples need not be sorted.
    pub fn stop(&self) -> Option<Time> {
        self.samples.iter().map(|s| s.time).max()
    }
}

/// Result of merging several [ObjectEphemeris] for the same object.
///
/// Samples are strictly increasing in time.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEphemeris {
    pub object_id: String,
    pub frame: String,
    pub time_system: TimeSystem,
    pub samples: Vec<Sample>,
}

impl MergedEphemeris {
    pub fn empty(object_id: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            frame: String::default(),
            time_system: TimeSystem::default(),
            samples: Vec::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn start(&self) -> Option<Time> {
        self.samples.first().map(|s| s.time)
    }

    pub fn stop(&self) -> Option<Time> {
        self.samples.last().map(|s| s.time)
    }
}
