use std::path::PathBuf;

use crate::time::TimeSystem;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Config invalid: {0}")]
    ConfigInvalid(String),
    #[error("Failed to load config: {}", .source)]
    ConfigLoad {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("cannot read input {path:?}: {source}")]
    InputAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{name}:{line}: {msg}")]
    Parse {
        name: String,
        line: usize,
        msg: String,
    },

    #[error("invalid time: {0}")]
    InvalidTime(String),
    #[error("unsupported time system {0:?}")]
    UnsupportedTimeSystem(String),

    #[error("object {0} not found in any input")]
    ObjectNotFound(String),
    #[error("no satellite data: {0}")]
    NoSatelliteData(String),
    #[error("inconsistent frame for {object_id}: expected {expected}, found {found}")]
    InconsistentFrame {
        object_id: String,
        expected: String,
        found: String,
    },
    #[error("inconsistent time system for {object_id}: expected {expected}, found {found}")]
    InconsistentTimeSystem {
        object_id: String,
        expected: TimeSystem,
        found: TimeSystem,
    },

    #[error("sample at {0} has no velocity")]
    MissingVelocity(String),
    #[error("cannot create output {path:?}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
