//! Precise orbit ephemeris merging.
//!
//! Reads one or more SP3 orbit files, merges the samples for a single object into a
//! time-ordered, duplicate free ephemeris, and writes the result as a new SP3 file.
//!
//! # Reference
//! The Extended Standard Product 3 Orbit Format (SP3-c), IGS.
//!
mod error;
mod merge;
mod pipeline;
mod reader;
mod sample;
mod time;
mod writer;

pub mod config;

pub use error::*;
pub use merge::*;
pub use pipeline::*;
pub use reader::*;
pub use sample::*;
pub use time::*;
pub use writer::*;
