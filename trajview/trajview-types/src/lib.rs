//! Types shared between the trajectory playback engine and its host.
//!
//! [`Sample`] is one row of the per-condition input tables. The configuration
//! types ([`TrajviewConfig`] and friends) are deserialized from TOML and must
//! be validated with [`Validate::validate`] before use.

use serde::{Deserialize, Serialize};

mod config;
pub use config::{
    OutputConfig, PlaybackConfig, StreamConfig, StreamKind, TrajviewConfig, Valid, Validate,
    YAxis,
};

/// Errors found while validating a configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("no streams configured, at least one is required")]
    NoStreams,
    #[error("stream id must not be empty")]
    EmptyStreamId,
    #[error("duplicate stream id \"{0}\"")]
    DuplicateStreamId(String),
    #[error("stream \"{id}\" has zero-sized surface {width}x{height}")]
    EmptySurface { id: String, width: u32, height: u32 },
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("path \"{0}\" is not UTF8")]
    NonUtf8Path(String),
}

/// Identifier of one simulated insect, constant across its whole trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrajectoryId(pub i64);

impl std::fmt::Display for TrajectoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entity at one recorded time.
///
/// Positions live in the data square `[-1, 1] x [-1, 1]`. Any numeric field
/// other than `time` and `trajectory_id` may be `NaN` if the input could not
/// be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub trajectory_id: TrajectoryId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
}
