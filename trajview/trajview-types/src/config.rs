use std::{collections::BTreeSet, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

type Result<T> = std::result::Result<T, ConfigError>;

/// A wrapper newtype indicating the inner type has been validated.
#[derive(Debug, Clone)]
pub struct Valid<T>(T);

impl<T> Valid<T> {
    /// Return a reference to the validated inner type.
    pub fn valid(&self) -> &T {
        &self.0
    }
}

/// Validation of a deserialized configuration.
pub trait Validate: Sized {
    /// Validate the configuration.
    ///
    /// If `basedir` is not `None`, it specifies the directory in which relative
    /// filenames are searched.
    fn validate(self, basedir: Option<&Path>) -> Result<Valid<Self>>;
}

/// Vertical orientation of the data space on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YAxis {
    /// Data `y = 1` is drawn at the top of the surface.
    #[default]
    Up,
    /// Data `y = 1` is drawn at the bottom of the surface, as in canvas pixels.
    Down,
}

/// What a stream draws for every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Every entity with its trail and a directional sprite.
    #[default]
    Trajectories,
    /// Point density scatter over the recent sampling window.
    Density,
}

/// Constants shared by all streams of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PlaybackConfig {
    /// Playback rate in ticks per second.
    pub frame_rate: f64,
    /// Rate at which the host wakes the playback clock, in Hz.
    pub refresh_hz: f64,
    /// Maximum number of historical positions drawn behind each entity.
    pub trail_length: usize,
    /// Number of ticks between the current tick and the first trail point.
    pub trail_offset: usize,
    /// Speed mapped to the end of the color gradient. Faster is clamped.
    pub max_speed: f64,
    /// Number of frames rendered between two yields during precomputation.
    pub chunk_size: usize,
    /// Number of ticks (including the current one) drawn by density streams.
    pub density_window: usize,
    /// If set, rows whose time is not a multiple of this step are dropped.
    pub time_step: Option<f64>,
    /// Radius in pixels of the nearest trail point.
    pub trail_radius: f32,
    /// Decrease of the trail point radius per rank of recency.
    pub trail_radius_step: f32,
    /// Edge length in pixels of the directional sprite.
    pub sprite_size: f32,
    /// Optional sprite image (`.svg`, `.png` or `.jpg`) pointing up.
    pub sprite: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_rate: 50.0,
            refresh_hz: 60.0,
            trail_length: 10,
            trail_offset: 1,
            max_speed: 1.0,
            chunk_size: 10,
            density_window: 50,
            time_step: None,
            trail_radius: 4.0,
            trail_radius_step: 0.4,
            sprite_size: 16.0,
            sprite: None,
        }
    }
}

impl PlaybackConfig {
    /// Wall time between two tick advances.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos((1e9 / self.frame_rate).round() as u64)
    }

    /// Wall time between two wake-ups of the clock.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_nanos((1e9 / self.refresh_hz).round() as u64)
    }
}

impl Validate for PlaybackConfig {
    fn validate(self, basedir: Option<&Path>) -> Result<Valid<Self>> {
        rate("frame_rate", self.frame_rate)?;
        rate("refresh_hz", self.refresh_hz)?;
        positive("max_speed", self.max_speed)?;
        if let Some(time_step) = self.time_step {
            positive("time_step", time_step)?;
        }
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size", self.chunk_size));
        }
        if self.density_window == 0 {
            return Err(invalid("density_window", self.density_window));
        }
        if !(self.sprite_size.is_finite() && self.sprite_size > 0.0) {
            return Err(invalid("sprite_size", self.sprite_size));
        }
        let sprite = base_join(self.sprite, basedir)?;
        Ok(Valid(Self { sprite, ..self }))
    }
}

/// One independently playing dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Short unique identifier, used in logs and output paths.
    pub id: String,
    /// Title drawn on status cards. Defaults to `id`.
    pub title: Option<String>,
    /// CSV file with columns `time, trajectory_id, x, y, vx, vy, speed`.
    pub csv: String,
    #[serde(default = "default_surface_size")]
    pub width: u32,
    #[serde(default = "default_surface_size")]
    pub height: u32,
    #[serde(default)]
    pub y_axis: YAxis,
    #[serde(default)]
    pub kind: StreamKind,
    /// Draw the decorative coordinate grid.
    #[serde(default = "default_true")]
    pub grid: bool,
}

fn default_surface_size() -> u32 {
    300
}

fn default_true() -> bool {
    true
}

impl StreamConfig {
    pub fn new(id: &str, csv: &str) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            csv: csv.to_string(),
            width: default_surface_size(),
            height: default_surface_size(),
            y_axis: YAxis::default(),
            kind: StreamKind::default(),
            grid: true,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

impl Validate for StreamConfig {
    fn validate(self, basedir: Option<&Path>) -> Result<Valid<Self>> {
        if self.id.is_empty() {
            return Err(ConfigError::EmptyStreamId);
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptySurface {
                id: self.id,
                width: self.width,
                height: self.height,
            });
        }
        let csv = base_join_inner(self.csv, basedir)?;
        Ok(Valid(Self { csv, ..self }))
    }
}

/// Where and how presented frames are saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    /// Directory receiving one montage PNG per presented tick.
    pub dir: String,
    /// The space surrounding each stream in the montage.
    pub composite_margin_pixels: u32,
    /// Stop after writing this many montages. `None` runs until `quit`.
    pub max_output_frames: Option<usize>,
    /// Optional log file in addition to the console.
    pub log_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "trajview-output".to_string(),
            composite_margin_pixels: 5,
            max_output_frames: Some(500),
            log_file: None,
        }
    }
}

impl Validate for OutputConfig {
    fn validate(self, basedir: Option<&Path>) -> Result<Valid<Self>> {
        if self.max_output_frames == Some(0) {
            return Err(invalid("max_output_frames", 0));
        }
        let dir = base_join_inner(self.dir, basedir)?;
        let log_file = base_join(self.log_file, basedir)?;
        Ok(Valid(Self {
            dir,
            log_file,
            ..self
        }))
    }
}

/// The complete configuration of a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrajviewConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(rename = "stream")]
    pub streams: Vec<StreamConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for TrajviewConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            streams: vec![
                StreamConfig::new("control", "control.csv"),
                StreamConfig::new("odor", "odor.csv"),
                StreamConfig::new("wind", "wind.csv"),
                StreamConfig::new("odor_wind", "odor_wind.csv"),
            ],
            output: OutputConfig::default(),
        }
    }
}

impl Validate for TrajviewConfig {
    fn validate(self, basedir: Option<&Path>) -> Result<Valid<Self>> {
        if self.streams.is_empty() {
            return Err(ConfigError::NoStreams);
        }

        let mut seen = BTreeSet::new();
        for stream in self.streams.iter() {
            if !seen.insert(stream.id.clone()) {
                return Err(ConfigError::DuplicateStreamId(stream.id.clone()));
            }
        }

        let playback = self.playback.validate(basedir)?.0;
        let streams = self
            .streams
            .into_iter()
            .map(|s| s.validate(basedir).map(|v| v.0))
            .collect::<Result<Vec<_>>>()?;
        let output = self.output.validate(basedir)?.0;

        Ok(Valid(Self {
            playback,
            streams,
            output,
        }))
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value))
    }
}

/// A positive rate whose period is at least one nanosecond.
fn rate(name: &'static str, hz: f64) -> Result<()> {
    positive(name, hz)?;
    if (1e9 / hz).round() < 1.0 {
        return Err(invalid(name, hz));
    }
    Ok(())
}

fn invalid(name: &'static str, value: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    }
}

/// If `filename` is relative, join it to `basedir` if possible.
fn base_join_inner(filename: String, basedir: Option<&Path>) -> Result<String> {
    let p = std::path::PathBuf::from(filename);
    let p = match (p.is_relative(), basedir) {
        (true, Some(dirpath)) => dirpath.join(p),
        _ => p,
    };
    p.into_os_string()
        .into_string()
        .map_err(|os_str| ConfigError::NonUtf8Path(os_str.to_string_lossy().into_owned()))
}

/// If `filename` is not None and is relative, join it to `basedir` if possible.
fn base_join(filename: Option<String>, basedir: Option<&Path>) -> Result<Option<String>> {
    filename.map(|s| base_join_inner(s, basedir)).transpose()
}
