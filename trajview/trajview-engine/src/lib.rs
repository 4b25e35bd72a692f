//! Frame precomputation and synchronized playback of trajectory streams.
//!
//! Each configured condition becomes a [`Stream`]. Its samples are indexed by
//! a [`Timeline`] of discrete ticks, every tick is rendered once into an
//! immutable [`Frame`] by the chunked [`FramePrecompute`] task, and the
//! [`Session`] then plays all streams in lockstep from those cached frames.
//!
//! The engine never blocks and never spawns threads. The host calls
//! [`Session::step_precompute`] whenever it has idle time and
//! [`Session::on_wake`] from its refresh timer, yielding between calls.

mod clock;
mod dataset;
mod frame_cache;
mod ingest;
mod label;
mod render;
mod session;
mod sprite;
mod stream;
mod surface;
mod timeline;
mod trail;
mod transport;

pub use clock::{ClockState, WakeOutcome};
pub use dataset::Dataset;
pub use frame_cache::{FramePrecompute, FrameStore, PrecomputeStep, progress_percent};
pub use ingest::{load_samples, read_samples};
pub use render::{FrameRenderer, Mapping, RenderOptions, speed_color, velocity_angle};
pub use session::{Display, PlaybackState, PrecomputeReport, Session, Transition};
pub use sprite::Sprite;
pub use stream::{Stream, StreamPhase};
pub use surface::{Frame, PixmapSurface, Rgba, Surface, TextStyle};
pub use timeline::Timeline;
pub use trail::{TrailSpec, resolve_trail};

pub use trajview_types::{Sample, TrajectoryId};

/// Errors raised by the engine.
///
/// Load errors are scoped to a single stream: the session shows them on that
/// stream's surface instead of propagating them.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("reading \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing \"{path}\": {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("sprite \"{path}\": {source}")]
    SvgSprite {
        path: String,
        #[source]
        source: usvg::Error,
    },
    #[error("sprite \"{path}\": {source}")]
    ImageSprite {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot allocate {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("the bundled label font could not be parsed")]
    Font,
}

pub type Result<T> = std::result::Result<T, Error>;
