use std::{sync::Arc, time::Duration, time::Instant};

use tracing::{error, info, warn};

use trajview_types::{PlaybackConfig, Sample, StreamConfig};

use crate::{
    Frame, FrameRenderer, PixmapSurface, PrecomputeStep, RenderOptions, Result, Sprite, Stream,
    StreamPhase, load_samples,
};

/// Receives every frame that becomes visible on a stream's output surface.
pub trait Display {
    fn present(&mut self, stream: usize, frame: &Frame);
}

impl<D: Display + ?Sized> Display for &mut D {
    fn present(&mut self, stream: usize, frame: &Frame) {
        (**self).present(stream, frame)
    }
}

/// Play state shared by all streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Reference time of the last tick advance, drift compensated.
    pub last_frame_time: Option<Instant>,
}

/// Named changes of [`PlaybackState::is_playing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Forced start of playback when the last stream finished precomputing.
    AutoPlay,
    Play,
    Pause,
}

/// What one [`Session::step_precompute`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecomputeReport {
    pub stream: usize,
    pub step: PrecomputeStep,
    pub transition: Option<Transition>,
}

/// All streams of one playback session and their shared play state.
pub struct Session<D> {
    pub(crate) streams: Vec<Stream>,
    pub(crate) playback: PlaybackState,
    pub(crate) display: D,
    pub(crate) frame_interval: Duration,
    /// Last progress percentage presented per stream.
    pub(crate) shown_progress: Vec<Option<u8>>,
    config: PlaybackConfig,
    next_precompute: usize,
}

impl<D: Display> Session<D> {
    /// Create one stream per configuration, all in the loading phase.
    pub fn new(config: &PlaybackConfig, streams: &[StreamConfig], display: D) -> Result<Self> {
        let font = crate::label::load_font()?;
        let sprite = match &config.sprite {
            Some(path) => Sprite::load(path)?,
            None => Sprite::builtin()?,
        };
        let sprite = Arc::new(sprite);

        let streams = streams
            .iter()
            .map(|cfg| {
                let renderer =
                    FrameRenderer::new(RenderOptions::new(config, cfg), Arc::clone(&sprite));
                let surface = PixmapSurface::new(cfg.width, cfg.height, font.clone())?;
                Ok(Stream::new(cfg.clone(), renderer, surface))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            shown_progress: vec![None; streams.len()],
            streams,
            playback: PlaybackState::default(),
            display,
            frame_interval: config.frame_interval(),
            config: config.clone(),
            next_precompute: 0,
        })
    }

    /// Read every stream's CSV file.
    ///
    /// A stream whose file cannot be read shows the error and stays waiting;
    /// the other streams are not affected.
    pub fn load_all(&mut self) {
        for idx in 0..self.streams.len() {
            let result = load_samples(&self.streams[idx].config().csv, self.config.time_step);
            self.load_stream(idx, result);
        }
    }

    /// Hand the outcome of loading stream `idx` to the session.
    pub fn load_stream(&mut self, idx: usize, result: Result<Vec<Sample>>) {
        let Some(stream) = self.streams.get_mut(idx) else {
            warn!("ignoring samples for unknown stream {idx}");
            return;
        };
        match result {
            Ok(samples) => {
                let n_samples = samples.len();
                stream.set_samples(samples, self.config.chunk_size);
                if *stream.phase() == StreamPhase::Empty {
                    warn!("stream \"{}\" has no samples and will never play", stream.id());
                    let frame = stream.render_message("No samples to show.");
                    self.display.present(idx, &frame);
                } else {
                    info!(
                        "stream \"{}\": {n_samples} samples over {} ticks",
                        stream.id(),
                        stream.data().len()
                    );
                }
            }
            Err(e) => {
                error!("stream \"{}\" failed to load: {e}", stream.id());
                let message = e.to_string();
                let frame = stream.render_message(&message);
                stream.fail(message);
                self.display.present(idx, &frame);
            }
        }
    }

    /// Render one chunk of frames for the next precomputing stream.
    ///
    /// Streams take turns, one chunk each. Returns `None` once no stream is
    /// precomputing. The caller should yield to its scheduler between calls.
    pub fn step_precompute(&mut self) -> Option<PrecomputeReport> {
        let n = self.streams.len();
        for k in 0..n {
            let idx = (self.next_precompute + k) % n;
            let Some(step) = self.streams[idx].step_precompute() else {
                continue;
            };
            self.next_precompute = (idx + 1) % n;

            let mut transition = None;
            if step == PrecomputeStep::Complete {
                let stream = &mut self.streams[idx];
                info!(
                    "stream \"{}\" ready with {} frames",
                    stream.id(),
                    stream.frames().len()
                );
                stream.rewind();
                if let Some(frame) = stream.current_frame() {
                    self.display.present(idx, frame);
                }
                if self.all_ready() {
                    transition = Some(self.auto_play());
                }
            }
            return Some(PrecomputeReport {
                stream: idx,
                step,
                transition,
            });
        }
        None
    }

    fn auto_play(&mut self) -> Transition {
        info!(
            "all {} streams ready, starting playback",
            self.streams.len()
        );
        self.playback.is_playing = true;
        self.playback.last_frame_time = None;
        Transition::AutoPlay
    }

    pub fn has_pending_precompute(&self) -> bool {
        self.streams.iter().any(Stream::is_precomputing)
    }

    pub fn all_ready(&self) -> bool {
        !self.streams.is_empty() && self.streams.iter().all(Stream::is_ready)
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn stream(&self, idx: usize) -> Option<&Stream> {
        self.streams.get(idx)
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }
}
