use trajview_types::{Sample, StreamConfig};

use crate::{
    Dataset, Frame, FramePrecompute, FrameRenderer, FrameStore, PixmapSurface, PrecomputeStep,
    Surface, progress_percent,
};

/// Lifecycle of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPhase {
    /// Samples not yet available.
    Loading,
    /// Frames are being rendered into the cache.
    Precomputing,
    /// Every tick has a frame; the stream can play.
    Ready,
    /// The input could not be loaded. Never becomes ready.
    Failed(String),
    /// The input held no usable samples. Never becomes ready.
    Empty,
}

/// One independently playing dataset.
pub struct Stream {
    config: StreamConfig,
    renderer: FrameRenderer,
    surface: PixmapSurface,
    data: Dataset,
    phase: StreamPhase,
    precompute: Option<FramePrecompute>,
    precompute_progress: u8,
    frames: FrameStore,
    tick: usize,
}

impl Stream {
    pub(crate) fn new(config: StreamConfig, renderer: FrameRenderer, surface: PixmapSurface) -> Self {
        Self {
            config,
            renderer,
            surface,
            data: Dataset::default(),
            phase: StreamPhase::Loading,
            precompute: None,
            precompute_progress: 0,
            frames: FrameStore::default(),
            tick: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn title(&self) -> &str {
        self.config.title()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn phase(&self) -> &StreamPhase {
        &self.phase
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn is_ready(&self) -> bool {
        self.phase == StreamPhase::Ready
    }

    pub fn is_precomputing(&self) -> bool {
        self.phase == StreamPhase::Precomputing
    }

    /// Percentage of ticks with a cached frame, `0..=100`.
    pub fn precompute_progress(&self) -> u8 {
        self.precompute_progress
    }

    /// The current tick index.
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    /// The cached frame of the current tick.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.tick)
    }

    /// Accept the loaded samples and start precomputing.
    pub(crate) fn set_samples(&mut self, samples: Vec<Sample>, chunk_size: usize) {
        self.data = Dataset::new(samples);
        if self.data.is_empty() {
            self.phase = StreamPhase::Empty;
        } else {
            self.phase = StreamPhase::Precomputing;
            self.precompute = Some(FramePrecompute::new(self.data.len(), chunk_size));
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.phase = StreamPhase::Failed(message);
        self.precompute = None;
    }

    /// Render one chunk. Returns `None` if this stream is not precomputing.
    pub(crate) fn step_precompute(&mut self) -> Option<PrecomputeStep> {
        let task = self.precompute.as_mut()?;
        let step = task.step(&self.renderer, &self.data, &mut self.surface, &mut self.frames);
        self.precompute_progress = progress_percent(task.done(), task.total());
        if step == PrecomputeStep::Complete {
            self.precompute = None;
            self.phase = StreamPhase::Ready;
        }
        Some(step)
    }

    /// Advance one tick, looping at the end of the timeline.
    pub(crate) fn advance(&mut self) {
        if !self.data.is_empty() {
            self.tick = (self.tick + 1) % self.data.len();
        }
    }

    pub(crate) fn rewind(&mut self) {
        self.tick = 0;
    }

    pub(crate) fn render_progress(&mut self) -> Frame {
        self.renderer
            .compose_progress(&mut self.surface, self.config.title(), self.precompute_progress);
        self.surface.snapshot()
    }

    pub(crate) fn render_message(&mut self, message: &str) -> Frame {
        self.renderer
            .compose_message(&mut self.surface, self.config.title(), message);
        self.surface.snapshot()
    }
}
