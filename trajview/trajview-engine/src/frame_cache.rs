use tracing::debug;

use crate::{Dataset, Frame, FrameRenderer, PixmapSurface, Surface};

/// The precomputed frames of one stream, one per tick.
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
}

impl FrameStore {
    pub fn get(&self, tick: usize) -> Option<&Frame> {
        self.frames.get(tick)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }
}

/// Integer percentage of `done` out of `total`, rounded and capped at 100.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (done as f64 / total as f64 * 100.0).round();
    pct.min(100.0) as u8
}

/// Outcome of one [`FramePrecompute::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecomputeStep {
    /// A chunk was rendered; more remain.
    Progress(u8),
    /// Every tick has a frame.
    Complete,
}

/// Resumable rendering of every tick of a stream, one chunk per step.
///
/// The caller yields to its scheduler between steps. Frames are appended to
/// the store in tick order, so after `k` steps the first
/// `k * chunk_size` ticks are available.
#[derive(Debug, Clone)]
pub struct FramePrecompute {
    next_tick: usize,
    total: usize,
    chunk_size: usize,
}

impl FramePrecompute {
    pub fn new(total: usize, chunk_size: usize) -> Self {
        Self {
            next_tick: 0,
            total,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.next_tick
    }

    pub fn is_complete(&self) -> bool {
        self.next_tick >= self.total
    }

    /// Render the next chunk of at most `chunk_size` frames.
    pub fn step(
        &mut self,
        renderer: &FrameRenderer,
        data: &Dataset,
        surface: &mut PixmapSurface,
        store: &mut FrameStore,
    ) -> PrecomputeStep {
        let end = (self.next_tick + self.chunk_size).min(self.total);
        for tick in self.next_tick..end {
            renderer.compose(surface, data, tick);
            store.push(surface.snapshot());
        }
        self.next_tick = end;

        if self.is_complete() {
            PrecomputeStep::Complete
        } else {
            let pct = progress_percent(self.next_tick, self.total);
            debug!("precomputed {}/{} frames ({pct}%)", self.next_tick, self.total);
            PrecomputeStep::Progress(pct)
        }
    }
}
