use std::time::{Duration, Instant};

use crate::{Display, Session};

/// States of the playback clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// At least one stream is not ready. No stream advances.
    Waiting,
    /// All streams ready, paused. The last frames stay on screen.
    ReadyPaused,
    /// All streams ready and advancing.
    ReadyPlaying,
}

/// What one [`Session::on_wake`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    Waiting,
    /// Ready, but no advance was due (or playback is paused).
    Held,
    /// Every stream moved forward by one tick.
    Advanced,
}

impl<D: Display> Session<D> {
    pub fn clock_state(&self) -> ClockState {
        if !self.all_ready() {
            ClockState::Waiting
        } else if self.playback.is_playing {
            ClockState::ReadyPlaying
        } else {
            ClockState::ReadyPaused
        }
    }

    /// The refresh callback, called by the host at its display rate.
    ///
    /// While waiting, updates the progress indicator of every precomputing
    /// stream. While playing, advances all streams together by one tick once
    /// at least one frame interval has elapsed since the previous advance. The
    /// advance reference keeps the remainder of the elapsed time, so the
    /// playback rate does not drift with the wake-up rate.
    pub fn on_wake(&mut self, now: Instant) -> WakeOutcome {
        match self.clock_state() {
            ClockState::Waiting => {
                self.show_progress();
                WakeOutcome::Waiting
            }
            ClockState::ReadyPaused => WakeOutcome::Held,
            ClockState::ReadyPlaying => {
                let Some(last) = self.playback.last_frame_time else {
                    // First wake after playback started: tick 0 is on screen.
                    self.playback.last_frame_time = Some(now);
                    return WakeOutcome::Held;
                };
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.frame_interval {
                    return WakeOutcome::Held;
                }

                for (idx, stream) in self.streams.iter_mut().enumerate() {
                    stream.advance();
                    if let Some(frame) = stream.current_frame() {
                        self.display.present(idx, frame);
                    }
                }

                let interval_nanos = self.frame_interval.as_nanos().max(1);
                let remainder = Duration::from_nanos((elapsed.as_nanos() % interval_nanos) as u64);
                self.playback.last_frame_time = Some(now - remainder);
                WakeOutcome::Advanced
            }
        }
    }

    fn show_progress(&mut self) {
        for (idx, stream) in self.streams.iter_mut().enumerate() {
            if !stream.is_precomputing() {
                continue;
            }
            let pct = stream.precompute_progress();
            if self.shown_progress[idx] == Some(pct) {
                continue;
            }
            let frame = stream.render_progress();
            self.display.present(idx, &frame);
            self.shown_progress[idx] = Some(pct);
        }
    }
}
