use tracing::{debug, info};

use crate::{ClockState, Display, Session, Transition};

impl<D: Display> Session<D> {
    /// Flip between playing and paused.
    ///
    /// Safe in any state. While streams are still precomputing the flag is
    /// recorded, but nothing plays until all streams are ready, at which
    /// point playback starts regardless.
    ///
    /// Resuming restarts the frame pacing at the next wake, so time spent
    /// paused is not counted as elapsed playback.
    pub fn toggle_play_pause(&mut self) -> Transition {
        self.playback.is_playing = !self.playback.is_playing;
        let transition = if self.playback.is_playing {
            self.playback.last_frame_time = None;
            Transition::Play
        } else {
            Transition::Pause
        };
        if self.clock_state() == ClockState::Waiting {
            debug!("{transition:?} recorded while waiting for streams");
        } else {
            info!("{transition:?}");
        }
        transition
    }

    /// Play or pause, toggling only if the state differs.
    pub fn set_playing(&mut self, playing: bool) -> Option<Transition> {
        if self.playback.is_playing == playing {
            None
        } else {
            Some(self.toggle_play_pause())
        }
    }

    /// Move every stream back to tick 0 and show its first frame now.
    pub fn reset(&mut self) {
        info!("reset");
        for (idx, stream) in self.streams.iter_mut().enumerate() {
            stream.rewind();
            if let Some(frame) = stream.current_frame() {
                self.display.present(idx, frame);
            }
        }
    }
}
