use std::time::{Duration, Instant};

use crate::foundation::core::{Fps, FrameIndex};

/// How the compositor loop is paced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Frames are produced as fast as they render.
    #[default]
    Offline,
    /// Each frame waits for its wall-clock deadline.
    Realtime,
}

/// Tick source for the compositor loop.
///
/// Elapsed time is always `frame / fps`, so caption selection is identical in both pacing modes.
#[derive(Debug)]
pub struct FrameClock {
    fps: Fps,
    pacing: Pacing,
    started: Option<Instant>,
}

impl FrameClock {
    pub fn new(fps: Fps, pacing: Pacing) -> Self {
        Self {
            fps,
            pacing,
            started: None,
        }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn elapsed_secs(&self, frame: FrameIndex) -> f64 {
        self.fps.frames_to_secs(frame.0)
    }

    /// Block until `frame` is due. Returns immediately when offline.
    pub fn wait_for(&mut self, frame: FrameIndex) {
        if self.pacing == Pacing::Offline {
            return;
        }
        let started = *self.started.get_or_insert_with(Instant::now);
        let deadline = started + Duration::from_secs_f64(self.elapsed_secs(frame));
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/clock.rs"]
mod tests;
