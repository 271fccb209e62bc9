use crate::encode::muxer::{MuxedAsset, RecordingRequest, StreamMuxer};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::pipeline::resources::{ResourceGuard, ResourceKind};
use crate::render::compositor::CompositeSummary;
use crate::render::frame::FrameRGBA;

/// An active recording on a [`StreamMuxer`].
///
/// Only [`Recording::start`] creates one, and only [`Recording::stop`] with the compositor's
/// completion summary ends it successfully. Dropping it any other way aborts the muxer.
pub struct Recording<'m> {
    muxer: &'m mut dyn StreamMuxer,
    expected_frames: u64,
    pushed: u64,
    stopped: bool,
    _guard: ResourceGuard,
}

impl<'m> Recording<'m> {
    pub fn start(muxer: &'m mut dyn StreamMuxer, request: RecordingRequest) -> VoxframeResult<Self> {
        let guard = request.ledger.acquire(ResourceKind::Recorder);
        let expected_frames = request.stream.video().frames;
        if let Err(e) = muxer.begin(request) {
            muxer.abort();
            return Err(e);
        }
        tracing::debug!(muxer = muxer.name(), expected_frames, "recording started");
        Ok(Self {
            muxer,
            expected_frames,
            pushed: 0,
            stopped: false,
            _guard: guard,
        })
    }

    pub fn push(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VoxframeResult<()> {
        self.muxer.push_frame(idx, frame)?;
        self.pushed += 1;
        Ok(())
    }

    /// Stop on the compositor's duration-reached signal and flush the asset.
    pub fn stop(mut self, signal: CompositeSummary) -> VoxframeResult<MuxedAsset> {
        if signal.frames != self.pushed || self.pushed != self.expected_frames {
            return Err(VoxframeError::capture(format!(
                "recording stopped after {} of {} frames (compositor reported {})",
                self.pushed, self.expected_frames, signal.frames
            )));
        }
        self.stopped = true;
        self.muxer.finish()
    }
}

impl Drop for Recording<'_> {
    fn drop(&mut self) {
        if !self.stopped {
            tracing::debug!(pushed = self.pushed, "recording dropped before stop; aborting");
            self.muxer.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/recording.rs"]
mod tests;
