use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::pipeline::resources::{ResourceGuard, ResourceKind, ResourceLedger};
use crate::speech::engine::PcmChunk;
use std::sync::Arc;
use std::time::Duration;

/// Finished, immutable audio track ready for muxing.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved `f32` samples.
    pub samples: Arc<Vec<f32>>,
}

impl AudioTrack {
    pub fn frames(&self) -> u64 {
        (self.samples.len() / usize::from(self.channels.max(1))) as u64
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Audio-capture graph collecting engine output while an utterance is spoken.
///
/// The capture is open from construction until [`AudioCapture::finish`] or drop; both paths
/// release its ledger slot.
#[derive(Debug)]
pub struct AudioCapture {
    sample_rate: Option<u32>,
    channels: Option<u16>,
    samples: Vec<f32>,
    tail: Duration,
    _guard: ResourceGuard,
}

impl AudioCapture {
    /// Open a capture that pads `tail` of silence after the last chunk.
    pub fn open(ledger: &ResourceLedger, tail: Duration) -> Self {
        Self {
            sample_rate: None,
            channels: None,
            samples: Vec::new(),
            tail,
            _guard: ledger.acquire(ResourceKind::AudioCapture),
        }
    }

    /// Append one chunk. The first chunk fixes the stream format.
    pub fn push(&mut self, chunk: PcmChunk) -> VoxframeResult<()> {
        if chunk.sample_rate == 0 || chunk.channels == 0 {
            return Err(VoxframeError::synthesis(
                "engine emitted audio with zero sample rate or channel count",
            ));
        }
        match (self.sample_rate, self.channels) {
            (None, None) => {
                self.sample_rate = Some(chunk.sample_rate);
                self.channels = Some(chunk.channels);
            }
            (Some(sr), Some(ch)) if sr == chunk.sample_rate && ch == chunk.channels => {}
            (sr, ch) => {
                return Err(VoxframeError::synthesis(format!(
                    "engine changed audio format mid-utterance: {:?}Hz/{:?}ch -> {}Hz/{}ch",
                    sr, ch, chunk.sample_rate, chunk.channels
                )));
            }
        }
        if chunk.samples.len() % usize::from(chunk.channels) != 0 {
            return Err(VoxframeError::synthesis(
                "engine emitted a partial interleaved frame",
            ));
        }
        self.samples
            .extend(chunk.samples.iter().map(|s| s.clamp(-1.0, 1.0)));
        Ok(())
    }

    pub fn captured_secs(&self) -> f64 {
        match (self.sample_rate, self.channels) {
            (Some(sr), Some(ch)) => {
                (self.samples.len() / usize::from(ch)) as f64 / f64::from(sr)
            }
            _ => 0.0,
        }
    }

    /// Close the capture and return the finished track.
    pub fn finish(mut self) -> VoxframeResult<AudioTrack> {
        let (Some(sample_rate), Some(channels)) = (self.sample_rate, self.channels) else {
            return Err(VoxframeError::synthesis("engine produced no audio"));
        };
        let tail_frames = (self.tail.as_secs_f64() * f64::from(sample_rate)).round() as usize;
        self.samples
            .resize(self.samples.len() + tail_frames * usize::from(channels), 0.0);
        Ok(AudioTrack {
            sample_rate,
            channels,
            samples: Arc::new(std::mem::take(&mut self.samples)),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/speech/capture.rs"]
mod tests;
