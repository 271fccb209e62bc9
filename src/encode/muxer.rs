use std::path::PathBuf;
use std::sync::Arc;

use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::pipeline::resources::ResourceLedger;
use crate::render::frame::FrameRGBA;
use crate::speech::capture::AudioTrack;

/// Shape of the compositor's frame stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoSource {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Frames the compositor will emit before signalling completion.
    pub frames: u64,
}

/// Video and audio tracks merged into one stream, ready to record.
///
/// Built only from both tracks, so a recording can never start with one of them missing.
#[derive(Clone, Debug)]
pub struct CombinedStream {
    video: VideoSource,
    audio: AudioTrack,
}

impl CombinedStream {
    pub fn new(video: VideoSource, audio: AudioTrack) -> VoxframeResult<Self> {
        video.canvas.validate()?;
        if video.frames == 0 {
            return Err(VoxframeError::validation(
                "video source must produce at least one frame",
            ));
        }
        if audio.sample_rate == 0 || audio.channels == 0 || audio.frames() == 0 {
            return Err(VoxframeError::validation(
                "audio track must be non-empty with a valid format",
            ));
        }
        Ok(Self { video, audio })
    }

    pub fn video(&self) -> &VideoSource {
        &self.video
    }

    pub fn audio(&self) -> &AudioTrack {
        &self.audio
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    WebM,
    Mp4,
}

/// One container/codec combination a muxer can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MuxProfile {
    pub container: Container,
    /// ffmpeg encoder name for the video track.
    pub video_encoder: &'static str,
    /// ffmpeg encoder name for the audio track.
    pub audio_encoder: &'static str,
    pub mime_type: &'static str,
    pub extension: &'static str,
}

impl MuxProfile {
    pub const WEBM_VP8_OPUS: Self = Self {
        container: Container::WebM,
        video_encoder: "libvpx",
        audio_encoder: "libopus",
        mime_type: "video/webm;codecs=vp8,opus",
        extension: "webm",
    };

    pub const MP4_H264_AAC: Self = Self {
        container: Container::Mp4,
        video_encoder: "libx264",
        audio_encoder: "aac",
        mime_type: "video/mp4;codecs=avc1,mp4a",
        extension: "mp4",
    };

    /// Profiles in preference order.
    pub const PREFERENCE: [Self; 2] = [Self::WEBM_VP8_OPUS, Self::MP4_H264_AAC];

    /// First preferred profile whose encoders are both available.
    pub fn choose(available: impl Fn(&str) -> bool) -> Option<Self> {
        Self::PREFERENCE
            .into_iter()
            .find(|p| available(p.video_encoder) && available(p.audio_encoder))
    }
}

/// Everything a muxer needs to start recording.
#[derive(Clone, Debug)]
pub struct RecordingRequest {
    pub stream: CombinedStream,
    /// File stem for the finished asset, without extension.
    pub asset_name: String,
    /// Directory file-backed muxers write the finished asset into.
    pub out_dir: PathBuf,
    /// Ledger for temp handles the muxer holds while recording.
    pub ledger: ResourceLedger,
}

/// Opaque handle to a finished asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetRef {
    File(PathBuf),
    Memory(Arc<Vec<u8>>),
}

impl AssetRef {
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File(p) => Some(p),
            Self::Memory(_) => None,
        }
    }

    /// Load the asset bytes.
    pub fn read_bytes(&self) -> VoxframeResult<Arc<Vec<u8>>> {
        match self {
            Self::File(p) => {
                use anyhow::Context as _;
                let bytes = std::fs::read(p)
                    .with_context(|| format!("read asset '{}'", p.display()))?;
                Ok(Arc::new(bytes))
            }
            Self::Memory(b) => Ok(b.clone()),
        }
    }
}

/// Output of a successful [`StreamMuxer::finish`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxedAsset {
    pub asset: AssetRef,
    pub profile: MuxProfile,
    pub frames: u64,
}

/// Records a [`CombinedStream`] into one media asset.
///
/// Call order: `negotiate`, `begin`, `push_frame` in strictly increasing frame order, then
/// exactly one of `finish` or `abort`. A failed `push_frame` or `finish` leaves nothing behind.
pub trait StreamMuxer: Send {
    fn name(&self) -> &str;
    /// Pick a container/codec pair supported on this host.
    fn negotiate(&mut self) -> VoxframeResult<MuxProfile>;
    fn begin(&mut self, request: RecordingRequest) -> VoxframeResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VoxframeResult<()>;
    /// Flush buffered data and hand over the finished asset.
    fn finish(&mut self) -> VoxframeResult<MuxedAsset>;
    /// Stop recording and discard partial output. Safe to call at any point.
    fn abort(&mut self);
}

/// Summary written by [`InMemoryMuxer`] as its asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MemoryManifest {
    pub asset_name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub audio_sample_rate: u32,
    pub audio_channels: u16,
    pub audio_frames: u64,
    /// xxh3 fingerprint of every frame, in order.
    pub frame_hashes: Vec<u64>,
}

#[derive(Debug)]
struct MemorySession {
    request: RecordingRequest,
    hashes: Vec<u64>,
    next: u64,
}

/// Muxer that keeps frame fingerprints in memory; for tests and previews.
#[derive(Debug, Default)]
pub struct InMemoryMuxer {
    profile: Option<MuxProfile>,
    session: Option<MemorySession>,
    aborted: usize,
    last: Option<MemoryManifest>,
}

impl InMemoryMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifest of the last finished recording.
    pub fn manifest(&self) -> Option<&MemoryManifest> {
        self.last.as_ref()
    }

    pub fn aborted(&self) -> usize {
        self.aborted
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }
}

impl StreamMuxer for InMemoryMuxer {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn negotiate(&mut self) -> VoxframeResult<MuxProfile> {
        let profile = MuxProfile::WEBM_VP8_OPUS;
        self.profile = Some(profile);
        Ok(profile)
    }

    fn begin(&mut self, request: RecordingRequest) -> VoxframeResult<()> {
        if self.profile.is_none() {
            return Err(VoxframeError::validation("muxer begin called before negotiate"));
        }
        if self.session.is_some() {
            return Err(VoxframeError::validation("muxer is already recording"));
        }
        let capacity = usize::try_from(request.stream.video().frames).unwrap_or(0);
        self.session = Some(MemorySession {
            request,
            hashes: Vec::with_capacity(capacity),
            next: 0,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VoxframeResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(VoxframeError::capture("frame pushed with no active recording"));
        };
        let canvas = session.request.stream.video().canvas;
        if frame.width != canvas.width || frame.height != canvas.height {
            return Err(VoxframeError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, canvas.width, canvas.height
            )));
        }
        if idx.0 != session.next {
            return Err(VoxframeError::capture(format!(
                "frame {} pushed out of order (expected {})",
                idx.0, session.next
            )));
        }
        session.hashes.push(frame.fingerprint());
        session.next += 1;
        Ok(())
    }

    fn finish(&mut self) -> VoxframeResult<MuxedAsset> {
        let (Some(session), Some(profile)) = (self.session.take(), self.profile) else {
            return Err(VoxframeError::capture("finish called with no active recording"));
        };
        let video = *session.request.stream.video();
        let audio = session.request.stream.audio();
        let manifest = MemoryManifest {
            asset_name: session.request.asset_name.clone(),
            mime_type: profile.mime_type.to_string(),
            width: video.canvas.width,
            height: video.canvas.height,
            fps_num: video.fps.num,
            fps_den: video.fps.den,
            audio_sample_rate: audio.sample_rate,
            audio_channels: audio.channels,
            audio_frames: audio.frames(),
            frame_hashes: session.hashes,
        };
        let bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| VoxframeError::capture(format!("failed to write manifest: {e}")))?;
        let frames = manifest.frame_hashes.len() as u64;
        self.last = Some(manifest);
        Ok(MuxedAsset {
            asset: AssetRef::Memory(Arc::new(bytes)),
            profile,
            frames,
        })
    }

    fn abort(&mut self) {
        if self.session.take().is_some() {
            self.aborted += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/muxer.rs"]
mod tests;
