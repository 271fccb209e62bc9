#![forbid(unsafe_code)]

//! Narrated caption-video synthesis.
//!
//! A [`NarrationScript`] is spoken by a [`SpeechEngine`], drawn frame by frame by the
//! [`FrameCompositor`], and recorded together with the narration by a [`StreamMuxer`].
//! [`SynthesisOrchestrator`] drives the whole run as an explicit state machine.

pub mod assets;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod pipeline;
pub mod render;
pub mod script;
pub mod speech;

pub use assets::{BackgroundImage, DecodedImage, TextLayoutEngine, decode_background};
pub use config::PipelineConfig;
pub use encode::muxer::MemoryManifest;
pub use encode::{
    AssetRef, CombinedStream, Container, FfmpegMuxer, InMemoryMuxer, MuxProfile, MuxedAsset,
    RecordingRequest, StreamMuxer, VideoSource,
};
pub use foundation::core::{Canvas, Fps, FrameIndex};
pub use foundation::error::{FailureKind, VoxframeError, VoxframeResult};
pub use pipeline::{
    CancelToken, PipelineState, ProgressReporter, ProgressSink, ResourceKind, ResourceLedger,
    ResourceSnapshot, SynthesisOrchestrator, VideoExport,
};
pub use render::{FrameClock, FrameCompositor, FrameRGBA, Pacing};
pub use script::model::{NarrationScript, Section};
pub use script::timeline::CaptionTimeline;
pub use speech::capture::{AudioCapture, AudioTrack};
pub use speech::engine::{PcmChunk, SpeechEngine, Utterance, UtteranceEvent, Voice, select_voice};
pub use speech::espeak::EspeakEngine;
pub use speech::synthesizer::{SpeechOpts, SpeechSynthesizer};
