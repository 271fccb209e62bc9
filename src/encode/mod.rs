//! Muxing the frame stream and the narration track into one media asset.

pub mod ffmpeg;
pub mod muxer;

pub use ffmpeg::FfmpegMuxer;
pub use muxer::{
    AssetRef, CombinedStream, Container, InMemoryMuxer, MuxProfile, MuxedAsset, RecordingRequest,
    StreamMuxer, VideoSource,
};
