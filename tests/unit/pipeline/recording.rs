use std::sync::Arc;

use super::*;
use crate::encode::muxer::{CombinedStream, InMemoryMuxer, VideoSource};
use crate::foundation::core::{Canvas, Fps};
use crate::pipeline::resources::ResourceLedger;
use crate::speech::capture::AudioTrack;

fn request(ledger: &ResourceLedger, frames: u64) -> RecordingRequest {
    RecordingRequest {
        stream: CombinedStream::new(
            VideoSource {
                canvas: Canvas {
                    width: 2,
                    height: 2,
                },
                fps: Fps::default(),
                frames,
            },
            AudioTrack {
                sample_rate: 100,
                channels: 1,
                samples: Arc::new(vec![0.0; 100]),
            },
        )
        .unwrap(),
        asset_name: "narration_video_r".to_string(),
        out_dir: std::env::temp_dir(),
        ledger: ledger.clone(),
    }
}

fn summary(frames: u64) -> CompositeSummary {
    CompositeSummary {
        frames,
        duration_secs: frames as f64 / 30.0,
    }
}

#[test]
fn stop_after_all_frames_finishes_asset() {
    let ledger = ResourceLedger::new();
    let mut muxer = InMemoryMuxer::new();
    muxer.negotiate().unwrap();
    {
        let mut rec = Recording::start(&mut muxer, request(&ledger, 2)).unwrap();
        assert_eq!(ledger.live(ResourceKind::Recorder), 1);
        rec.push(FrameIndex(0), &FrameRGBA::new(2, 2)).unwrap();
        rec.push(FrameIndex(1), &FrameRGBA::new(2, 2)).unwrap();
        let asset = rec.stop(summary(2)).unwrap();
        assert_eq!(asset.frames, 2);
    }
    assert!(ledger.snapshot().is_idle());
    assert_eq!(muxer.aborted(), 0);
}

#[test]
fn drop_without_stop_aborts() {
    let ledger = ResourceLedger::new();
    let mut muxer = InMemoryMuxer::new();
    muxer.negotiate().unwrap();
    {
        let mut rec = Recording::start(&mut muxer, request(&ledger, 3)).unwrap();
        rec.push(FrameIndex(0), &FrameRGBA::new(2, 2)).unwrap();
    }
    assert_eq!(muxer.aborted(), 1);
    assert!(!muxer.is_recording());
    assert!(ledger.snapshot().is_idle());
}

#[test]
fn early_stop_is_capture_error_and_aborts() {
    let ledger = ResourceLedger::new();
    let mut muxer = InMemoryMuxer::new();
    muxer.negotiate().unwrap();
    let mut rec = Recording::start(&mut muxer, request(&ledger, 3)).unwrap();
    rec.push(FrameIndex(0), &FrameRGBA::new(2, 2)).unwrap();
    let err = rec.stop(summary(1)).unwrap_err();
    assert!(matches!(err, VoxframeError::Capture(_)));
    assert_eq!(muxer.aborted(), 1);
}

#[test]
fn begin_failure_releases_recorder_slot() {
    let ledger = ResourceLedger::new();
    let mut muxer = InMemoryMuxer::new();
    assert!(Recording::start(&mut muxer, request(&ledger, 1)).is_err());
    assert!(ledger.snapshot().is_idle());
}
