use super::*;

fn track(secs: f64) -> AudioTrack {
    AudioTrack {
        sample_rate: 1000,
        channels: 1,
        samples: Arc::new(vec![0.0; (secs * 1000.0) as usize]),
    }
}

fn video(frames: u64) -> VideoSource {
    VideoSource {
        canvas: Canvas {
            width: 4,
            height: 2,
        },
        fps: Fps::default(),
        frames,
    }
}

fn request(frames: u64) -> RecordingRequest {
    RecordingRequest {
        stream: CombinedStream::new(video(frames), track(1.0)).unwrap(),
        asset_name: "narration_video_x".to_string(),
        out_dir: std::env::temp_dir(),
        ledger: ResourceLedger::new(),
    }
}

#[test]
fn combined_stream_requires_both_tracks() {
    assert!(CombinedStream::new(video(3), track(0.0)).is_err());
    assert!(CombinedStream::new(video(0), track(1.0)).is_err());
    let s = CombinedStream::new(video(3), track(1.0)).unwrap();
    assert_eq!(s.video().frames, 3);
    assert_eq!(s.audio().frames(), 1000);
}

#[test]
fn webm_is_preferred() {
    assert_eq!(MuxProfile::choose(|_| true), Some(MuxProfile::WEBM_VP8_OPUS));
    assert_eq!(MuxProfile::WEBM_VP8_OPUS.mime_type, "video/webm;codecs=vp8,opus");
}

#[test]
fn in_memory_records_manifest() {
    let mut m = InMemoryMuxer::new();
    assert!(m.begin(request(2)).is_err());
    m.negotiate().unwrap();
    m.begin(request(2)).unwrap();
    assert!(m.is_recording());

    let a = FrameRGBA::new(4, 2);
    let mut b = FrameRGBA::new(4, 2);
    b.data[0] = 9;
    m.push_frame(FrameIndex(0), &a).unwrap();
    m.push_frame(FrameIndex(1), &b).unwrap();
    let asset = m.finish().unwrap();
    assert_eq!(asset.frames, 2);
    assert!(!m.is_recording());

    let bytes = asset.asset.read_bytes().unwrap();
    let manifest: MemoryManifest = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(&manifest, m.manifest().unwrap());
    assert_eq!(manifest.frame_hashes, vec![a.fingerprint(), b.fingerprint()]);
    assert_eq!(manifest.audio_frames, 1000);
    assert_eq!(manifest.asset_name, "narration_video_x");
}

#[test]
fn in_memory_rejects_out_of_order_and_mismatched_frames() {
    let mut m = InMemoryMuxer::new();
    m.negotiate().unwrap();
    m.begin(request(2)).unwrap();
    let err = m.push_frame(FrameIndex(1), &FrameRGBA::new(4, 2)).unwrap_err();
    assert!(matches!(err, VoxframeError::Capture(_)));
    let err = m.push_frame(FrameIndex(0), &FrameRGBA::new(2, 2)).unwrap_err();
    assert!(matches!(err, VoxframeError::Capture(_)));
}

#[test]
fn abort_discards_session() {
    let mut m = InMemoryMuxer::new();
    m.negotiate().unwrap();
    m.begin(request(1)).unwrap();
    m.abort();
    m.abort();
    assert_eq!(m.aborted(), 1);
    assert!(m.finish().is_err());
    assert!(m.manifest().is_none());
}
