use super::*;

fn chunk(sample_rate: u32, channels: u16, samples: Vec<f32>) -> PcmChunk {
    PcmChunk {
        sample_rate,
        channels,
        samples,
    }
}

#[test]
fn finish_appends_silent_tail() {
    let ledger = ResourceLedger::new();
    let mut cap = AudioCapture::open(&ledger, Duration::from_millis(100));
    cap.push(chunk(1000, 1, vec![0.5; 1000])).unwrap();
    let track = cap.finish().unwrap();
    assert_eq!(track.sample_rate, 1000);
    assert_eq!(track.frames(), 1100);
    assert!((track.duration_secs() - 1.1).abs() < 1e-9);
    assert_eq!(track.samples[999], 0.5);
    assert_eq!(track.samples[1099], 0.0);
}

#[test]
fn samples_are_clamped() {
    let ledger = ResourceLedger::new();
    let mut cap = AudioCapture::open(&ledger, Duration::ZERO);
    cap.push(chunk(8000, 2, vec![2.0, -3.0])).unwrap();
    let track = cap.finish().unwrap();
    assert_eq!(track.samples.as_slice(), &[1.0, -1.0]);
}

#[test]
fn format_change_mid_stream_is_rejected() {
    let ledger = ResourceLedger::new();
    let mut cap = AudioCapture::open(&ledger, Duration::ZERO);
    cap.push(chunk(22_050, 1, vec![0.0; 10])).unwrap();
    let err = cap.push(chunk(48_000, 1, vec![0.0; 10])).unwrap_err();
    assert!(matches!(err, VoxframeError::Synthesis(_)));
}

#[test]
fn partial_frames_are_rejected() {
    let ledger = ResourceLedger::new();
    let mut cap = AudioCapture::open(&ledger, Duration::ZERO);
    assert!(cap.push(chunk(22_050, 2, vec![0.0; 3])).is_err());
}

#[test]
fn empty_capture_is_a_synthesis_error() {
    let ledger = ResourceLedger::new();
    let cap = AudioCapture::open(&ledger, Duration::ZERO);
    assert!(matches!(cap.finish(), Err(VoxframeError::Synthesis(_))));
}

#[test]
fn ledger_slot_is_released_on_finish_and_drop() {
    let ledger = ResourceLedger::new();
    {
        let _cap = AudioCapture::open(&ledger, Duration::ZERO);
        assert_eq!(ledger.live(ResourceKind::AudioCapture), 1);
    }
    assert_eq!(ledger.live(ResourceKind::AudioCapture), 0);

    let mut cap = AudioCapture::open(&ledger, Duration::ZERO);
    cap.push(chunk(100, 1, vec![0.1; 100])).unwrap();
    assert!((cap.captured_secs() - 1.0).abs() < 1e-9);
    let _track = cap.finish().unwrap();
    assert_eq!(ledger.live(ResourceKind::AudioCapture), 0);
}
