use super::*;

#[test]
fn guards_release_on_drop() {
    let ledger = ResourceLedger::new();
    let a = ledger.acquire(ResourceKind::Recorder);
    let b = ledger.acquire(ResourceKind::Recorder);
    let c = ledger.acquire(ResourceKind::TempHandle);
    assert_eq!(a.kind(), ResourceKind::Recorder);
    assert_eq!(
        ledger.snapshot(),
        ResourceSnapshot {
            audio_captures: 0,
            recorders: 2,
            temp_handles: 1,
        }
    );
    drop(a);
    assert_eq!(ledger.live(ResourceKind::Recorder), 1);
    drop((b, c));
    assert!(ledger.snapshot().is_idle());
}

#[test]
fn clones_share_counts() {
    let ledger = ResourceLedger::new();
    let other = ledger.clone();
    let g = other.acquire(ResourceKind::AudioCapture);
    assert_eq!(ledger.live(ResourceKind::AudioCapture), 1);
    std::thread::spawn(move || drop(g)).join().unwrap();
    assert!(ledger.snapshot().is_idle());
}
