use super::*;

fn fifty_fps() -> Fps {
    Fps::new(50, 1).unwrap()
}

#[test]
fn offline_clock_never_sleeps() {
    let mut clock = FrameClock::new(fifty_fps(), Pacing::Offline);
    let t0 = Instant::now();
    clock.wait_for(FrameIndex(0));
    clock.wait_for(FrameIndex(1_000));
    assert!(t0.elapsed() < Duration::from_millis(50));
}

#[test]
fn realtime_clock_waits_for_the_frame_deadline() {
    let mut clock = FrameClock::new(fifty_fps(), Pacing::Realtime);
    let t0 = Instant::now();
    clock.wait_for(FrameIndex(0));
    clock.wait_for(FrameIndex(5));
    // Frame 5 at 50 fps is due 100ms after frame 0.
    assert!(t0.elapsed() >= Duration::from_millis(95), "{:?}", t0.elapsed());
}

#[test]
fn realtime_clock_does_not_wait_for_frames_already_due() {
    let mut clock = FrameClock::new(fifty_fps(), Pacing::Realtime);
    clock.wait_for(FrameIndex(0));
    std::thread::sleep(Duration::from_millis(30));
    let t0 = Instant::now();
    clock.wait_for(FrameIndex(1));
    assert!(t0.elapsed() < Duration::from_millis(15));
}

#[test]
fn elapsed_time_ignores_pacing() {
    let offline = FrameClock::new(fifty_fps(), Pacing::Offline);
    let realtime = FrameClock::new(fifty_fps(), Pacing::Realtime);
    assert_eq!(offline.elapsed_secs(FrameIndex(25)), 0.5);
    assert_eq!(
        offline.elapsed_secs(FrameIndex(25)),
        realtime.elapsed_secs(FrameIndex(25))
    );
    assert_eq!(realtime.fps(), fifty_fps());
}
