use super::*;

fn timeline(durations: &[f64]) -> CaptionTimeline {
    CaptionTimeline::from_durations(durations.iter().copied()).unwrap()
}

#[test]
fn single_section_is_active_everywhere() {
    let t = timeline(&[3.0]);
    assert_eq!(t.active_section(0.0), 0);
    assert_eq!(t.active_section(2.999), 0);
    assert_eq!(t.active_section(3.0), 0);
    assert_eq!(t.active_section(1_000.0), 0);
}

#[test]
fn boundaries_switch_to_the_next_section() {
    let t = timeline(&[15.0, 18.0, 17.0, 12.0]);
    assert_eq!(t.total(), 62.0);
    assert_eq!(t.active_section(0.0), 0);
    assert_eq!(t.active_section(14.99), 0);
    assert_eq!(t.active_section(15.0), 1);
    assert_eq!(t.active_section(32.99), 1);
    assert_eq!(t.active_section(33.0), 2);
    assert_eq!(t.active_section(50.0), 3);
    assert_eq!(t.active_section(62.0), 3);
    assert_eq!(t.active_section(90.0), 3);
}

#[test]
fn selection_is_total_and_monotonic() {
    let t = timeline(&[0.4, 1.3, 0.05, 2.0, 0.7]);
    let mut prev = 0usize;
    let steps = 10_000;
    for i in 0..=steps {
        let elapsed = t.total() * 1.2 * f64::from(i) / f64::from(steps);
        let idx = t.active_section(elapsed);
        assert!(idx < t.len());
        assert!(idx >= prev, "index decreased at t={elapsed}");
        prev = idx;
    }
    assert_eq!(prev, t.len() - 1);
}

#[test]
fn negative_and_nan_elapsed_clamp_to_start() {
    let t = timeline(&[1.0, 1.0]);
    assert_eq!(t.active_section(-5.0), 0);
    assert_eq!(t.active_section(f64::NAN), 0);
}

#[test]
fn section_start_matches_cumulative_ends() {
    let t = timeline(&[2.0, 3.0, 4.0]);
    assert_eq!(t.section_start(0), 0.0);
    assert_eq!(t.section_start(1), 2.0);
    assert_eq!(t.section_start(2), 5.0);
}

#[test]
fn rejects_empty_and_non_positive_durations() {
    assert!(CaptionTimeline::from_durations(Vec::<f64>::new()).is_err());
    assert!(CaptionTimeline::from_durations([1.0, 0.0]).is_err());
    assert!(CaptionTimeline::from_durations([f64::NAN]).is_err());
}
