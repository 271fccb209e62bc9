use super::*;

fn system_font() -> Option<Vec<u8>> {
    let path = std::env::var("VOXFRAME_TEST_FONT")
        .unwrap_or_else(|_| "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string());
    std::fs::read(path).ok()
}

#[test]
fn rejects_bytes_that_are_not_a_font() {
    assert!(TextLayoutEngine::from_font_bytes(b"nope".to_vec()).is_err());
}

#[test]
fn measure_width_grows_with_text() {
    let Some(bytes) = system_font() else {
        return;
    };
    let mut engine = TextLayoutEngine::from_font_bytes(bytes).unwrap();
    assert!(!engine.family_name().is_empty());

    let short = engine.measure_width("ab", 60.0).unwrap();
    let long = engine.measure_width("abab", 60.0).unwrap();
    assert!(short > 0.0);
    assert!(long > short * 1.5);
    assert_eq!(engine.measure_width("", 60.0).unwrap(), 0.0);
}

#[test]
fn invalid_size_is_rejected() {
    let Some(bytes) = system_font() else {
        return;
    };
    let mut engine = TextLayoutEngine::from_font_bytes(bytes).unwrap();
    assert!(engine.layout_line("a", 0.0, TextBrush::WHITE).is_err());
    assert!(engine.layout_line("a", f32::NAN, TextBrush::WHITE).is_err());
}

#[test]
fn single_face_files_use_face_zero() {
    let Some(bytes) = system_font() else {
        return;
    };
    let engine = TextLayoutEngine::from_font_bytes(bytes).unwrap();
    assert_eq!(engine.font_index(), 0);
}

#[test]
fn system_discovery_yields_a_usable_font() {
    let Some(mut engine) = TextLayoutEngine::from_system_fonts() else {
        return;
    };
    assert!(!engine.family_name().is_empty());
    assert!(!engine.font_bytes().is_empty());
    assert!(engine.measure_width("ab", 40.0).unwrap() > 0.0);
}
