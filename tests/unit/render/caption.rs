use super::*;

#[test]
fn units_split_cjk_per_character_and_latin_per_word() {
    assert_eq!(display_units("你好，欢迎"), vec!["你", "好", "，", "欢", "迎"]);
    assert_eq!(
        display_units("hello world 你好"),
        vec!["hello ", "world ", "你", "好"]
    );
    assert_eq!(display_units("AI工具"), vec!["AI", "工", "具"]);
    assert!(display_units("").is_empty());
}

#[test]
fn fixed_advance_measures_wide_and_narrow() {
    let mut m = FixedAdvanceMeasure;
    assert_eq!(m.measure("你好", 60.0).unwrap(), 120.0);
    assert!((m.measure("ab", 60.0).unwrap() - 66.0).abs() < 1e-3);
    assert!(m.measure("a", 0.0).is_err());
}

#[test]
fn wraps_cjk_at_width() {
    // Ten ideographs at 10px each into a 35px line: 3 per line.
    let lines = wrap_caption("一二三四五六七八九十", 35.0, 10.0, &mut FixedAdvanceMeasure).unwrap();
    assert_eq!(lines, vec!["一二三", "四五六", "七八九", "十"]);
}

#[test]
fn oversized_unit_is_placed_alone() {
    let lines = wrap_caption(
        "a supercalifragilistic word",
        30.0,
        10.0,
        &mut FixedAdvanceMeasure,
    )
    .unwrap();
    assert_eq!(lines, vec!["a", "supercalifragilistic", "word"]);
    assert!(lines.iter().all(|l| !l.is_empty()));
}

#[test]
fn short_or_empty_text() {
    let mut m = FixedAdvanceMeasure;
    assert_eq!(wrap_caption("你好", 1000.0, 60.0, &mut m).unwrap(), vec!["你好"]);
    assert!(wrap_caption("   ", 1000.0, 60.0, &mut m).unwrap().is_empty());
}

#[test]
fn lines_never_exceed_width_unless_single_unit() {
    let text = "今天我们来聊一聊如何用 AI 工具提升工作效率，以及 three simple habits 让生活更好";
    let mut m = FixedAdvanceMeasure;
    let lines = wrap_caption(text, 200.0, 20.0, &mut m).unwrap();
    for line in &lines {
        let w = m.measure(line, 20.0).unwrap();
        assert!(w <= 200.0 || display_units(line).len() == 1, "{line} is {w}px");
    }
    let joined: String = lines.concat().chars().filter(|c| !c.is_whitespace()).collect();
    let expected: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    assert_eq!(joined, expected);
}
