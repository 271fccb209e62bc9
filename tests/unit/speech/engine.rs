use super::*;

fn voices() -> Vec<Voice> {
    vec![
        Voice::new("en-us", "English (America)", "en-us"),
        Voice::new("cmn", "Chinese (Mandarin)", "cmn").with_aliases(["zh-cmn", "zh"]),
        Voice::new("yue", "Chinese (Cantonese)", "yue").with_aliases(["zh-yue"]),
    ]
}

#[test]
fn locale_prefix_matches_alias() {
    let v = voices();
    let picked = select_voice(&v, "zh-CN").unwrap();
    assert_eq!(picked.id, "cmn");
}

#[test]
fn locale_prefix_matches_primary_language_case_insensitively() {
    let v = voices();
    assert_eq!(select_voice(&v, "EN_GB").unwrap().id, "en-us");
}

#[test]
fn no_match_falls_back_to_engine_default() {
    let v = voices();
    assert!(select_voice(&v, "fr-FR").is_none());
    assert!(select_voice(&v, "").is_none());
    assert!(select_voice(&[], DEFAULT_LOCALE).is_none());
}
