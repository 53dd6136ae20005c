use super::*;

fn metrics() -> FixedAdvance {
    FixedAdvance { advance_em: 0.5 }
}

#[test]
fn fixed_advance_counts_chars_not_bytes() {
    let mut m = metrics();
    assert_eq!(m.width("abcd", 10.0), 20.0);
    assert_eq!(m.width("éé", 10.0), 10.0);
}

#[test]
fn wrap_is_greedy() {
    let mut m = metrics();
    // 5px per char at size 10; "aaa bbb" is 35px.
    let lines = word_wrap(&mut m, "aaa bbb ccc dddd", 10.0, 35.0);
    assert_eq!(lines, vec!["aaa bbb", "ccc", "dddd"]);
}

#[test]
fn wrap_keeps_oversized_word_on_own_line() {
    let mut m = metrics();
    let lines = word_wrap(&mut m, "a verylongword b", 10.0, 20.0);
    assert_eq!(lines, vec!["a", "verylongword", "b"]);
}

#[test]
fn wrap_of_blank_text_is_empty() {
    let mut m = metrics();
    assert!(word_wrap(&mut m, "   ", 10.0, 100.0).is_empty());
}

#[test]
fn truncate_leaves_fitting_text_alone() {
    let mut m = metrics();
    assert_eq!(truncate_to_width(&mut m, "Lisbon", 10.0, 30.0), "Lisbon");
}

#[test]
fn truncate_yields_prefix_plus_ellipsis_within_width() {
    let mut m = metrics();
    let text = "Santiago de Compostela Cathedral";
    for max in [12.0f32, 25.0, 40.0, 77.0, 120.0] {
        let out = truncate_to_width(&mut m, text, 10.0, max);
        assert!(out.ends_with('…'), "{out}");
        let prefix = out.trim_end_matches('…');
        assert!(text.starts_with(prefix));
        assert!(prefix.len() < text.len());
        assert!(m.width(&out, 10.0) <= max, "{out} wider than {max}");
    }
}

#[test]
fn truncate_trims_whitespace_before_ellipsis() {
    let mut m = metrics();
    // "Rio " + "…" would be 25px; trimmed "Rio…" is 20px.
    let out = truncate_to_width(&mut m, "Rio de Janeiro", 10.0, 25.0);
    assert_eq!(out, "Rio…");
}

#[test]
fn truncate_budget_below_ellipsis_is_empty() {
    let mut m = metrics();
    assert_eq!(truncate_to_width(&mut m, "Paris", 10.0, 1.0), "");
    let ellipsis = m.width("…", 10.0);
    assert_eq!(truncate_to_width(&mut m, "Paris", 10.0, ellipsis), "…");
}

#[test]
fn engine_without_font_uses_fallback_metrics() {
    let mut engine = TextEngine::new(None);
    assert!(!engine.has_font());
    assert_eq!(
        engine.width("abc", 20.0),
        FixedAdvance::default().width("abc", 20.0)
    );
}

#[test]
fn invalid_font_bytes_are_a_config_error() {
    let err = TextLayoutEngine::from_font_bytes(vec![0u8; 16])
        .err()
        .expect("garbage is not a font");
    assert!(matches!(err, TripReelError::Config(_)));
}
