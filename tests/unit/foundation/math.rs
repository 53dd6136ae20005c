use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_zero_alpha_clears_color() {
    let mut px = vec![200u8, 100, 50, 0, 255, 255, 255, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 255, 255, 255, 255]);
}

#[test]
fn fade_envelope_ramps_and_holds() {
    assert_eq!(fade_in_out(0.0, 0.3), 0.0);
    assert!((fade_in_out(0.15, 0.3) - 0.5).abs() < 1e-9);
    assert_eq!(fade_in_out(0.5, 0.3), 1.0);
    assert!((fade_in_out(0.85, 0.3) - 0.5).abs() < 1e-9);
    assert_eq!(fade_in_out(1.0, 0.3), 0.0);
}

#[test]
fn window_progress_hits_both_ends() {
    assert_eq!(window_progress(0, 10), 0.0);
    assert_eq!(window_progress(9, 10), 1.0);
    assert_eq!(window_progress(42, 10), 1.0);
    assert_eq!(window_progress(0, 1), 1.0);
}
