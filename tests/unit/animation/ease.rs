use super::*;

#[test]
fn endpoints_are_fixed_for_every_curve() {
    for ease in [Ease::Linear, Ease::InOutQuad, Ease::OutCubic, Ease::InOutCubic] {
        assert!((ease.apply(0.0)).abs() < 1e-12, "{ease:?}");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?}");
    }
}

#[test]
fn linear_is_identity_inside_unit_interval() {
    for t in [0.1, 0.25, 0.5, 0.9] {
        assert_eq!(Ease::Linear.apply(t), t);
    }
    assert_eq!(Ease::Linear.apply(-1.0), 0.0);
    assert_eq!(Ease::Linear.apply(3.0), 1.0);
}

#[test]
fn in_out_curves_are_symmetric_at_midpoint() {
    assert!((Ease::InOutQuad.apply(0.5) - 0.5).abs() < 1e-12);
    assert!((Ease::InOutCubic.apply(0.5) - 0.5).abs() < 1e-12);
}
