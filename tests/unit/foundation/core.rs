use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
    assert_eq!(r.len_frames(), 3);
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

#[test]
fn fps_ms_frames_agree_for_integer_rates() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.ms_to_frames(3000), 90);
    assert_eq!(fps.ms_to_frames(2500), 75);
    assert!((fps.frames_to_ms(90) - 3000.0).abs() < 1e-9);
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn geo_lerp_is_straight_and_clamped() {
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(10.0, 20.0);
    assert_eq!(a.lerp(b, 0.5), GeoPoint::new(5.0, 10.0));
    assert_eq!(a.lerp(b, 2.0), b);
    assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    assert!(!GeoPoint::new(0.0, 91.0).is_valid());
}

#[test]
fn bounds_from_points_orders_corners() {
    let b = GeoBounds::from_points(GeoPoint::new(10.0, -5.0), GeoPoint::new(-3.0, 8.0));
    assert_eq!(b.sw, GeoPoint::new(-3.0, -5.0));
    assert_eq!(b.ne, GeoPoint::new(10.0, 8.0));
    assert_eq!(b.center(), GeoPoint::new(3.5, 1.5));
}
