use super::*;

fn stop(id: &str, lat: Option<f64>, lon: Option<f64>) -> StopGroup {
    StopGroup {
        stop: Stop {
            id: id.to_string(),
            title: format!("Stop {id}"),
            lat,
            lon,
        },
        photos: vec![],
    }
}

#[test]
fn parse_camel_case_trip_json() {
    let json = r#"{
        "title": "Alps",
        "groups": [
            {"stop": {"id": "a", "title": "Zurich", "lat": 47.37, "lon": 8.54},
             "photos": [{"id": "p1", "url": "file:///tmp/p1.jpg", "caption": "lake"}]},
            {"stop": {"id": "b", "title": "Milan", "lat": 45.46, "lon": 9.19}}
        ],
        "transport": {"a-b": "rail"},
        "start": {"title": "Home", "lat": 48.1, "lon": 11.6, "mode": "air"}
    }"#;
    let trip = TripInput::from_reader(json.as_bytes()).unwrap();
    assert_eq!(trip.groups.len(), 2);
    assert_eq!(trip.groups[0].photos[0].caption.as_deref(), Some("lake"));
    assert_eq!(trip.mode_between("a", "b"), TransportMode::Rail);
    assert_eq!(trip.start.as_ref().unwrap().mode, TransportMode::Air);
    assert_eq!(trip.photo_count(), 1);
    trip.validate().unwrap();
}

#[test]
fn missing_leg_defaults_to_road() {
    let trip = TripInput::default();
    assert_eq!(trip.mode_between("x", "y"), TransportMode::Road);
    assert_eq!(leg_key("x", "y"), "x-y");
}

#[test]
fn validate_rejects_empty_and_missing_coordinates() {
    let empty = TripInput::default();
    assert!(matches!(empty.validate(), Err(TripReelError::Config(_))));

    for (lat, lon) in [(None, Some(1.0)), (Some(1.0), None), (Some(100.0), Some(1.0))] {
        let trip = TripInput {
            title: "t".to_string(),
            groups: vec![stop("a", Some(1.0), Some(1.0)), stop("b", lat, lon)],
            ..TripInput::default()
        };
        let err = trip.validate().unwrap_err();
        assert!(matches!(err, TripReelError::Config(_)), "{err}");
        assert!(err.to_string().contains("Stop b"));
    }
}

#[test]
fn transport_glyphs_are_distinct() {
    let modes = [
        TransportMode::Air,
        TransportMode::Rail,
        TransportMode::Road,
        TransportMode::Sea,
    ];
    for (i, a) in modes.iter().enumerate() {
        for b in &modes[i + 1..] {
            assert_ne!(a.glyph(), b.glyph());
        }
    }
}
