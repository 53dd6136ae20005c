use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TripReelError::config("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        TripReelError::resource("x")
            .to_string()
            .contains("resource load error:")
    );
    assert!(
        TripReelError::surface("x")
            .to_string()
            .contains("surface initialization error:")
    );
    assert!(
        TripReelError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
    assert_eq!(TripReelError::Cancelled.to_string(), "run cancelled");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TripReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_cancelled());
    assert!(TripReelError::Cancelled.is_cancelled());
}
