use super::*;

#[test]
fn reports_are_monotonic_and_bounded() {
    let mut seen = Vec::<(f64, String)>::new();
    {
        let mut sink = |pct: f64, status: &str| seen.push((pct, status.to_string()));
        let mut r = ProgressReporter::new(&mut sink, 100, 10);
        r.stage_started(0, "a".to_string());
        for f in 1..=60 {
            r.frame_done(f);
        }
        r.stage_started(60, "b".to_string());
        r.frame_done(65);
        r.frame_done(75);
        r.status("flush");
        r.complete("done");
    }

    assert_eq!(seen.first().map(|(p, _)| *p), Some(0.0));
    assert_eq!(seen.last(), Some(&(100.0, "done".to_string())));
    for w in seen.windows(2) {
        assert!(w[1].0 >= w[0].0, "{seen:?}");
    }
    assert!(seen.iter().all(|(p, _)| (0.0..=100.0).contains(p)));
    assert!(seen.iter().any(|(p, s)| *p == 30.0 && s == "a"));
    assert!(seen.iter().any(|(p, s)| *p == 60.0 && s == "b"));
}

#[test]
fn interval_throttles_in_stage_updates() {
    let mut count = 0usize;
    {
        let mut sink = |_: f64, _: &str| count += 1;
        let mut r = ProgressReporter::new(&mut sink, 1000, 100);
        for f in 1..=1000 {
            r.frame_done(f);
        }
        assert_eq!(r.last_percent(), 100.0);
    }
    assert_eq!(count, 10);
}
