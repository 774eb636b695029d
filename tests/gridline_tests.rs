use tracks_rs::core::{GridlineConfig, Gridlines, TimeScale, TimeSpan};

fn gridlines(start: f64, end: f64, panel_width: f64) -> Gridlines {
    let config = GridlineConfig::default();
    let span = TimeSpan::new(start, end).expect("span");
    let scale = TimeScale::from_width(span, panel_width - config.track_shell_width_px)
        .expect("scale");
    Gridlines::new(panel_width, span, scale, config).expect("gridlines")
}

#[test]
fn gridlines_step_through_visible_window() {
    let lines: Vec<(f64, f64)> = gridlines(0.0, 10.0, 1250.0).collect();

    assert_eq!(lines.len(), 20);
    assert_eq!(lines[0], (250.0, 0.0));
    assert_eq!(lines[1].0, 300.0);
    assert!(lines.iter().all(|&(x, _)| (250.0..=1250.0).contains(&x)));
    assert!(lines.iter().all(|&(_, time)| time < 10.0));
}

#[test]
fn gridline_step_follows_panel_density() {
    // 1250 px / 80 px per step ~ 15.6 steps over 10 s.
    assert_eq!(gridlines(0.0, 10.0, 1250.0).step(), 0.5);
}

#[test]
fn positions_left_of_track_shell_are_skipped() {
    let lines: Vec<(f64, f64)> = gridlines(0.23, 10.23, 1250.0).collect();

    let (first_x, first_time) = lines[0];
    assert!((first_time - 0.5).abs() < 1e-9);
    assert!((276.0..=277.0).contains(&first_x));
    assert!(lines.iter().all(|&(x, _)| x >= 250.0));
}

#[test]
fn gridlines_restart_from_a_clone() {
    let mut lines = gridlines(0.0, 10.0, 1250.0);
    let saved = lines.clone();
    let _ = lines.next();
    let _ = lines.next();

    let replay: Vec<(f64, f64)> = saved.collect();
    assert_eq!(replay.len(), 20);
    assert_eq!(lines.count(), 18);
}

#[test]
fn zero_width_panel_is_rejected() {
    let span = TimeSpan::new(0.0, 1.0).expect("span");
    let scale = TimeScale::from_width(span, 100.0).expect("scale");
    assert!(Gridlines::new(0.0, span, scale, GridlineConfig::default()).is_err());
}
