// Integration tests for loading laps from disk

use std::fs;

use lapline::telemetry::Corner;
use lapline::telemetry::loader::{load_lap, load_lap_jsonl, load_track_path};
use lapline::{AppConfig, ChannelId, LaplineError, LapView};
use tempfile::TempDir;

const TELEMETRY_JSON: &str = r##"{
    "speed": {
        "label": "Speed",
        "data": [{"x": 0, "y": 150.5}, {"x": 5, "y": 152.0}, {"x": 10, "y": 153.25}],
        "borderColor": "#ef4444",
        "interpolate": true
    },
    "throttle": {"label": "Throttle", "data": [{"x": 0, "y": 100}, {"x": 10, "y": 0}]},
    "brake": {"label": "Brake", "data": [{"x": 0, "y": 0}, {"x": 10, "y": 80}]},
    "gear": {"label": "Gear", "data": [{"x": 0, "y": 4}, {"x": 10, "y": 3}], "stepped": true},
    "tireTemp": {
        "fl": {"label": "FL", "data": [{"x": 0, "y": 85.1}]},
        "fr": {"label": "FR", "data": [{"x": 0, "y": 86.4}]}
    }
}"##;

const TRACK_PATH_JSON: &str = r#"[
    {"distance": 0, "x": 10.5, "y": -4},
    {"distance": 5, "x": 12, "y": -3.5},
    {"distance": 10, "x": 14, "y": -2}
]"#;

#[test]
fn test_load_lap_from_json_files() {
    let temp_dir = TempDir::new().unwrap();
    let telemetry_path = temp_dir.path().join("telemetry.json");
    let track_path = temp_dir.path().join("track_path.json");
    fs::write(&telemetry_path, TELEMETRY_JSON).unwrap();
    fs::write(&track_path, TRACK_PATH_JSON).unwrap();

    let lap = load_lap("lap 3", &telemetry_path, Some(&track_path)).unwrap();
    assert_eq!(lap.name, "lap 3");
    assert_eq!(lap.telemetry.len(), 6);
    assert!(lap.telemetry.get(ChannelId::Gear).unwrap().stepped);
    assert!(
        lap.telemetry
            .get(ChannelId::TireTemp(Corner::FrontRight))
            .is_some()
    );
    assert_eq!(lap.track_path().unwrap().len(), 3);

    let view = LapView::from_config(lap, &AppConfig::default());
    assert_eq!(view.position_at(6.0).unwrap().x, 12.0);
    assert_eq!(view.segments().len(), 2);
}

#[test]
fn test_load_lap_without_track_path() {
    let temp_dir = TempDir::new().unwrap();
    let telemetry_path = temp_dir.path().join("telemetry.json");
    fs::write(&telemetry_path, TELEMETRY_JSON).unwrap();

    let lap = load_lap("lap", &telemetry_path, None).unwrap();
    assert!(lap.track_path().is_err());
}

#[test]
fn test_load_lap_jsonl_recording() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lap.jsonl");
    let rows = [
        r#"{"distance": 0.0, "x": 0.0, "y": 0.0, "speed": 100.0, "throttle": 90.0, "abs": false}"#,
        r#"{"distance": 1.0, "x": 1.0, "y": 0.5, "speed": 101.0, "throttle": 90.0, "abs": true}"#,
        r#"{"distance": 2.0, "speed": 102.0, "brake": 40.0, "boost": 1.2}"#,
    ];
    fs::write(&path, rows.join("\n")).unwrap();

    let lap = load_lap_jsonl("recorded", &path).unwrap();
    assert_eq!(lap.track_path().unwrap().len(), 2);
    assert_eq!(lap.telemetry.get(ChannelId::Speed).unwrap().samples().len(), 3);
    let abs = lap.telemetry.get(ChannelId::Abs).unwrap();
    assert_eq!(abs.samples()[1].value, 1.0);
    assert!(lap.telemetry.get(ChannelId::Brake).is_some());
    assert_eq!(lap.telemetry.len(), 4);
}

#[test]
fn test_loader_errors() {
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("missing.json");
    assert!(matches!(
        load_track_path(&missing),
        Err(LaplineError::InvalidLapFile { .. })
    ));
    assert!(matches!(
        load_lap_jsonl("lap", &missing),
        Err(LaplineError::InvalidLapFile { .. })
    ));

    let broken = temp_dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        load_lap("lap", &broken, None),
        Err(LaplineError::LapParseError { .. })
    ));

    let broken_rows = temp_dir.path().join("broken.jsonl");
    fs::write(&broken_rows, "{\"distance\": 0}\nnope\n").unwrap();
    assert!(matches!(
        load_lap_jsonl("lap", &broken_rows),
        Err(LaplineError::LapReadError { .. })
    ));
}
