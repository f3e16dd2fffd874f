// Lap loaders for the telemetry and track path provider formats

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use super::{Channel, ChannelId, Lap, LapTelemetry, Sample, TrackPathPoint};
use crate::errors::LaplineError;

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct RawDataset {
    label: Option<String>,
    data: Vec<RawPoint>,
    #[serde(default)]
    stepped: Option<bool>,
    #[serde(default)]
    interpolate: bool,
}

/// A channel is either a full chart dataset or a bare list of points.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawChannel {
    Dataset(RawDataset),
    Points(Vec<RawPoint>),
}

/// One row of a JSON-lines lap recording.
#[derive(Deserialize)]
struct RecordedSample {
    distance: f64,
    x: Option<f64>,
    y: Option<f64>,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

fn read_json(path: &Path) -> Result<Value, LaplineError> {
    if !path.exists() {
        return Err(LaplineError::InvalidLapFile {
            path: format!("{:?}", path),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| LaplineError::LapReadError {
        path: format!("{:?}", path),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| LaplineError::LapParseError {
        path: format!("{:?}", path),
        source: e,
    })
}

fn build_channel(id: ChannelId, raw: Value) -> Result<Channel, LaplineError> {
    let raw: RawChannel =
        serde_json::from_value(raw).map_err(|e| LaplineError::InvalidChannelData {
            key: id.key(),
            reason: e.to_string(),
        })?;
    let channel = match raw {
        RawChannel::Dataset(dataset) => {
            let samples = dataset
                .data
                .into_iter()
                .map(|p| Sample::new(p.x, p.y))
                .collect();
            let mut channel = Channel::new(id, samples).with_interpolate(dataset.interpolate);
            if let Some(label) = dataset.label {
                channel = channel.with_label(label);
            }
            if let Some(stepped) = dataset.stepped {
                channel = channel.with_stepped(stepped);
            }
            channel
        }
        RawChannel::Points(points) => Channel::new(
            id,
            points.into_iter().map(|p| Sample::new(p.x, p.y)).collect(),
        ),
    };
    Ok(channel)
}

/// Build a channel set from the provider's JSON object, keyed by channel key.
///
/// Per-corner channels may be nested (`{"tirePressure": {"fl": {...}}}`) or
/// flat (`{"tirePressure.fl": {...}}`). Unknown keys are skipped with a warning.
pub fn telemetry_from_value(value: Value) -> Result<LapTelemetry, LaplineError> {
    let Value::Object(entries) = value else {
        return Err(LaplineError::InvalidChannelData {
            key: "<root>".to_string(),
            reason: "expected an object keyed by channel".to_string(),
        });
    };

    let mut telemetry = LapTelemetry::new();
    for (key, raw) in entries {
        if ChannelId::is_grouped(&key) {
            let Value::Object(corners) = raw else {
                warn!("Skipping channel group {key}: expected an object keyed by corner");
                continue;
            };
            for (corner, raw) in corners {
                match format!("{key}.{corner}").parse::<ChannelId>() {
                    Ok(id) => telemetry.insert(build_channel(id, raw)?),
                    Err(e) => warn!("Skipping channel: {e}"),
                }
            }
            continue;
        }
        match key.parse::<ChannelId>() {
            Ok(id) => telemetry.insert(build_channel(id, raw)?),
            Err(e) => warn!("Skipping channel: {e}"),
        }
    }
    debug!("Parsed {} telemetry channels", telemetry.len());
    Ok(telemetry)
}

pub fn load_lap_telemetry(path: &Path) -> Result<LapTelemetry, LaplineError> {
    let telemetry = telemetry_from_value(read_json(path)?)?;
    info!("Loaded {:?}, found {} channels", path, telemetry.len());
    Ok(telemetry)
}

pub fn load_track_path(path: &Path) -> Result<Vec<TrackPathPoint>, LaplineError> {
    let value = read_json(path)?;
    let points: Vec<TrackPathPoint> =
        serde_json::from_value(value).map_err(|e| LaplineError::LapParseError {
            path: format!("{:?}", path),
            source: e,
        })?;
    info!("Loaded {:?}, found {} track path points", path, points.len());
    Ok(points)
}

/// Load a lap from separate telemetry and track path files.
pub fn load_lap(
    name: &str,
    telemetry_path: &Path,
    track_path: Option<&Path>,
) -> Result<Lap, LaplineError> {
    let telemetry = load_lap_telemetry(telemetry_path)?;
    let track_path = track_path.map(load_track_path).transpose()?;
    Ok(Lap::new(name, telemetry, track_path))
}

/// Load a lap from a JSON-lines recording with one row per sample.
///
/// Each row carries `distance`, optional `x`/`y` track coordinates, and any
/// number of channel values keyed by channel key. Boolean values (`tc`, `abs`)
/// are recorded as 0/1.
pub fn load_lap_jsonl(name: &str, path: &Path) -> Result<Lap, LaplineError> {
    if !path.exists() {
        return Err(LaplineError::InvalidLapFile {
            path: format!("{:?}", path),
        });
    }
    let rows = serde_jsonlines::json_lines::<RecordedSample, _>(path)
        .and_then(|lines| lines.collect::<Result<Vec<RecordedSample>, std::io::Error>>())
        .map_err(|e| LaplineError::LapReadError {
            path: format!("{:?}", path),
            source: e,
        })?;

    let mut samples: BTreeMap<ChannelId, Vec<Sample>> = BTreeMap::new();
    let mut track_path = Vec::new();
    let mut skipped_keys = 0;
    for row in rows {
        if let (Some(x), Some(y)) = (row.x, row.y) {
            track_path.push(TrackPathPoint::new(row.distance, x, y));
        }
        for (key, value) in row.values {
            let Ok(id) = key.parse::<ChannelId>() else {
                skipped_keys += 1;
                continue;
            };
            let value = match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
                _ => None,
            };
            if let Some(value) = value {
                samples
                    .entry(id)
                    .or_default()
                    .push(Sample::new(row.distance, value));
            }
        }
    }
    if skipped_keys > 0 {
        warn!("Skipped {} values with unknown channel keys", skipped_keys);
    }

    let mut telemetry = LapTelemetry::new();
    for (id, channel_samples) in samples {
        telemetry.insert(Channel::new(id, channel_samples));
    }
    info!(
        "Loaded {:?}, found {} channels and {} track path points",
        path,
        telemetry.len(),
        track_path.len()
    );
    let track_path = if track_path.is_empty() {
        None
    } else {
        Some(track_path)
    };
    Ok(Lap::new(name, telemetry, track_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Corner;
    use serde_json::json;

    #[test]
    fn test_telemetry_from_dataset_object() {
        let value = json!({
            "speed": {
                "label": "Speed (km/h)",
                "data": [{"x": 0.0, "y": 120.0}, {"x": 10.0, "y": 125.0}],
                "borderColor": "#ef4444",
                "interpolate": true
            },
            "gear": {
                "label": "Gear",
                "data": [{"x": 0.0, "y": 3.0}],
                "borderColor": "#fff",
                "stepped": true
            }
        });
        let telemetry = telemetry_from_value(value).unwrap();
        let speed = telemetry.get(ChannelId::Speed).unwrap();
        assert_eq!(speed.label, "Speed (km/h)");
        assert!(speed.interpolate);
        assert!(!speed.stepped);
        assert_eq!(speed.samples().len(), 2);
        assert!(telemetry.get(ChannelId::Gear).unwrap().stepped);
    }

    #[test]
    fn test_telemetry_nested_corner_channels_and_bare_points() {
        let value = json!({
            "tirePressure": {
                "fl": {"data": [{"x": 0.0, "y": 26.5}]},
                "rr": [{"x": 0.0, "y": 27.1}]
            },
            "throttle": [{"x": 0.0, "y": 100.0}],
            "boost": [{"x": 0.0, "y": 1.0}]
        });
        let telemetry = telemetry_from_value(value).unwrap();
        assert_eq!(telemetry.len(), 3);
        assert!(telemetry.get(ChannelId::TirePressure(Corner::FrontLeft)).is_some());
        assert!(telemetry.get(ChannelId::TirePressure(Corner::RearRight)).is_some());
        assert_eq!(telemetry.get(ChannelId::Throttle).unwrap().label, "Throttle");
    }

    #[test]
    fn test_telemetry_invalid_channel_data() {
        let value = json!({"speed": {"data": "nope"}});
        assert!(matches!(
            telemetry_from_value(value),
            Err(LaplineError::InvalidChannelData { .. })
        ));
        assert!(telemetry_from_value(json!([1, 2, 3])).is_err());
    }
}
