pub mod loader;
pub mod nearest;

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::LookupError;
pub use nearest::{nearest, nearest_sorted};

/// A single distance-indexed reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Meters traveled since the start of the lap
    pub distance: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(distance: f64, value: f64) -> Self {
        Self { distance, value }
    }
}

/// Physical position of the car on the 2D track projection at a given distance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPathPoint {
    pub distance: f64,
    pub x: f64,
    pub y: f64,
}

impl TrackPathPoint {
    pub fn new(distance: f64, x: f64, y: f64) -> Self {
        Self { distance, x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Corner {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::FrontLeft,
        Corner::FrontRight,
        Corner::RearLeft,
        Corner::RearRight,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Corner::FrontLeft => "fl",
            Corner::FrontRight => "fr",
            Corner::RearLeft => "rl",
            Corner::RearRight => "rr",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Corner::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Closed set of telemetry channels a lap can carry.
///
/// Each id has a stable string key matching the keys used by the telemetry
/// provider (`"speed"`, `"tirePressure.fl"`, ...). The key is also the serde
/// representation, so configuration files and lap files share one vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelId {
    Speed,
    Throttle,
    Brake,
    Steering,
    Gear,
    Rpm,
    Tc,
    Abs,
    FuelLevel,
    TirePressure(Corner),
    TireWear(Corner),
    TireTemp(Corner),
    BrakeTemp(Corner),
    RideHeight(Corner),
    TimeIntoLap,
    EstimatedLapTime,
    TrackEdge,
}

impl ChannelId {
    pub fn key(&self) -> String {
        match self {
            ChannelId::TirePressure(c) => format!("tirePressure.{}", c.key()),
            ChannelId::TireWear(c) => format!("tireWear.{}", c.key()),
            ChannelId::TireTemp(c) => format!("tireTemp.{}", c.key()),
            ChannelId::BrakeTemp(c) => format!("brakeTemp.{}", c.key()),
            ChannelId::RideHeight(c) => format!("rideHeight.{}", c.key()),
            other => other.flat_key().to_string(),
        }
    }

    fn flat_key(&self) -> &'static str {
        match self {
            ChannelId::Speed => "speed",
            ChannelId::Throttle => "throttle",
            ChannelId::Brake => "brake",
            ChannelId::Steering => "steering",
            ChannelId::Gear => "gear",
            ChannelId::Rpm => "rpm",
            ChannelId::Tc => "tc",
            ChannelId::Abs => "abs",
            ChannelId::FuelLevel => "fuelLevel",
            ChannelId::TimeIntoLap => "timeIntoLap",
            ChannelId::EstimatedLapTime => "estimatedLapTime",
            ChannelId::TrackEdge => "trackEdge",
            ChannelId::TirePressure(_) => "tirePressure",
            ChannelId::TireWear(_) => "tireWear",
            ChannelId::TireTemp(_) => "tireTemp",
            ChannelId::BrakeTemp(_) => "brakeTemp",
            ChannelId::RideHeight(_) => "rideHeight",
        }
    }

    pub fn label(&self) -> String {
        let corner_label = |c: &Corner| c.key().to_uppercase();
        match self {
            ChannelId::Speed => "Speed".to_string(),
            ChannelId::Throttle => "Throttle".to_string(),
            ChannelId::Brake => "Brake".to_string(),
            ChannelId::Steering => "Steering".to_string(),
            ChannelId::Gear => "Gear".to_string(),
            ChannelId::Rpm => "RPM".to_string(),
            ChannelId::Tc => "TC".to_string(),
            ChannelId::Abs => "ABS".to_string(),
            ChannelId::FuelLevel => "Fuel Level".to_string(),
            ChannelId::TirePressure(c) => format!("Tire Pressure {}", corner_label(c)),
            ChannelId::TireWear(c) => format!("Tire Wear {}", corner_label(c)),
            ChannelId::TireTemp(c) => format!("Tire Temp {}", corner_label(c)),
            ChannelId::BrakeTemp(c) => format!("Brake Temp {}", corner_label(c)),
            ChannelId::RideHeight(c) => format!("Ride Height {}", corner_label(c)),
            ChannelId::TimeIntoLap => "Time Into Lap".to_string(),
            ChannelId::EstimatedLapTime => "Estimated Lap Time".to_string(),
            ChannelId::TrackEdge => "Track Edge".to_string(),
        }
    }

    /// Whether this channel holds per-corner values nested under a group key.
    pub fn is_grouped(key: &str) -> bool {
        matches!(
            key,
            "tirePressure" | "tireWear" | "tireTemp" | "brakeTemp" | "rideHeight"
        )
    }

    /// Channels whose values are lap times in seconds.
    pub fn is_lap_time(&self) -> bool {
        matches!(self, ChannelId::TimeIntoLap | ChannelId::EstimatedLapTime)
    }

    /// Every channel id in display order.
    pub fn all() -> Vec<ChannelId> {
        let mut ids = vec![
            ChannelId::Speed,
            ChannelId::Throttle,
            ChannelId::Brake,
            ChannelId::Steering,
            ChannelId::Gear,
            ChannelId::Rpm,
            ChannelId::FuelLevel,
        ];
        let grouped: [fn(Corner) -> ChannelId; 5] = [
            ChannelId::TirePressure,
            ChannelId::TireWear,
            ChannelId::TireTemp,
            ChannelId::BrakeTemp,
            ChannelId::RideHeight,
        ];
        for group in grouped {
            ids.extend(Corner::ALL.into_iter().map(group));
        }
        ids.extend([
            ChannelId::TimeIntoLap,
            ChannelId::EstimatedLapTime,
            ChannelId::TrackEdge,
            ChannelId::Tc,
            ChannelId::Abs,
        ]);
        ids
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for ChannelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((group, corner)) = s.split_once('.') {
            let corner =
                Corner::from_key(corner).ok_or_else(|| format!("Unknown corner in {s}"))?;
            return match group {
                "tirePressure" => Ok(ChannelId::TirePressure(corner)),
                "tireWear" => Ok(ChannelId::TireWear(corner)),
                "tireTemp" => Ok(ChannelId::TireTemp(corner)),
                "brakeTemp" => Ok(ChannelId::BrakeTemp(corner)),
                "rideHeight" => Ok(ChannelId::RideHeight(corner)),
                _ => Err(format!("Unknown channel group {group}")),
            };
        }
        match s {
            "speed" => Ok(ChannelId::Speed),
            "throttle" => Ok(ChannelId::Throttle),
            "brake" => Ok(ChannelId::Brake),
            "steering" => Ok(ChannelId::Steering),
            "gear" => Ok(ChannelId::Gear),
            "rpm" => Ok(ChannelId::Rpm),
            "tc" => Ok(ChannelId::Tc),
            "abs" => Ok(ChannelId::Abs),
            "fuelLevel" => Ok(ChannelId::FuelLevel),
            "timeIntoLap" => Ok(ChannelId::TimeIntoLap),
            "estimatedLapTime" => Ok(ChannelId::EstimatedLapTime),
            "trackEdge" => Ok(ChannelId::TrackEdge),
            _ => Err(format!("Unknown channel {s}")),
        }
    }
}

impl TryFrom<String> for ChannelId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelId> for String {
    fn from(value: ChannelId) -> Self {
        value.key()
    }
}

/// Recorded distance range of a sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    /// Domain over the finite distances produced by `distances`, or `None` if there are none.
    pub fn of(distances: impl IntoIterator<Item = f64>) -> Option<Self> {
        distances
            .into_iter()
            .filter(|d| d.is_finite())
            .fold(None, |acc: Option<Domain>, d| match acc {
                None => Some(Domain { min: d, max: d }),
                Some(domain) => Some(Domain {
                    min: domain.min.min(d),
                    max: domain.max.max(d),
                }),
            })
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }

    pub fn check(&self, distance: f64) -> Result<(), LookupError> {
        if self.contains(distance) {
            Ok(())
        } else {
            Err(LookupError::OutOfDomain {
                distance,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Named, distance-ordered telemetry signal for one lap. Immutable once built.
#[derive(Clone, Debug)]
pub struct Channel {
    pub id: ChannelId,
    pub label: String,
    samples: Vec<Sample>,
    /// Render as steps; values read out as integers
    pub stepped: bool,
    pub interpolate: bool,
    sorted: bool,
    domain: Option<Domain>,
}

impl Channel {
    pub fn new(id: ChannelId, samples: Vec<Sample>) -> Self {
        let sorted = samples
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance);
        let domain = Domain::of(samples.iter().map(|s| s.distance));
        Self {
            id,
            label: id.label(),
            samples,
            stepped: id == ChannelId::Gear,
            interpolate: false,
            sorted,
            domain,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_stepped(mut self, stepped: bool) -> Self {
        self.stepped = stepped;
        self
    }

    pub fn with_interpolate(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn domain(&self) -> Option<Domain> {
        self.domain
    }

    /// Closest sample to `target`, clamping to the channel edges.
    pub fn nearest(&self, target: f64) -> Result<&Sample, LookupError> {
        if self.sorted {
            nearest_sorted(&self.samples, target)
        } else {
            nearest(&self.samples, target)
        }
    }

    /// Closest sample to `target`, rejecting distances outside the recorded domain.
    pub fn sample_at(&self, target: f64) -> Result<&Sample, LookupError> {
        let domain = self.domain.ok_or(LookupError::EmptyChannel)?;
        domain.check(target)?;
        self.nearest(target)
    }
}

/// All channels recorded for one lap.
#[derive(Clone, Debug, Default)]
pub struct LapTelemetry {
    channels: BTreeMap<ChannelId, Channel>,
}

impl LapTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: Channel) {
        self.channels.insert(channel.id, channel);
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.insert(channel);
        self
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Domain of the speed channel, falling back to the widest channel domain.
    pub fn lap_domain(&self) -> Option<Domain> {
        if let Some(domain) = self.get(ChannelId::Speed).and_then(|c| c.domain()) {
            return Some(domain);
        }
        self.channels
            .values()
            .filter_map(|c| c.domain())
            .reduce(|a, b| Domain {
                min: a.min.min(b.min),
                max: a.max.max(b.max),
            })
    }
}

/// One lap as delivered by the telemetry and track path providers.
#[derive(Clone, Debug, Default)]
pub struct Lap {
    pub name: String,
    pub telemetry: LapTelemetry,
    /// `None` when the provider had no position data for the lap
    pub track_path: Option<Vec<TrackPathPoint>>,
}

impl Lap {
    pub fn new(
        name: impl Into<String>,
        telemetry: LapTelemetry,
        track_path: Option<Vec<TrackPathPoint>>,
    ) -> Self {
        Self {
            name: name.into(),
            telemetry,
            track_path,
        }
    }

    /// Track path points, treating an empty sequence the same as a missing one.
    pub fn track_path(&self) -> Result<&[TrackPathPoint], LookupError> {
        match &self.track_path {
            Some(points) if !points.is_empty() => Ok(points),
            _ => Err(LookupError::MissingTrackPath),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_keys_round_trip() {
        for id in ChannelId::all() {
            let parsed: ChannelId = id.key().parse().unwrap();
            assert_eq!(parsed, id);
        }
        assert_eq!(ChannelId::all().len(), 32);
    }

    #[test]
    fn test_channel_id_grouped_keys() {
        assert_eq!(
            "tirePressure.fl".parse::<ChannelId>(),
            Ok(ChannelId::TirePressure(Corner::FrontLeft))
        );
        assert_eq!(ChannelId::BrakeTemp(Corner::RearRight).key(), "brakeTemp.rr");
        assert_eq!(ChannelId::RideHeight(Corner::FrontRight).label(), "Ride Height FR");
        assert!("tirePressure.xx".parse::<ChannelId>().is_err());
        assert!("boost".parse::<ChannelId>().is_err());
    }

    #[test]
    fn test_channel_id_serializes_as_key() {
        let json = serde_json::to_string(&ChannelId::TireTemp(Corner::RearLeft)).unwrap();
        assert_eq!(json, "\"tireTemp.rl\"");
        let id: ChannelId = serde_json::from_str("\"speed\"").unwrap();
        assert_eq!(id, ChannelId::Speed);
    }

    #[test]
    fn test_channel_domain_and_rejection() {
        let channel = Channel::new(
            ChannelId::Speed,
            vec![Sample::new(0.0, 100.0), Sample::new(50.0, 120.0)],
        );
        assert_eq!(channel.domain(), Some(Domain { min: 0.0, max: 50.0 }));
        assert_eq!(channel.sample_at(49.0).unwrap().value, 120.0);
        assert!(matches!(
            channel.sample_at(60.0),
            Err(LookupError::OutOfDomain { .. })
        ));
        // nearest clamps instead of rejecting
        assert_eq!(channel.nearest(60.0).unwrap().value, 120.0);
    }

    #[test]
    fn test_empty_channel() {
        let channel = Channel::new(ChannelId::Brake, vec![]);
        assert!(channel.is_empty());
        assert_eq!(channel.sample_at(10.0), Err(LookupError::EmptyChannel));
        assert_eq!(channel.nearest(10.0), Err(LookupError::EmptyChannel));
    }

    #[test]
    fn test_gear_defaults_to_stepped() {
        assert!(Channel::new(ChannelId::Gear, vec![]).stepped);
        assert!(!Channel::new(ChannelId::Speed, vec![]).stepped);
    }

    #[test]
    fn test_lap_domain_prefers_speed() {
        let telemetry = LapTelemetry::new()
            .with_channel(Channel::new(
                ChannelId::Throttle,
                vec![Sample::new(0.0, 0.0), Sample::new(900.0, 0.0)],
            ))
            .with_channel(Channel::new(
                ChannelId::Speed,
                vec![Sample::new(2.0, 0.0), Sample::new(800.0, 0.0)],
            ));
        assert_eq!(telemetry.lap_domain(), Some(Domain { min: 2.0, max: 800.0 }));
    }

    #[test]
    fn test_missing_track_path() {
        let lap = Lap::new("lap", LapTelemetry::new(), Some(vec![]));
        assert_eq!(lap.track_path(), Err(LookupError::MissingTrackPath));
        let lap = Lap::new("lap", LapTelemetry::new(), None);
        assert_eq!(lap.track_path(), Err(LookupError::MissingTrackPath));
    }
}
