// Driving-state classification from throttle and brake channels

use serde::{Deserialize, Serialize};

use crate::telemetry::{Channel, ChannelId, LapTelemetry};

/// Inputs at or below this value are pedal noise, not real input
pub const DEFAULT_INPUT_THRESHOLD: f64 = 5.0;

/// Driving state a track path point is colored by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriveState {
    Throttle,
    Brake,
    Coast,
}

/// Exclusive thresholds, in the channels' native 0-100 scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub brake: f64,
    pub throttle: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            brake: DEFAULT_INPUT_THRESHOLD,
            throttle: DEFAULT_INPUT_THRESHOLD,
        }
    }
}

/// Classify the driving state at `distance`.
///
/// Braking wins over throttle. A pedal whose channel is missing or empty
/// counts as released, so absent data never breaks rendering and a lap with
/// no pedal data at all is drawn as coasting.
pub fn classify(
    distance: f64,
    throttle: Option<&Channel>,
    brake: Option<&Channel>,
    thresholds: &ClassifierThresholds,
) -> DriveState {
    let input = |channel: Option<&Channel>| {
        channel
            .and_then(|c| c.nearest(distance).ok())
            .map(|s| s.value)
    };

    if input(brake).is_some_and(|v| v > thresholds.brake) {
        DriveState::Brake
    } else if input(throttle).is_some_and(|v| v > thresholds.throttle) {
        DriveState::Throttle
    } else {
        DriveState::Coast
    }
}

/// Classifier bound to one lap's throttle and brake channels.
#[derive(Clone, Copy, Debug)]
pub struct DriveStateClassifier<'lap> {
    throttle: Option<&'lap Channel>,
    brake: Option<&'lap Channel>,
    thresholds: ClassifierThresholds,
}

impl<'lap> DriveStateClassifier<'lap> {
    pub fn new(telemetry: &'lap LapTelemetry, thresholds: ClassifierThresholds) -> Self {
        Self {
            throttle: telemetry.get(ChannelId::Throttle),
            brake: telemetry.get(ChannelId::Brake),
            thresholds,
        }
    }

    pub fn classify(&self, distance: f64) -> DriveState {
        classify(distance, self.throttle, self.brake, &self.thresholds)
    }
}
