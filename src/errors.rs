// Error types for lapline

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum LaplineError {
    // Lap loading errors
    #[snafu(display("Invalid lap file: {path}"))]
    InvalidLapFile { path: String },
    #[snafu(display("Error reading lap file {path}"))]
    LapReadError { path: String, source: io::Error },
    #[snafu(display("Error parsing lap file {path}"))]
    LapParseError {
        path: String,
        source: serde_json::Error,
    },
    #[snafu(display("Invalid channel data for {key}: {reason}"))]
    InvalidChannelData { key: String, reason: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
    #[snafu(display("Invalid chart configuration: {reason}"))]
    InvalidChartConfig { reason: String },

    // Track map output errors
    #[snafu(display("Error writing track map to {path}"))]
    TrackMapWriteError { path: String, source: io::Error },
    #[snafu(display("Track map rendering failed: {reason}"))]
    TrackMapRenderError { reason: String },
}

/// Local, non-fatal lookup failures. Correlation never lets these escape: each
/// one collapses into an absent value for the field that asked.
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum LookupError {
    #[snafu(display("Channel has no samples"))]
    EmptyChannel,
    #[snafu(display("Distance {distance}m outside recorded domain [{min}, {max}]"))]
    OutOfDomain { distance: f64, min: f64, max: f64 },
    #[snafu(display("No track path available for lap"))]
    MissingTrackPath,
}
