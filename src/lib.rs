// Library interface for lapline
// This allows integration tests and benches to access internal modules

pub mod config;
pub mod correlation;
pub mod errors;
pub mod telemetry;
pub mod track_map;

// Re-export commonly used types
pub use config::{AppConfig, ChartConfig};
pub use correlation::{
    CorrelationResult, HoverCorrelator, HoverState, LapReadout, LapView, TelemetryView, ViewMode,
    ZoomRange,
};
pub use errors::{LaplineError, LookupError};
pub use telemetry::{Channel, ChannelId, Lap, LapTelemetry, Sample, TrackPathPoint};
pub use track_map::{DistanceIndex, DriveState, PathSegment, TrackMapRenderer};
