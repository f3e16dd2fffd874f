// Track map: distance index, driving-state coloring and SVG rendering

pub mod classifier;
pub mod distance_index;
pub mod segmenter;
pub mod svg_generator;

pub use classifier::{
    ClassifierThresholds, DEFAULT_INPUT_THRESHOLD, DriveState, DriveStateClassifier, classify,
};
pub use distance_index::{DEFAULT_GRANULARITY_M, DistanceIndex};
pub use segmenter::{PathSegment, segment};
pub use svg_generator::{
    BoundingBox, DEFAULT_VIEW_BOX, MapLayer, Marker, Point2D, SegmentPalette, TrackMapConfig,
    TrackMapRenderer, ViewBox,
};
