// Splits a lap's track path into runs of one driving-state color

use serde::Serialize;

use super::{classifier::DriveState, svg_generator::Point2D};
use crate::telemetry::TrackPathPoint;

/// A drawable run of track path points sharing one driving state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathSegment {
    pub color: DriveState,
    pub points: Vec<Point2D>,
    /// SVG path data, `M x y L x y ...`
    pub path_data: String,
}

impl PathSegment {
    fn start(color: DriveState, at: &TrackPathPoint) -> Self {
        Self {
            color,
            points: vec![Point2D::new(at.x, at.y)],
            path_data: format!("M {} {}", at.x, at.y),
        }
    }

    fn extend(&mut self, to: &TrackPathPoint) {
        self.points.push(Point2D::new(to.x, to.y));
        self.path_data.push_str(&format!(" L {} {}", to.x, to.y));
    }
}

/// Group consecutive track path points by classified color in one pass.
///
/// The color of the line into a point is the color of that point. When the
/// color changes, the new segment starts at the previous point so adjacent
/// segments share exactly one coordinate and the outline has no gaps.
pub fn segment(
    points: &[TrackPathPoint],
    classify: impl Fn(f64) -> DriveState,
) -> Vec<PathSegment> {
    if points.len() < 2 {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = PathSegment::start(classify(points[0].distance), &points[0]);
    for pair in points.windows(2) {
        let (prev, point) = (&pair[0], &pair[1]);
        let color = classify(point.distance);
        if color != current.color {
            let finished = std::mem::replace(&mut current, PathSegment::start(color, prev));
            segments.push(finished);
        }
        current.extend(point);
    }
    segments.push(current);
    segments
}
