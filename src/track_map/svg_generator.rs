// SVG track map rendering for colored car paths and hover markers

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{classifier::DriveState, segmenter::PathSegment};
use crate::correlation::ZoomRange;
use crate::errors::LaplineError;
use crate::telemetry::{Domain, TrackPathPoint};

/// View box used when there is no track path to fit
pub const DEFAULT_VIEW_BOX: ViewBox = ViewBox {
    min_x: -500.0,
    min_y: -750.0,
    width: 750.0,
    height: 1250.0,
};

/// Represents a 2D coordinate point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<&TrackPathPoint> for Point2D {
    fn from(value: &TrackPathPoint) -> Self {
        Self::new(value.x, value.y)
    }
}

/// Bounding box for coordinate calculations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, point: Point2D) {
        self.min_x = self.min_x.min(point.x);
        self.max_x = self.max_x.max(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_y = self.max_y.max(point.y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// View box around this box with `padding` on every side.
    pub fn padded(&self, padding: f64) -> ViewBox {
        ViewBox {
            min_x: self.min_x - padding,
            min_y: self.min_y - padding,
            width: self.width() + padding * 2.0,
            height: self.height() + padding * 2.0,
        }
    }
}

impl<'p> FromIterator<&'p TrackPathPoint> for BoundingBox {
    fn from_iter<I: IntoIterator<Item = &'p TrackPathPoint>>(iter: I) -> Self {
        let mut bbox = BoundingBox::new();
        for point in iter {
            bbox.update(point.into());
        }
        bbox
    }
}

/// SVG `viewBox` attribute value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

/// Stroke colors for each driving state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPalette {
    pub throttle: String,
    pub brake: String,
    pub coast: String,
}

impl SegmentPalette {
    pub fn primary() -> Self {
        Self {
            throttle: "#198754".to_string(),
            brake: "#DC3545".to_string(),
            coast: "#808080".to_string(),
        }
    }

    pub fn comparison() -> Self {
        Self {
            throttle: "#20C997".to_string(),
            brake: "#FD7E14".to_string(),
            coast: "#ADB5BD".to_string(),
        }
    }

    pub fn color_for(&self, state: DriveState) -> &str {
        match state {
            DriveState::Throttle => &self.throttle,
            DriveState::Brake => &self.brake,
            DriveState::Coast => &self.coast,
        }
    }
}

/// Configuration for SVG track map rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackMapConfig {
    /// Stroke width for the car path
    pub stroke_width: f64,
    pub opacity: f64,
    /// Padding around the whole track
    pub full_padding: f64,
    /// Padding around a zoomed-in portion of the track
    pub zoom_padding: f64,
    pub marker_radius: f64,
    pub primary_palette: SegmentPalette,
    pub comparison_palette: SegmentPalette,
    pub primary_marker_color: String,
    pub comparison_marker_color: String,
}

impl Default for TrackMapConfig {
    fn default() -> Self {
        Self {
            stroke_width: 4.0,
            opacity: 0.9,
            full_padding: 100.0,
            zoom_padding: 50.0,
            marker_radius: 8.0,
            primary_palette: SegmentPalette::primary(),
            comparison_palette: SegmentPalette::comparison(),
            primary_marker_color: "#DC2626".to_string(),
            comparison_marker_color: "#3B82F6".to_string(),
        }
    }
}

/// One lap's colored path, drawn as its own group
#[derive(Debug, Clone, Copy)]
pub struct MapLayer<'a> {
    pub class: &'a str,
    pub segments: &'a [PathSegment],
    pub palette: &'a SegmentPalette,
}

/// Car position marker for the hovered distance
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Point2D,
    pub color: String,
}

/// Renderer for track maps built from path segments
pub struct TrackMapRenderer {
    config: TrackMapConfig,
}

impl TrackMapRenderer {
    pub fn new() -> Self {
        Self {
            config: TrackMapConfig::default(),
        }
    }

    pub fn with_config(config: TrackMapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackMapConfig {
        &self.config
    }

    /// Fit the view box to the part of the track inside `zoom`.
    ///
    /// The whole track is framed, with the wider padding, when the zoom range
    /// covers the lap domain or contains no path points.
    pub fn view_box(
        &self,
        points: &[TrackPathPoint],
        zoom: &ZoomRange,
        lap_domain: Option<Domain>,
    ) -> ViewBox {
        if points.is_empty() {
            return DEFAULT_VIEW_BOX;
        }

        let covers_lap = lap_domain
            .map(|domain| zoom.min <= domain.min && zoom.max >= domain.max)
            .unwrap_or(false);
        let visible: BoundingBox = points
            .iter()
            .filter(|p| zoom.contains(p.distance))
            .collect();

        if visible.is_empty() || covers_lap {
            let all: BoundingBox = points.iter().collect();
            debug!(
                "View box framing whole track: ({:.2}, {:.2}) to ({:.2}, {:.2})",
                all.min_x, all.min_y, all.max_x, all.max_y
            );
            return all.padded(self.config.full_padding);
        }
        visible.padded(self.config.zoom_padding)
    }

    fn validate_config(&self) -> Result<(), LaplineError> {
        if self.config.stroke_width <= 0.0 || self.config.stroke_width > 50.0 {
            return Err(LaplineError::TrackMapRenderError {
                reason: format!(
                    "Invalid stroke width: {} (must be 0.1-50.0)",
                    self.config.stroke_width
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.config.opacity) {
            return Err(LaplineError::TrackMapRenderError {
                reason: format!("Invalid opacity: {} (must be 0.0-1.0)", self.config.opacity),
            });
        }
        Ok(())
    }

    /// Render the colored car paths and hover markers as an SVG document.
    pub fn render(
        &self,
        view_box: ViewBox,
        layers: &[MapLayer<'_>],
        markers: &[Marker],
    ) -> Result<String, LaplineError> {
        self.validate_config()?;
        if !view_box.is_finite() || view_box.width <= 0.0 || view_box.height <= 0.0 {
            return Err(LaplineError::TrackMapRenderError {
                reason: format!("Invalid view box: {}", view_box),
            });
        }

        let segment_count: usize = layers.iter().map(|l| l.segments.len()).sum();
        debug!(
            "Rendering {} layers with {} segments and {} markers",
            layers.len(),
            segment_count,
            markers.len()
        );
        if segment_count == 0 {
            warn!("Rendering track map without any car path segments");
        }

        let mut svg = String::with_capacity(1024 + segment_count * 64);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{}">"#,
            view_box
        ));

        for layer in layers {
            svg.push_str(&format!(
                "\n  <g class=\"{}\" fill=\"none\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\" opacity=\"{}\">",
                layer.class, self.config.stroke_width, self.config.opacity
            ));
            for segment in layer.segments {
                svg.push_str(&format!(
                    "\n    <path d=\"{}\" stroke=\"{}\" />",
                    segment.path_data,
                    layer.palette.color_for(segment.color)
                ));
            }
            svg.push_str("\n  </g>");
        }

        for marker in markers {
            if !marker.position.x.is_finite() || !marker.position.y.is_finite() {
                warn!("Skipping marker with non-finite position {:?}", marker.position);
                continue;
            }
            svg.push_str(&format!(
                "\n  <circle class=\"car-marker\" cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"#000\" stroke-width=\"1\" />",
                marker.position.x, marker.position.y, self.config.marker_radius, marker.color
            ));
        }

        svg.push_str(&format!(
            "\n  <!-- Rendered {} segments across {} layers -->",
            segment_count,
            layers.len()
        ));
        svg.push_str("\n</svg>");

        // 10MB limit
        if svg.len() > 10_000_000 {
            return Err(LaplineError::TrackMapRenderError {
                reason: format!("Rendered SVG too large: {} bytes (max 10MB)", svg.len()),
            });
        }

        Ok(svg)
    }
}

impl Default for TrackMapRenderer {
    fn default() -> Self {
        Self::new()
    }
}
