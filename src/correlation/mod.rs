pub mod hover;
pub mod zoom;

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    config::{AppConfig, ChartConfig},
    errors::{LaplineError, LookupError},
    telemetry::{Channel, ChannelId, Domain, Lap, Sample, TrackPathPoint},
    track_map::{
        ClassifierThresholds, DEFAULT_VIEW_BOX, DistanceIndex, DriveStateClassifier, MapLayer,
        Marker, PathSegment, Point2D, TrackMapRenderer, segment,
    },
};
pub use hover::{DEFAULT_HOVER_THRESHOLD_M, HoverState, ViewMode};
pub use zoom::ZoomRange;

/// A loaded lap with everything derived from it at load time.
///
/// The distance index and colored segments are built once here and never
/// touched by hover updates; a new lap means a new `LapView`.
#[derive(Clone, Debug)]
pub struct LapView {
    lap: Lap,
    index: Option<DistanceIndex>,
    path_domain: Option<Domain>,
    segments: Vec<PathSegment>,
}

impl LapView {
    pub fn new(lap: Lap, thresholds: ClassifierThresholds, granularity: f64) -> Self {
        let (index, path_domain, segments) = match lap.track_path() {
            Ok(points) => {
                let classifier = DriveStateClassifier::new(&lap.telemetry, thresholds);
                (
                    Some(DistanceIndex::build(points, granularity)),
                    Domain::of(points.iter().map(|p| p.distance)),
                    segment(points, |d| classifier.classify(d)),
                )
            }
            Err(e) => {
                warn!("Lap {}: {}, position correlation disabled", lap.name, e);
                (None, None, Vec::new())
            }
        };
        debug!(
            "Lap {}: {} channels, {} path segments",
            lap.name,
            lap.telemetry.len(),
            segments.len()
        );
        Self {
            lap,
            index,
            path_domain,
            segments,
        }
    }

    pub fn from_config(lap: Lap, config: &AppConfig) -> Self {
        Self::new(lap, config.thresholds, config.index_granularity_m)
    }

    pub fn lap(&self) -> &Lap {
        &self.lap
    }

    pub fn name(&self) -> &str {
        &self.lap.name
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn index(&self) -> Option<&DistanceIndex> {
        self.index.as_ref()
    }

    pub fn path_domain(&self) -> Option<Domain> {
        self.path_domain
    }

    /// Distance range of the lap's telemetry, or of its track path if it has no channels.
    pub fn lap_domain(&self) -> Option<Domain> {
        self.lap.telemetry.lap_domain().or(self.path_domain)
    }

    /// Range the charts open at and reset to: the speed channel's domain when
    /// recorded, the lap domain otherwise.
    pub fn zoom_domain(&self) -> Option<Domain> {
        self.lap
            .telemetry
            .get(ChannelId::Speed)
            .and_then(|c| c.domain())
            .or_else(|| self.lap_domain())
    }

    /// Car position at `distance`, rejecting distances outside the recorded path.
    pub fn position_at(&self, distance: f64) -> Result<&TrackPathPoint, LookupError> {
        let points = self.lap.track_path()?;
        let (Some(index), Some(domain)) = (&self.index, self.path_domain) else {
            return Err(LookupError::MissingTrackPath);
        };
        domain.check(distance)?;
        index
            .lookup_rounded(points, distance)
            .ok_or(LookupError::MissingTrackPath)
    }

    /// Channel value at `distance`, rejecting distances outside the channel's domain.
    pub fn sample_at(&self, id: ChannelId, distance: f64) -> Result<&Sample, LookupError> {
        self.lap
            .telemetry
            .get(id)
            .ok_or(LookupError::EmptyChannel)?
            .sample_at(distance)
    }
}

/// One channel's value under the hover line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelReadout {
    pub channel: ChannelId,
    pub value: Option<f64>,
    pub formatted: Option<String>,
}

/// Everything correlated for one lap at the hovered distance.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LapReadout {
    pub position: Option<TrackPathPoint>,
    pub values: Vec<ChannelReadout>,
}

impl LapReadout {
    /// No position and no channel values.
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.values.iter().all(|v| v.value.is_none())
    }

    pub fn value(&self, channel: ChannelId) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.channel == channel)
            .and_then(|v| v.value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub distance: Option<f64>,
    pub primary: LapReadout,
    pub comparison: Option<LapReadout>,
}

/// Derives car positions and visible channel values for a hovered distance.
#[derive(Clone, Debug)]
pub struct HoverCorrelator {
    channels: Vec<ChannelId>,
}

impl HoverCorrelator {
    pub fn new(channels: Vec<ChannelId>) -> Self {
        Self { channels }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.visible_channels())
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Correlate `hover` against the primary lap and, when given, the comparison lap.
    ///
    /// Each field degrades on its own: a missing channel, a distance outside a
    /// channel's or path's range, or a lap without a track path leaves just that
    /// field empty. Nothing here fails.
    pub fn correlate(
        &self,
        hover: Option<f64>,
        primary: &LapView,
        comparison: Option<&LapView>,
    ) -> CorrelationResult {
        CorrelationResult {
            distance: hover,
            primary: self.readout(hover, primary),
            comparison: comparison.map(|view| self.readout(hover, view)),
        }
    }

    fn readout(&self, hover: Option<f64>, view: &LapView) -> LapReadout {
        let Some(distance) = hover else {
            return LapReadout {
                position: None,
                values: self.channels.iter().map(|id| empty_readout(*id)).collect(),
            };
        };

        let values = self
            .channels
            .iter()
            .map(|id| {
                let channel = view.lap.telemetry.get(*id);
                match (channel, view.sample_at(*id, distance)) {
                    (Some(channel), Ok(sample)) => ChannelReadout {
                        channel: *id,
                        value: Some(sample.value),
                        formatted: Some(format_value(channel, sample.value)),
                    },
                    _ => empty_readout(*id),
                }
            })
            .collect();

        LapReadout {
            position: view.position_at(distance).ok().copied(),
            values,
        }
    }
}

fn empty_readout(channel: ChannelId) -> ChannelReadout {
    ChannelReadout {
        channel,
        value: None,
        formatted: None,
    }
}

/// Format a channel value the way its chart labels it.
///
/// Lap time channels read out as `m:ss.SSS`, stepped channels as integers and
/// everything else with two decimals.
pub fn format_value(channel: &Channel, value: f64) -> String {
    if channel.id.is_lap_time() {
        format_lap_time(value)
    } else if channel.stepped {
        format!("{:.0}", value.round())
    } else {
        format!("{:.2}", value)
    }
}

/// Format a lap time in seconds as `m:ss.SSS`.
pub fn format_lap_time(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis <= 0.0 {
        return "--:--.---".to_string();
    }
    let millis = millis as u64;
    format!(
        "{}:{:02}.{:03}",
        millis / 60_000,
        (millis % 60_000) / 1000,
        millis % 1000
    )
}

/// The top-level telemetry view: owns the loaded laps, the view mode, and the
/// single hover and zoom state every chart and the track map read from.
pub struct TelemetryView {
    config: AppConfig,
    correlator: HoverCorrelator,
    renderer: TrackMapRenderer,
    primary: Option<LapView>,
    comparison: Option<LapView>,
    mode: ViewMode,
    hover: HoverState,
    zoom: ZoomRange,
}

impl TelemetryView {
    pub fn new(config: AppConfig) -> Self {
        Self {
            correlator: HoverCorrelator::from_config(&config),
            renderer: TrackMapRenderer::with_config(config.track_map.clone()),
            hover: HoverState::new(config.hover_threshold_m),
            config,
            primary: None,
            comparison: None,
            mode: ViewMode::Single,
            zoom: ZoomRange::new(0.0, 0.0),
        }
    }

    /// Replace the primary lap, rebuilding its index and segments and
    /// resetting hover and zoom.
    pub fn load_primary(&mut self, lap: Lap) {
        let view = LapView::from_config(lap, &self.config);
        self.zoom = view
            .zoom_domain()
            .map(ZoomRange::from_domain)
            .unwrap_or(ZoomRange::new(0.0, 0.0));
        info!(
            "Loaded primary lap {}, zoom [{:.1}, {:.1}]",
            view.name(),
            self.zoom.min,
            self.zoom.max
        );
        self.primary = Some(view);
        self.hover.clear();
    }

    /// Load a second lap and switch to comparison mode.
    pub fn set_comparison(&mut self, lap: Lap) {
        let view = LapView::from_config(lap, &self.config);
        info!("Loaded comparison lap {}", view.name());
        self.comparison = Some(view);
        self.mode = ViewMode::Comparison;
    }

    pub fn clear_comparison(&mut self) {
        self.comparison = None;
        self.mode = ViewMode::Single;
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn primary(&self) -> Option<&LapView> {
        self.primary.as_ref()
    }

    /// Comparison lap, only while in comparison mode.
    pub fn comparison(&self) -> Option<&LapView> {
        match self.mode {
            ViewMode::Comparison => self.comparison.as_ref(),
            ViewMode::Single => None,
        }
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn zoom(&self) -> &ZoomRange {
        &self.zoom
    }

    pub fn correlator(&self) -> &HoverCorrelator {
        &self.correlator
    }

    /// Replace the chart rows; the correlator picks up the new visible channels.
    pub fn set_charts(&mut self, charts: Vec<ChartConfig>) -> Result<(), LaplineError> {
        let mut config = self.config.clone();
        config.charts = charts;
        config.validate()?;
        self.correlator = HoverCorrelator::from_config(&config);
        self.config = config;
        Ok(())
    }

    pub fn on_pointer_move(&mut self, distance: f64) -> bool {
        self.hover.pointer_at(distance, &self.zoom)
    }

    pub fn on_pointer_leave(&mut self) -> bool {
        self.hover.clear()
    }

    fn lap_domain(&self) -> Option<Domain> {
        self.primary.as_ref().and_then(|v| v.lap_domain())
    }

    pub fn zoom_in(&mut self) {
        self.zoom.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        if let Some(domain) = self.lap_domain() {
            self.zoom.zoom_out(domain);
        }
    }

    pub fn reset_zoom(&mut self) {
        if let Some(domain) = self.primary.as_ref().and_then(LapView::zoom_domain) {
            self.zoom.reset(domain);
        }
    }

    pub fn set_zoom(&mut self, a: f64, b: f64) {
        self.zoom.set(a, b);
    }

    /// Readouts for the current hover, `None` until a primary lap is loaded.
    pub fn readouts(&self) -> Option<CorrelationResult> {
        let primary = self.primary.as_ref()?;
        Some(
            self.correlator
                .correlate(self.hover.distance(), primary, self.comparison()),
        )
    }

    /// Render the track map for the current laps, zoom and hover.
    pub fn render(&self) -> Result<String, LaplineError> {
        let Some(primary) = &self.primary else {
            return self.renderer.render(DEFAULT_VIEW_BOX, &[], &[]);
        };
        let config = self.renderer.config();
        let comparison = self.comparison();

        // frame the first lap that has a track path
        let framed = std::iter::once(primary)
            .chain(comparison)
            .find(|v| v.lap.track_path().is_ok())
            .unwrap_or(primary);
        let points = framed.lap.track_path().unwrap_or_default();
        let view_box = self
            .renderer
            .view_box(points, &self.zoom, framed.lap_domain());

        let mut layers = vec![MapLayer {
            class: "car-path",
            segments: primary.segments(),
            palette: &config.primary_palette,
        }];
        if let Some(view) = comparison {
            layers.push(MapLayer {
                class: "comparison-path",
                segments: view.segments(),
                palette: &config.comparison_palette,
            });
        }

        let mut markers = Vec::new();
        if let Some(distance) = self.hover.distance() {
            if let Ok(point) = primary.position_at(distance) {
                markers.push(Marker {
                    position: Point2D::from(point),
                    color: config.primary_marker_color.clone(),
                });
            }
            if let Some(Ok(point)) = comparison.map(|v| v.position_at(distance)) {
                markers.push(Marker {
                    position: Point2D::from(point),
                    color: config.comparison_marker_color.clone(),
                });
            }
        }

        self.renderer.render(view_box, &layers, &markers)
    }
}
