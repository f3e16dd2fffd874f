use log::trace;
use serde::{Deserialize, Serialize};

use super::zoom::ZoomRange;

/// Pointer moves smaller than this, in meters, are treated as noise
pub const DEFAULT_HOVER_THRESHOLD_M: f64 = 3.0;

/// Whether a second lap is being correlated alongside the primary one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Single,
    Comparison,
}

/// The single hovered distance shared by the charts and the track map.
///
/// Owned by the top-level view and passed down to everything that reads it.
/// Every mutator reports whether the hovered distance actually changed, so
/// callers only recorrelate on real updates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverState {
    distance: Option<f64>,
    threshold: f64,
}

impl Default for HoverState {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_THRESHOLD_M)
    }
}

impl HoverState {
    pub fn new(threshold: f64) -> Self {
        Self {
            distance: None,
            threshold: threshold.max(0.0),
        }
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn set(&mut self, distance: f64) -> bool {
        if !distance.is_finite() {
            return self.clear();
        }
        if let Some(last) = self.distance {
            if (distance - last).abs() < self.threshold || distance == last {
                trace!("Ignoring hover at {distance:.2}m, last accepted {last:.2}m");
                return false;
            }
        }
        self.distance = Some(distance);
        true
    }

    pub fn clear(&mut self) -> bool {
        self.distance.take().is_some()
    }

    /// Pointer moved over a chart: positions outside the visible range clear the hover.
    pub fn pointer_at(&mut self, distance: f64, zoom: &ZoomRange) -> bool {
        if zoom.contains(distance) {
            self.set(distance)
        } else {
            self.clear()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_moves_are_ignored() {
        let mut hover = HoverState::default();
        assert!(hover.set(100.0));
        assert!(!hover.set(102.9));
        assert_eq!(hover.distance(), Some(100.0));
        assert!(hover.set(103.0));
        assert_eq!(hover.distance(), Some(103.0));
    }

    #[test]
    fn test_clear_is_always_accepted() {
        let mut hover = HoverState::default();
        assert!(!hover.clear());
        hover.set(10.0);
        assert!(hover.clear());
        assert_eq!(hover.distance(), None);
        // after clearing, the next move is accepted regardless of distance
        assert!(hover.set(11.0));
    }

    #[test]
    fn test_pointer_outside_zoom_clears() {
        let zoom = ZoomRange::new(0.0, 500.0);
        let mut hover = HoverState::new(0.0);
        assert!(hover.pointer_at(250.0, &zoom));
        assert!(hover.pointer_at(600.0, &zoom));
        assert_eq!(hover.distance(), None);
        assert!(!hover.set(f64::NAN));
    }

    #[test]
    fn test_zero_threshold_still_dedupes() {
        let mut hover = HoverState::new(0.0);
        assert!(hover.set(5.0));
        assert!(!hover.set(5.0));
        assert!(hover.set(5.5));
    }
}
