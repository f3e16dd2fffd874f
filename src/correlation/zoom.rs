use log::debug;

use crate::telemetry::Domain;

const ZOOM_IN_FACTOR: f64 = 0.7;
const ZOOM_OUT_FACTOR: f64 = 1.4;

/// Distance window shown by the charts and framed by the track map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    /// Range between two bounds, given in either order.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_domain(domain: Domain) -> Self {
        Self::new(domain.min, domain.max)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }

    /// Shrink to 70% of the span around the current center.
    pub fn zoom_in(&mut self) {
        let (center, half) = (self.center(), self.span() * ZOOM_IN_FACTOR / 2.0);
        self.min = center - half;
        self.max = center + half;
        debug!("Zoomed in to [{:.1}, {:.1}]", self.min, self.max);
    }

    /// Grow to 140% of the span around the current center, never past the lap.
    pub fn zoom_out(&mut self, lap: Domain) {
        let (center, half) = (self.center(), self.span() * ZOOM_OUT_FACTOR / 2.0);
        self.min = (center - half).max(lap.min);
        self.max = (center + half).min(lap.max);
        debug!("Zoomed out to [{:.1}, {:.1}]", self.min, self.max);
    }

    pub fn reset(&mut self, lap: Domain) {
        *self = Self::from_domain(lap);
    }

    /// Apply a drag selection.
    pub fn set(&mut self, a: f64, b: f64) {
        *self = Self::new(a, b);
    }
}
