use std::collections::VecDeque;

use log::{trace, warn};

use super::{
    fit_zoom, Camera, EventClock, FeatureLayer, LatLng, LatLngBounds, MapViewport, QueuedEvent, ViewEvent,
    ViewOptions,
};
use crate::dataset::extend_bounds;
use crate::error::{MapError, Result};

/// Feature layer that keeps GeoJSON features in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureLayer {
    features: Vec<geojson::Feature>,
    capacity: Option<usize>,
}

impl MemoryFeatureLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer that refuses features beyond `capacity`.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            features: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn features(&self) -> &[geojson::Feature] {
        &self.features
    }
}

impl FeatureLayer for MemoryFeatureLayer {
    fn clear_layers(&mut self) {
        self.features.clear();
    }

    fn add_feature(&mut self, feature: geojson::Feature) -> Result<()> {
        if let Some(cap) = self.capacity {
            if self.features.len() >= cap {
                return Err(MapError::Layer(format!(
                    "feature layer is full ({} features)",
                    cap
                )));
            }
        }
        self.features.push(feature);
        Ok(())
    }

    fn bounds(&self) -> LatLngBounds {
        let mut bounds = LatLngBounds::empty();
        for feature in &self.features {
            if let Some(geometry) = &feature.geometry {
                extend_bounds(&geometry.value, &mut bounds);
            }
        }
        bounds
    }

    fn len(&self) -> usize {
        self.features.len()
    }

    fn snapshot(&self) -> Vec<geojson::Feature> {
        self.features.clone()
    }
}

/// Viewport that records its camera and queues settle events in memory.
#[derive(Debug, Clone)]
pub struct MemoryViewport {
    center: LatLng,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    width: f64,
    height: f64,
    base_layer: String,
    layer: Option<MemoryFeatureLayer>,
    events: VecDeque<QueuedEvent>,
    clock: EventClock,
    view_writes: usize,
    last_options: Option<ViewOptions>,
}

impl MemoryViewport {
    /// Creates an 800×600 viewport with an empty feature layer attached.
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            min_zoom: 0.0,
            max_zoom: 22.0,
            width: 800.0,
            height: 600.0,
            base_layer: String::new(),
            layer: Some(MemoryFeatureLayer::new()),
            events: VecDeque::new(),
            clock: EventClock::new(),
            view_writes: 0,
            last_options: None,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self
    }

    /// Replaces the feature layer handle; `None` models a viewport whose
    /// overlay has not been created yet.
    pub fn with_layer(mut self, layer: Option<MemoryFeatureLayer>) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_base_layer(mut self, id: &str) -> Self {
        self.base_layer = id.to_string();
        self
    }

    /// Simulates the user dragging the map to `center`.
    pub fn pan_to(&mut self, center: LatLng) {
        let zoom = self.zoom;
        self.apply(center, zoom);
    }

    /// Simulates the user zooming in place.
    pub fn zoom_to(&mut self, zoom: f64) {
        let center = self.center;
        self.apply(center, zoom);
    }

    /// Number of programmatic `set_view` calls received so far.
    pub fn view_writes(&self) -> usize {
        self.view_writes
    }

    pub fn last_options(&self) -> Option<ViewOptions> {
        self.last_options
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn apply(&mut self, center: LatLng, zoom: f64) {
        if !Camera::new(center, zoom).is_finite() {
            warn!("ignoring non-finite camera {} z{}", center, zoom);
            return;
        }
        let zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        let before = Camera::new(self.center, self.zoom);
        self.center = center;
        self.zoom = zoom;
        let after = Camera::new(center, zoom);
        if after == before {
            return;
        }
        let event = if before.zoom != zoom {
            ViewEvent::ZoomEnd(after)
        } else {
            ViewEvent::MoveEnd(after)
        };
        trace!("viewport settled at {} z{}", center, zoom);
        self.events.push_back(QueuedEvent {
            seq: self.clock.tick(),
            event,
        });
    }
}

impl Default for MemoryViewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 2.0)
    }
}

impl MapViewport for MemoryViewport {
    type Layer = MemoryFeatureLayer;

    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_view(&mut self, center: LatLng, zoom: f64, options: ViewOptions) {
        self.view_writes += 1;
        self.last_options = Some(options);
        self.apply(center, zoom);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, options: ViewOptions) {
        if !bounds.is_valid() {
            return;
        }
        let zoom = fit_zoom(bounds, self.width, self.height);
        self.set_view(bounds.center(), zoom, options);
    }

    fn take_events(&mut self) -> Vec<QueuedEvent> {
        self.events.drain(..).collect()
    }

    fn set_event_clock(&mut self, clock: EventClock) {
        self.clock = clock;
    }

    fn feature_layer(&self) -> Option<&MemoryFeatureLayer> {
        self.layer.as_ref()
    }

    fn feature_layer_mut(&mut self) -> Option<&mut MemoryFeatureLayer> {
        self.layer.as_mut()
    }

    fn base_layer(&self) -> &str {
        &self.base_layer
    }

    fn set_base_layer(&mut self, id: &str) {
        self.base_layer = id.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_view_queues_one_event_per_change() {
        let mut vp = MemoryViewport::default();
        vp.set_view(LatLng::new(1.0, 1.0), 2.0, ViewOptions::instant());
        vp.set_view(LatLng::new(1.0, 1.0), 2.0, ViewOptions::instant());
        vp.zoom_to(5.0);
        let events = vp.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].event, ViewEvent::MoveEnd(_)));
        assert!(matches!(events[1].event, ViewEvent::ZoomEnd(_)));
        assert!(events[0].seq < events[1].seq);
        assert!(vp.take_events().is_empty());
    }

    #[test]
    fn non_finite_moves_are_ignored() {
        let mut vp = MemoryViewport::default();
        vp.zoom_to(f64::NAN);
        vp.pan_to(LatLng::new(f64::NAN, 1.0));
        vp.set_view(LatLng::new(1.0, f64::INFINITY), 4.0, ViewOptions::instant());
        assert_eq!(vp.center(), LatLng::new(0.0, 0.0));
        assert_eq!(vp.zoom(), 2.0);
        assert_eq!(vp.pending_events(), 0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = MemoryViewport::default().with_zoom_range(1.0, 18.0);
        vp.zoom_to(30.0);
        assert_eq!(vp.zoom(), 18.0);
    }

    #[test]
    fn fit_bounds_ignores_invalid_bounds() {
        let mut vp = MemoryViewport::default();
        let point = LatLngBounds::from_corners(LatLng::new(5.0, 5.0), LatLng::new(5.0, 5.0));
        vp.fit_bounds(&point, ViewOptions::instant());
        assert_eq!(vp.view_writes(), 0);
        assert_eq!(vp.center(), LatLng::new(0.0, 0.0));
    }

    #[test]
    fn capacity_limited_layer_rejects_overflow() {
        let mut layer = MemoryFeatureLayer::with_capacity_limit(1);
        let feature = geojson::Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: None,
            foreign_members: None,
        };
        assert!(layer.add_feature(feature.clone()).is_ok());
        assert!(matches!(layer.add_feature(feature), Err(MapError::Layer(_))));
        assert_eq!(layer.len(), 1);
    }
}
