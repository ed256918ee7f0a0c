//! Contracts the core needs from an external map component.
//!
//! A host application adapts its map widget to [`MapViewport`] and its
//! read-only overlay layer to [`FeatureLayer`]. [`MemoryViewport`] is a
//! complete in-process implementation used by the command line front end
//! and the tests.

mod memory;

pub use memory::{MemoryFeatureLayer, MemoryViewport};

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Web map tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Component-wise comparison within `tolerance` degrees.
    pub fn approx_eq(&self, other: &LatLng, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance && (self.lon - other.lon).abs() <= tolerance
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Axis aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Bounds containing nothing. Extending it with a point yields a
    /// zero-extent box around that point.
    pub fn empty() -> Self {
        Self {
            south_west: LatLng::new(f64::INFINITY, f64::INFINITY),
            north_east: LatLng::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        let mut bounds = Self::empty();
        bounds.extend(a);
        bounds.extend(b);
        bounds
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lon = self.south_west.lon.min(p.lon);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lon = self.north_east.lon.max(p.lon);
    }

    pub fn is_empty(&self) -> bool {
        !(self.south_west.lat <= self.north_east.lat && self.south_west.lon <= self.north_east.lon)
    }

    /// True when the box is finite and has a non-zero extent on at least
    /// one axis, so a camera can be fitted to it. A horizontal or vertical
    /// line is valid; a single point is not.
    pub fn is_valid(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        let finite = self.south_west.is_finite() && self.north_east.is_finite();
        finite && (self.lat_span() > 0.0 || self.lon_span() > 0.0)
    }

    pub fn lat_span(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    pub fn lon_span(&self) -> f64 {
        self.north_east.lon - self.south_west.lon
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lon + self.north_east.lon) / 2.0,
        )
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lon >= self.south_west.lon
            && p.lon <= self.north_east.lon
    }
}

impl Default for LatLngBounds {
    fn default() -> Self {
        Self::empty()
    }
}

/// Center and zoom of one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: LatLng,
    pub zoom: f64,
}

impl Camera {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn approx_eq(&self, other: &Camera, tolerance: f64) -> bool {
        self.center.approx_eq(&other.center, tolerance) && (self.zoom - other.zoom).abs() <= tolerance
    }

    /// A camera with a NaN or infinite component can never settle.
    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.zoom.is_finite()
    }
}

/// Options for programmatic camera changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub animate: bool,
}

impl ViewOptions {
    /// Jump straight to the target without a transition.
    pub fn instant() -> Self {
        Self { animate: false }
    }
}

/// Settle events a viewport reports once a camera change has finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    MoveEnd(Camera),
    ZoomEnd(Camera),
}

impl ViewEvent {
    pub fn camera(&self) -> Camera {
        match self {
            ViewEvent::MoveEnd(c) | ViewEvent::ZoomEnd(c) => *c,
        }
    }
}

/// Monotonic counter shared by the viewports of a pair. Every queued
/// settle event takes the next tick, which gives events from both
/// viewports one arrival order.
///
/// Cloning yields another handle to the same counter.
#[derive(Debug, Clone, Default)]
pub struct EventClock(Rc<Cell<u64>>);

impl EventClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current tick and advances the counter.
    pub fn tick(&self) -> u64 {
        let seq = self.0.get();
        self.0.set(seq + 1);
        seq
    }
}

/// A settle event together with its arrival tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedEvent {
    pub seq: u64,
    pub event: ViewEvent,
}

/// Which half of a viewport pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Primary,
    Secondary,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Primary => Side::Secondary,
            Side::Secondary => Side::Primary,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Primary => 0,
            Side::Secondary => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Primary => write!(f, "primary"),
            Side::Secondary => write!(f, "secondary"),
        }
    }
}

/// Read-only overlay layer holding the loaded dataset.
pub trait FeatureLayer {
    fn clear_layers(&mut self);
    fn add_feature(&mut self, feature: geojson::Feature) -> Result<()>;
    /// Bounds of everything currently in the layer.
    fn bounds(&self) -> LatLngBounds;
    fn len(&self) -> usize;
    /// Copy of every feature currently in the layer.
    fn snapshot(&self) -> Vec<geojson::Feature>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One map camera owned by the host's rendering component.
pub trait MapViewport {
    type Layer: FeatureLayer;

    fn center(&self) -> LatLng;
    fn zoom(&self) -> f64;

    fn camera(&self) -> Camera {
        Camera::new(self.center(), self.zoom())
    }

    /// Moves the camera. Implementations queue a settle event when the
    /// camera actually changed.
    fn set_view(&mut self, center: LatLng, zoom: f64, options: ViewOptions);

    /// Centers on `bounds` at the largest zoom that shows all of it.
    fn fit_bounds(&mut self, bounds: &LatLngBounds, options: ViewOptions);

    /// Drains settle events queued since the last call, oldest first.
    fn take_events(&mut self) -> Vec<QueuedEvent>;

    /// Replaces the clock used to stamp queued events. A pair hands the
    /// same clock to both of its viewports.
    fn set_event_clock(&mut self, clock: EventClock);

    /// Overlay layer handle, `None` until the host has created it.
    fn feature_layer(&self) -> Option<&Self::Layer>;
    fn feature_layer_mut(&mut self) -> Option<&mut Self::Layer>;

    fn base_layer(&self) -> &str;
    fn set_base_layer(&mut self, id: &str);
}

/// Largest whole zoom level at which `bounds` fits in a viewport of
/// `width` × `height` pixels under Web Mercator.
pub fn fit_zoom(bounds: &LatLngBounds, width: f64, height: f64) -> f64 {
    let lon_fraction = bounds.lon_span() / 360.0;
    let lat_fraction = (mercator_y(bounds.north_east.lat) - mercator_y(bounds.south_west.lat))
        / (2.0 * std::f64::consts::PI);
    let zoom_for = |pixels: f64, fraction: f64| {
        if fraction > 0.0 {
            (pixels / (TILE_SIZE * fraction)).log2()
        } else {
            f64::INFINITY
        }
    };
    let zoom = zoom_for(width, lon_fraction).min(zoom_for(height, lat_fraction));
    (zoom + 1e-9).floor()
}

fn mercator_y(lat: f64) -> f64 {
    let phi = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln()
}
