//! Geodesic distance and area measurement on a spherical Earth.
//!
//! All functions are pure and deterministic. Degenerate input (too few
//! vertices) yields zero rather than an error so callers measuring a shape
//! that is still being drawn never have to handle a failure.
//!
//! The area approximation weights longitude deltas by latitude and is not
//! valid for rings crossing the antimeridian.

use crate::viewport::LatLng;

/// Equatorial radius used for every measurement, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Distances below this are shown in meters, otherwise kilometers.
pub const KILOMETER_THRESHOLD_M: f64 = 1_000.0;

/// Areas below this are shown in square meters, otherwise hectares.
pub const HECTARE_THRESHOLD_M2: f64 = 10_000.0;

/// Result of measuring a drawn shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Total length of an open path.
    Distance { meters: f64 },
    /// Enclosed area and perimeter of a closed ring.
    Area {
        square_meters: f64,
        perimeter_meters: f64,
    },
}

impl Measurement {
    /// Human readable label shown next to the shape.
    pub fn label(&self) -> String {
        match self {
            Measurement::Distance { meters } => format!("Distance: {}", format_distance(*meters)),
            Measurement::Area {
                square_meters,
                perimeter_meters,
            } => format!(
                "Area: {}\nPerimeter: {}",
                format_area(*square_meters),
                format_distance(*perimeter_meters)
            ),
        }
    }
}

/// Great-circle distance between two coordinates using the haversine formula.
pub fn segment_distance(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Sum of the distances between consecutive points.
///
/// Empty input and single points measure zero.
pub fn distance(points: &[LatLng]) -> f64 {
    points
        .windows(2)
        .map(|pair| segment_distance(pair[0], pair[1]))
        .sum()
}

/// Perimeter of a ring, including the closing segment back to the first vertex.
///
/// Rings with fewer than three distinct vertices measure zero. A ring whose
/// last vertex repeats the first is not closed a second time.
pub fn perimeter(ring: &[LatLng]) -> f64 {
    let ring = open_ring(ring);
    if ring.len() < 3 {
        return 0.0;
    }
    distance(ring) + segment_distance(ring[ring.len() - 1], ring[0])
}

/// Approximate geodesic area of a ring in square meters.
///
/// `|R² / 2 · Σ (λᵢ₊₁ − λᵢ)(2 + sin φᵢ + sin φᵢ₊₁)|`, summed cyclically.
pub fn area(ring: &[LatLng]) -> f64 {
    let ring = open_ring(ring);
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % n];
        let d_lambda = (p2.lon - p1.lon).to_radians();
        sum += d_lambda * (2.0 + p1.lat.to_radians().sin() + p2.lat.to_radians().sin());
    }
    (sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

/// Formats a distance with two decimals in meters or kilometers.
pub fn format_distance(meters: f64) -> String {
    if meters < KILOMETER_THRESHOLD_M {
        format!("{:.2} m", meters)
    } else {
        format!("{:.2} km", meters / 1_000.0)
    }
}

/// Formats an area with two decimals in square meters or hectares.
pub fn format_area(square_meters: f64) -> String {
    if square_meters < HECTARE_THRESHOLD_M2 {
        format!("{:.2} m²", square_meters)
    } else {
        format!("{:.2} ha", square_meters / HECTARE_THRESHOLD_M2)
    }
}

// Drawing tools commonly close rings explicitly; drop the duplicate vertex.
fn open_ring(ring: &[LatLng]) -> &[LatLng] {
    match ring {
        [first, .., last] if ring.len() > 3 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}
