//! Geometry dataset shown in both viewports' feature layers.

use std::str::FromStr;

use geojson::{FeatureCollection, GeoJson};

pub use geojson::{Feature, Geometry, Value};

use crate::error::{MapError, Result};
use crate::viewport::{LatLng, LatLngBounds};

/// The currently loaded geometry collection.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoDataset {
    features: Vec<Feature>,
}

impl GeoDataset {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// A dataset with no features.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Parses any GeoJSON document. A bare geometry or single feature
    /// becomes a one-feature dataset.
    pub fn from_geojson(geojson: GeoJson) -> Self {
        match geojson {
            GeoJson::FeatureCollection(fc) => Self::new(fc.features),
            GeoJson::Feature(f) => Self::new(vec![f]),
            GeoJson::Geometry(g) => Self::new(vec![feature_from_geometry(g)]),
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounds of every coordinate in the dataset.
    pub fn bounds(&self) -> LatLngBounds {
        let mut bounds = LatLngBounds::empty();
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            extend_bounds(&geometry.value, &mut bounds);
        }
        bounds
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.clone(),
            foreign_members: None,
        }
    }
}

impl FromStr for GeoDataset {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        let geojson: GeoJson = s.parse()?;
        Ok(Self::from_geojson(geojson))
    }
}

fn feature_from_geometry(geometry: Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

/// Grows `bounds` to include every position of `value`.
pub(crate) fn extend_bounds(value: &Value, bounds: &mut LatLngBounds) {
    match value {
        Value::Point(p) => extend_position(p, bounds),
        Value::MultiPoint(points) | Value::LineString(points) => {
            points.iter().for_each(|p| extend_position(p, bounds))
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => lines
            .iter()
            .flatten()
            .for_each(|p| extend_position(p, bounds)),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .flatten()
            .for_each(|p| extend_position(p, bounds)),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .for_each(|g| extend_bounds(&g.value, bounds)),
    }
}

// GeoJSON positions are [lon, lat, ...].
fn extend_position(position: &[f64], bounds: &mut LatLngBounds) {
    if let [lon, lat, ..] = position {
        bounds.extend(LatLng::new(*lat, *lon));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collection() {
        let ds: GeoDataset = r#"{ "type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}},
            {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[3.0, 4.0], [5.0, 6.0]]}}
        ] }"#
            .parse()
            .unwrap();
        assert_eq!(ds.len(), 2);
        let b = ds.bounds();
        assert_eq!(b.south_west, LatLng::new(2.0, 1.0));
        assert_eq!(b.north_east, LatLng::new(6.0, 5.0));
    }

    #[test]
    fn bare_geometry_becomes_one_feature() {
        let ds: GeoDataset = r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}"#
            .parse()
            .unwrap();
        assert_eq!(ds.len(), 1);
        assert!(ds.bounds().is_valid());
    }

    #[test]
    fn empty_collection_has_invalid_bounds() {
        let ds: GeoDataset = r#"{"type": "FeatureCollection", "features": []}"#.parse().unwrap();
        assert!(ds.is_empty());
        assert!(!ds.bounds().is_valid());
    }

    #[test]
    fn malformed_input_is_a_dataset_error() {
        let err = "{ not json".parse::<GeoDataset>().unwrap_err();
        assert!(matches!(err, MapError::Dataset(_)));
    }
}
