//! Application level settings loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::scale::{ScaleEntry, ScaleTable};
use crate::viewport::LatLng;

/// A selectable base imagery source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLayer {
    pub id: String,
    pub name: String,
}

impl BaseLayer {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Settings for a [`MapSession`](crate::session::MapSession).
///
/// Fields missing from a JSON file fall back to [`MapConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Camera both viewports return to when the dataset is cleared.
    pub default_center: LatLng,
    pub default_zoom: f64,
    pub sync_on_start: bool,
    pub scales: Vec<ScaleEntry>,
    pub base_layers: Vec<BaseLayer>,
    pub primary_base_layer: String,
    pub secondary_base_layer: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: LatLng::new(20.0, 0.0),
            default_zoom: 2.0,
            sync_on_start: true,
            scales: ScaleTable::standard().entries().to_vec(),
            base_layers: vec![
                BaseLayer::new("osm", "OpenStreetMap"),
                BaseLayer::new("satellite", "Satellite imagery"),
                BaseLayer::new("topo", "Topographic"),
            ],
            primary_base_layer: "osm".to_string(),
            secondary_base_layer: "satellite".to_string(),
        }
    }
}

impl MapConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: &str) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Saves this configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.scale_table()?;
        if !self.default_zoom.is_finite() {
            return Err(MapError::InvalidConfig("default_zoom is not finite".into()));
        }
        for id in [&self.primary_base_layer, &self.secondary_base_layer] {
            self.base_layer(id)?;
        }
        Ok(())
    }

    pub fn scale_table(&self) -> Result<ScaleTable> {
        ScaleTable::new(self.scales.clone())
    }

    /// Looks up a base layer in the catalog.
    pub fn base_layer(&self, id: &str) -> Result<&BaseLayer> {
        self.base_layers
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| MapError::UnknownBaseLayer(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        MapConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = MapConfig::from_json(r#"{ "default_zoom": 5.0, "sync_on_start": false }"#).unwrap();
        assert_eq!(cfg.default_zoom, 5.0);
        assert!(!cfg.sync_on_start);
        assert_eq!(cfg.primary_base_layer, "osm");
        assert_eq!(cfg.scales.len(), ScaleTable::standard().entries().len());
    }

    #[test]
    fn rejects_unknown_base_layer() {
        let err = MapConfig::from_json(r#"{ "secondary_base_layer": "moon" }"#).unwrap_err();
        assert!(matches!(err, MapError::UnknownBaseLayer(id) if id == "moon"));
    }

    #[test]
    fn rejects_empty_scale_table() {
        let err = MapConfig::from_json(r#"{ "scales": [] }"#).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        let path = path.to_str().unwrap();
        let mut cfg = MapConfig::default();
        cfg.default_center = LatLng::new(51.5, -0.12);
        cfg.save(path).unwrap();
        assert_eq!(MapConfig::load(path).unwrap(), cfg);
    }
}
