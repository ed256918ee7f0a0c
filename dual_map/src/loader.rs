//! Loading and clearing the dataset shown in both viewports.

use log::{info, warn};

use crate::dataset::{Feature, GeoDataset};
use crate::error::{MapError, Result};
use crate::sync::ViewportPair;
use crate::viewport::{FeatureLayer, LatLng, MapViewport, ViewOptions};

/// Replaces the dataset of a viewport pair without triggering a sync
/// feedback loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataLoadCoordinator {
    default_center: LatLng,
    default_zoom: f64,
}

impl DataLoadCoordinator {
    /// `default_center` and `default_zoom` are restored by [`clear`](Self::clear).
    pub fn new(default_center: LatLng, default_zoom: f64) -> Self {
        Self {
            default_center,
            default_zoom,
        }
    }

    /// Loads `dataset` into both feature layers and fits both cameras to it.
    ///
    /// Sync is suspended for the duration and restored on every exit path.
    /// If either layer rejects a feature, both layers get their previous
    /// contents back and the cameras are left alone. When the dataset has
    /// no usable extent the cameras stay where they are and the load still
    /// succeeds.
    pub fn load<V: MapViewport>(&self, pair: &mut ViewportPair<V>, dataset: &GeoDataset) -> Result<bool> {
        ensure_initialized(pair)?;
        let _suspended = pair.sync_flag().suspend();
        let (primary, secondary) = pair.both_mut().ok_or(MapError::ViewportsNotInitialized)?;
        let (primary_layer, secondary_layer) = match (primary.feature_layer_mut(), secondary.feature_layer_mut()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(MapError::ViewportsNotInitialized),
        };

        let previous = (primary_layer.snapshot(), secondary_layer.snapshot());
        let replaced = replace_features(&mut *primary_layer, dataset.features())
            .and_then(|()| replace_features(&mut *secondary_layer, dataset.features()));
        if let Err(e) = replaced {
            for (layer, features) in [(primary_layer, &previous.0), (secondary_layer, &previous.1)] {
                if let Err(restore) = replace_features(layer, features) {
                    warn!("could not restore previous features: {}", restore);
                }
            }
            return Err(e);
        }

        let bounds = primary_layer.bounds();
        if bounds.is_valid() {
            primary.fit_bounds(&bounds, ViewOptions::instant());
            secondary.fit_bounds(&bounds, ViewOptions::instant());
        } else {
            warn!("dataset has no usable extent, keeping current view");
        }
        // Settle events from the fit happened while sync was off.
        pair.discard_events();

        info!("loaded {} features into both viewports", dataset.len());
        Ok(true)
    }

    /// Empties both feature layers and resets both cameras to the default view.
    pub fn clear<V: MapViewport>(&self, pair: &mut ViewportPair<V>) -> Result<()> {
        ensure_initialized(pair)?;
        let _suspended = pair.sync_flag().suspend();
        let (primary, secondary) = pair.both_mut().ok_or(MapError::ViewportsNotInitialized)?;
        for vp in [primary, secondary] {
            if let Some(layer) = vp.feature_layer_mut() {
                layer.clear_layers();
            }
            vp.set_view(self.default_center, self.default_zoom, ViewOptions::instant());
        }
        pair.discard_events();
        info!("cleared dataset");
        Ok(())
    }
}

fn replace_features<L: FeatureLayer>(layer: &mut L, features: &[Feature]) -> Result<()> {
    layer.clear_layers();
    for feature in features {
        layer.add_feature(feature.clone())?;
    }
    Ok(())
}

fn ensure_initialized<V: MapViewport>(pair: &ViewportPair<V>) -> Result<()> {
    let ready = |vp: Option<&V>| vp.is_some_and(|v| v.feature_layer().is_some());
    if ready(pair.primary()) && ready(pair.secondary()) {
        Ok(())
    } else {
        Err(MapError::ViewportsNotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{MemoryFeatureLayer, MemoryViewport, Side};

    fn square() -> GeoDataset {
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "block"}, "geometry": {"type": "Polygon",
             "coordinates": [[[2.0, 48.0], [2.1, 48.0], [2.1, 48.1], [2.0, 48.1], [2.0, 48.0]]]}}
        ]}"#
        .parse()
        .unwrap()
    }

    fn loader() -> DataLoadCoordinator {
        DataLoadCoordinator::new(LatLng::new(20.0, 0.0), 2.0)
    }

    #[test]
    fn load_fits_both_viewports() {
        let mut pair = ViewportPair::new(MemoryViewport::default(), MemoryViewport::default(), true);
        assert!(loader().load(&mut pair, &square()).unwrap());
        let bounds = square().bounds();
        for side in [Side::Primary, Side::Secondary] {
            let vp = pair.get(side).unwrap();
            assert!(bounds.contains(vp.center()));
            assert!(vp.zoom() > 2.0);
            assert_eq!(vp.feature_layer().unwrap().len(), 1);
            assert_eq!(vp.pending_events(), 0);
        }
        assert!(pair.is_syncing());
    }

    #[test]
    fn missing_layer_fails_without_mutation() {
        let mut pair = ViewportPair::new(
            MemoryViewport::default(),
            MemoryViewport::default().with_layer(None),
            true,
        );
        let err = loader().load(&mut pair, &square()).unwrap_err();
        assert!(matches!(err, MapError::ViewportsNotInitialized));
        assert_eq!(pair.primary().unwrap().feature_layer().unwrap().len(), 0);
        assert!(pair.is_syncing());
        assert!(matches!(loader().clear(&mut pair), Err(MapError::ViewportsNotInitialized)));
    }

    #[test]
    fn failed_insert_restores_sync() {
        let mut pair = ViewportPair::new(
            MemoryViewport::default(),
            MemoryViewport::default().with_layer(Some(MemoryFeatureLayer::with_capacity_limit(0))),
            true,
        );
        let err = loader().load(&mut pair, &square()).unwrap_err();
        assert!(matches!(err, MapError::Layer(_)));
        assert!(pair.is_syncing());
    }

    #[test]
    fn failed_load_keeps_both_layers_identical() {
        let mut pair = ViewportPair::new(
            MemoryViewport::default(),
            MemoryViewport::default().with_layer(Some(MemoryFeatureLayer::with_capacity_limit(1))),
            true,
        );
        loader().load(&mut pair, &square()).unwrap();
        let before = pair.primary().unwrap().camera();

        let two: GeoDataset = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [10.0, 50.0]}},
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [11.0, 51.0]}}
        ]}"#
        .parse()
        .unwrap();
        let err = loader().load(&mut pair, &two).unwrap_err();
        assert!(matches!(err, MapError::Layer(_)));

        for side in [Side::Primary, Side::Secondary] {
            let vp = pair.get(side).unwrap();
            assert_eq!(vp.feature_layer().unwrap().features(), square().features());
            assert_eq!(vp.camera(), before);
        }
        assert!(pair.is_syncing());
    }

    #[test]
    fn horizontal_line_refits_camera() {
        let line: GeoDataset = r#"{"type": "LineString", "coordinates": [[0.0, 10.0], [5.0, 10.0]]}"#
            .parse()
            .unwrap();
        let mut pair = ViewportPair::new(MemoryViewport::default(), MemoryViewport::default(), true);
        loader().load(&mut pair, &line).unwrap();
        for side in [Side::Primary, Side::Secondary] {
            let vp = pair.get(side).unwrap();
            assert_eq!(vp.center(), LatLng::new(10.0, 2.5));
            assert!(vp.zoom() > 2.0);
        }
    }

    #[test]
    fn clear_resets_view() {
        let mut pair = ViewportPair::new(MemoryViewport::default(), MemoryViewport::default(), false);
        loader().load(&mut pair, &square()).unwrap();
        loader().clear(&mut pair).unwrap();
        for side in [Side::Primary, Side::Secondary] {
            let vp = pair.get(side).unwrap();
            assert_eq!(vp.center(), LatLng::new(20.0, 0.0));
            assert_eq!(vp.zoom(), 2.0);
            assert!(vp.feature_layer().unwrap().is_empty());
        }
        assert!(!pair.is_syncing());
    }
}
