//! Host facing facade tying the pair, scales, annotations and dataset
//! loading together.

use log::debug;

use crate::annotation::{AnnotationLayer, DrawEvent, ShapeId};
use crate::config::MapConfig;
use crate::dataset::GeoDataset;
use crate::error::Result;
use crate::loader::DataLoadCoordinator;
use crate::notify::{LogNotifier, NoticeLevel, Notifier};
use crate::scale::ScaleTable;
use crate::sync::{SyncState, ViewportPair};
use crate::viewport::{MapViewport, MemoryViewport, Side};

/// Everything a host application needs to drive the two map viewports.
pub struct MapSession<V: MapViewport> {
    config: MapConfig,
    pair: ViewportPair<V>,
    scales: ScaleTable,
    loader: DataLoadCoordinator,
    annotations: [AnnotationLayer; 2],
    notifier: Box<dyn Notifier>,
}

impl<V: MapViewport> MapSession<V> {
    /// Builds a session around two host viewports. Base layers from the
    /// configuration are applied to each viewport.
    pub fn new(config: MapConfig, mut primary: V, mut secondary: V, notifier: Box<dyn Notifier>) -> Result<Self> {
        config.validate()?;
        let scales = config.scale_table()?;
        primary.set_base_layer(&config.primary_base_layer);
        secondary.set_base_layer(&config.secondary_base_layer);
        let pair = ViewportPair::new(primary, secondary, config.sync_on_start);
        let loader = DataLoadCoordinator::new(config.default_center, config.default_zoom);
        Ok(Self {
            config,
            pair,
            scales,
            loader,
            annotations: [AnnotationLayer::new(Side::Primary), AnnotationLayer::new(Side::Secondary)],
            notifier,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn pair(&self) -> &ViewportPair<V> {
        &self.pair
    }

    pub fn pair_mut(&mut self) -> &mut ViewportPair<V> {
        &mut self.pair
    }

    pub fn viewport(&self, side: Side) -> Option<&V> {
        self.pair.get(side)
    }

    pub fn viewport_mut(&mut self, side: Side) -> Option<&mut V> {
        self.pair.get_mut(side)
    }

    pub fn scales(&self) -> &ScaleTable {
        &self.scales
    }

    /// Processes queued camera events. Call after every batch of user
    /// interaction.
    pub fn dispatch(&mut self) -> usize {
        self.pair.dispatch()
    }

    pub fn toggle_sync(&mut self) -> bool {
        let enabled = self.pair.toggle_sync();
        let message = if enabled { "Map sync enabled" } else { "Map sync disabled" };
        self.notifier.notify(NoticeLevel::Info, message);
        enabled
    }

    /// Sets the same zoom on both viewports.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.pair.set_zoom(zoom);
    }

    /// Resolves a scale label and applies its zoom to both viewports.
    pub fn set_scale(&mut self, label: &str) -> Result<()> {
        let zoom = self.scales.zoom_for_scale(label)?;
        debug!("scale {} -> zoom {}", label, zoom);
        self.pair.set_zoom(zoom);
        Ok(())
    }

    /// Scale label matching the primary viewport's current zoom.
    pub fn scale_label(&self) -> Option<&str> {
        self.pair
            .primary()
            .map(|vp| self.scales.label_for_zoom(vp.zoom()))
    }

    /// Loads a dataset into both viewports. Failures are reported through
    /// the notifier and yield `false`.
    pub fn load_dataset(&mut self, dataset: &GeoDataset) -> bool {
        match self.loader.load(&mut self.pair, dataset) {
            Ok(loaded) => {
                let message = format!("Loaded {} features", dataset.len());
                self.notifier.notify(NoticeLevel::Info, &message);
                loaded
            }
            Err(e) => {
                self.notifier
                    .notify(NoticeLevel::Error, &format!("Failed to load dataset: {}", e));
                false
            }
        }
    }

    pub fn clear_dataset(&mut self) -> bool {
        match self.loader.clear(&mut self.pair) {
            Ok(()) => true,
            Err(e) => {
                self.notifier
                    .notify(NoticeLevel::Error, &format!("Failed to clear dataset: {}", e));
                false
            }
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.pair.sync_state()
    }

    /// Switches the base imagery of one viewport only.
    pub fn set_base_layer(&mut self, side: Side, id: &str) -> Result<()> {
        let name = self.config.base_layer(id)?.name.clone();
        if let Some(vp) = self.pair.get_mut(side) {
            vp.set_base_layer(id);
            self.notifier
                .notify(NoticeLevel::Info, &format!("{} map now shows {}", side, name));
        }
        Ok(())
    }

    pub fn annotations(&self, side: Side) -> &AnnotationLayer {
        &self.annotations[side.index()]
    }

    pub fn annotations_mut(&mut self, side: Side) -> &mut AnnotationLayer {
        &mut self.annotations[side.index()]
    }

    /// Routes a draw tool event to the annotation layer of `side`.
    pub fn handle_draw(&mut self, side: Side, event: DrawEvent) -> Option<ShapeId> {
        self.annotations[side.index()].handle(event)
    }
}

impl MapSession<MemoryViewport> {
    /// Session backed by two in-memory viewports at the configured default
    /// view, logging notices through `log`.
    pub fn in_memory(config: MapConfig) -> Result<Self> {
        let primary = MemoryViewport::new(config.default_center, config.default_zoom);
        let secondary = MemoryViewport::new(config.default_center, config.default_zoom);
        Self::new(config, primary, secondary, Box::new(LogNotifier))
    }
}
