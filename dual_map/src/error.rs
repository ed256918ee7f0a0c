//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors surfaced by the map core.
#[derive(Debug, Error)]
pub enum MapError {
    /// A scale label that is not present in the active [`ScaleTable`](crate::scale::ScaleTable).
    #[error("unknown scale label: {0}")]
    UnknownScale(String),

    /// One or both viewports (or their feature layers) have not been constructed yet.
    #[error("viewports are not initialized")]
    ViewportsNotInitialized,

    /// A base layer id that is not part of the configured catalog.
    #[error("unknown base layer: {0}")]
    UnknownBaseLayer(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A feature layer rejected an insertion.
    #[error("feature layer error: {0}")]
    Layer(String),

    #[error("GeoJSON error: {0}")]
    Dataset(#[from] geojson::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, MapError>;
