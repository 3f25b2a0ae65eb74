//! # geoviewer
//!
//! Active-layer composition for a catalog-driven web map viewer.
//!
//! The crate keeps a declarative list of active overlays (WMS raster layers and
//! GeoJSON vector layers), orders and restyles them, and reconciles that list
//! against whatever rendering surface hosts the map. Views can be shared as URL
//! query strings and restored from them.

pub mod catalog;
pub mod core;
pub mod data;
pub mod layers;
pub mod prelude;
pub mod share;
pub mod surface;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::ViewerConfig,
    geo::{LatLng, LatLngBounds},
    viewport::Viewport,
};

pub use layers::{
    model::{ActiveGeoJsonLayer, ActiveLayers, ActiveWmsLayer, PathStyle, UserWmsLayer},
    store::{ActiveLayerStore, StoreChange, SubscriptionId},
};

pub use surface::{reconciler::MapSurfaceReconciler, MapSurface};

pub use catalog::{client::HttpCatalogClient, CatalogClient};

pub use data::geojson::GeoJsonGeometry;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, GeoViewerError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum GeoViewerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("API error: {message}")]
    Api { message: String },
}

/// Error type alias for convenience
pub type Error = GeoViewerError;
