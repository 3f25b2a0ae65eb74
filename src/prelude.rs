//! Prelude module for common geoviewer types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use geoviewer::prelude::*;`

pub use crate::core::{
    config::{MarkerIcon, ViewerConfig},
    geo::{LatLng, LatLngBounds},
    viewport::Viewport,
};

pub use crate::layers::{
    actions::{
        apply_filtered_layer, load_filtered_layer, register_user_wms_layer, toggle_catalog_layer,
        toggle_user_wms_layer, PanelScope,
    },
    model::{ActiveGeoJsonLayer, ActiveLayers, ActiveWmsLayer, PathStyle, UserWmsLayer},
    ordering,
    store::{ActiveLayerStore, StoreChange, SubscriptionId},
};

pub use crate::data::geojson::{GeoJsonFeature, GeoJsonGeometry, ParsedGeoJson, Position};

pub use crate::surface::{
    reconciler::{attach, MapSurfaceReconciler, SharedReconciler},
    recording::{RecordingInspector, RecordingSurface, SurfaceOp},
    FeatureInspector, FeatureSymbol, InspectRequest, MapSurface, TileLayerOptions, VectorFeature,
    VectorLayerSpec, WmsTileOptions,
};

pub use crate::share::{
    decode_query, embed_code, encode_query, hydrate, resolve_viewport, share_link, DecodedView,
};

pub use crate::catalog::{
    client::HttpCatalogClient,
    feature_query_groups,
    models::{BaseLayer, InitialSettings, InternalLayer, WmsInformation},
    CatalogClient,
};

pub use crate::{GeoViewerError, Result};

pub use std::{cell::RefCell, rc::Rc};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
