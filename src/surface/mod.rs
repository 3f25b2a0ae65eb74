//! The rendering surface boundary.
//!
//! [`MapSurface`] is the small set of commands the reconciler issues against
//! whatever actually draws the map. Tile fetching, projection and hit testing
//! stay on the other side of this trait.

pub mod reconciler;
pub mod recording;

use crate::core::config::MarkerIcon;
use crate::core::geo::LatLngBounds;
use crate::data::geojson::{GeoJsonFeature, GeoJsonGeometry};
use crate::layers::model::PathStyle;
use std::rc::Rc;

/// Commands understood by a map rendering surface.
///
/// Handles are opaque to the reconciler; it only stores them and hands them
/// back.
pub trait MapSurface {
    type Handle;

    /// Mounts a plain XYZ tile layer, used for the base map
    fn add_tile_layer(&mut self, options: &TileLayerOptions) -> Self::Handle;

    fn add_wms_layer(&mut self, options: &WmsTileOptions) -> Self::Handle;

    fn set_wms_opacity(&mut self, handle: &Self::Handle, opacity: f64);

    fn set_wms_z_index(&mut self, handle: &Self::Handle, z_index: i32);

    fn add_vector_layer(&mut self, spec: VectorLayerSpec) -> Self::Handle;

    fn set_vector_style(&mut self, handle: &Self::Handle, style: &PathStyle);

    fn remove_layer(&mut self, handle: Self::Handle);

    /// Moves the camera so `bounds` is in view
    fn fit_bounds(&mut self, bounds: &LatLngBounds);
}

/// Parameters of an XYZ tile layer
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayerOptions {
    pub id: String,
    /// Url template with `{z}`, `{x}` and `{y}` placeholders
    pub url: String,
    pub attribution: String,
    pub detect_retina: bool,
    pub z_index: i32,
}

/// Parameters of a WMS raster tile layer
#[derive(Debug, Clone, PartialEq)]
pub struct WmsTileOptions {
    pub url: String,
    /// Remote layer name(s), sent as the WMS `LAYERS` parameter
    pub layers: String,
    pub format: String,
    pub transparent: bool,
    pub attribution: String,
    pub opacity: f64,
    pub z_index: i32,
}

/// How a single feature is drawn
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSymbol {
    Marker(MarkerIcon),
    Path,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    pub geometry: Option<GeoJsonGeometry>,
    pub symbol: FeatureSymbol,
    /// Row id handed to the inspector on click
    pub inspect_id: Option<String>,
}

impl VectorFeature {
    pub fn from_feature(feature: GeoJsonFeature, marker: &MarkerIcon) -> Self {
        let symbol = match &feature.geometry {
            Some(geometry) if geometry.is_point_like() => FeatureSymbol::Marker(marker.clone()),
            _ => FeatureSymbol::Path,
        };
        Self {
            inspect_id: feature.inspect_id(),
            geometry: feature.geometry,
            symbol,
        }
    }
}

/// Request to open the detail view of one feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectRequest {
    pub feature_id: Option<String>,
    pub layer_id: String,
}

/// Receives feature clicks from mounted vector layers
pub trait FeatureInspector {
    fn inspect(&self, request: InspectRequest);
}

/// Everything a surface needs to mount one GeoJSON overlay.
#[derive(Clone)]
pub struct VectorLayerSpec {
    pub id: String,
    /// Catalog layer the features belong to
    pub layer_id: String,
    pub features: Vec<VectorFeature>,
    pub style: PathStyle,
    pub inspector: Option<Rc<dyn FeatureInspector>>,
}

impl VectorLayerSpec {
    pub fn marker_count(&self) -> usize {
        self.features
            .iter()
            .filter(|f| matches!(f.symbol, FeatureSymbol::Marker(_)))
            .count()
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(GeoJsonGeometry::bounds))
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn inspect_request(&self, index: usize) -> Option<InspectRequest> {
        let feature = self.features.get(index)?;
        Some(InspectRequest {
            feature_id: feature.inspect_id.clone(),
            layer_id: self.layer_id.clone(),
        })
    }

    /// Forwards a click on feature `index` to the inspector.
    ///
    /// Returns `false` when there is no such feature or no inspector.
    pub fn click(&self, index: usize) -> bool {
        match (&self.inspector, self.inspect_request(index)) {
            (Some(inspector), Some(request)) => {
                inspector.inspect(request);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for VectorLayerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorLayerSpec")
            .field("id", &self.id)
            .field("layer_id", &self.layer_id)
            .field("features", &self.features.len())
            .field("style", &self.style)
            .field("inspector", &self.inspector.is_some())
            .finish()
    }
}
