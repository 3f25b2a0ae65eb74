//! Catalog collaborators: the typed contract of the backend API and helpers
//! that turn active state into catalog queries.

pub mod client;
pub mod models;

use crate::layers::model::ActiveWmsLayer;
use crate::Result;
use async_trait::async_trait;
use models::{
    BaseLayer, InitialSettings, InternalLayer, LayerInformationTable, WmsFeature,
    WmsFeatureRequest, WmsInformation,
};
use serde_json::Value;

/// Read access to the map catalog.
///
/// Every call resolves to the `data` of a successful response envelope; a
/// failed envelope becomes [`Error::Api`](crate::Error::Api).
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn initial_settings(&self) -> Result<InitialSettings>;

    async fn base_layers(&self) -> Result<Vec<BaseLayer>>;

    /// Capability summary of an external WMS service
    async fn wms_information(&self, url: &str) -> Result<WmsInformation>;

    async fn wms_feature_information(&self, request: &WmsFeatureRequest)
        -> Result<Vec<WmsFeature>>;

    async fn layers_by_category(
        &self,
        category_id: &str,
        include_wms_layers: bool,
    ) -> Result<Vec<InternalLayer>>;

    async fn layer_by_id(&self, layer_id: &str) -> Result<InternalLayer>;

    async fn layer_information_table(&self, layer_id: &str) -> Result<LayerInformationTable>;

    /// GeoJSON of the rows matching `filters`
    async fn filtered_layer(&self, layer_id: &str, filters: &Value) -> Result<Value>;

    /// GeoJSON of a single row
    async fn geojson_layer(&self, layer_id: &str, row_id: &str) -> Result<Value>;

    async fn summary(&self, layer_id: &str) -> Result<Value>;

    async fn graphs(&self, layer_id: &str) -> Result<Value>;

    async fn tendencies(&self, layer_id: &str) -> Result<Value>;
}

/// Groups active layer names by service URL, one entry per service.
///
/// Services keep the order in which they first appear; names are
/// comma-joined, ready for a single GetFeatureInfo request.
pub fn feature_query_groups(layers: &[ActiveWmsLayer]) -> Vec<(String, String)> {
    let mut groups: Vec<(String, Vec<&str>)> = Vec::new();
    for layer in layers {
        match groups.iter_mut().find(|(url, _)| *url == layer.url) {
            Some((_, names)) => names.push(&layer.name),
            None => groups.push((layer.url.clone(), vec![&layer.name])),
        }
    }
    groups
        .into_iter()
        .map(|(url, names)| (url, names.join(",")))
        .collect()
}
