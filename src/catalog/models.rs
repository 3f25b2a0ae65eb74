//! Wire types of the catalog API. All keys are camelCase on the wire.

use crate::core::viewport::Viewport;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Envelope wrapping every catalog response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub trace: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Unwraps `data`, turning a failed status into [`Error::Api`].
    pub fn into_result(self) -> Result<T> {
        if !self.status {
            return Err(Error::Api {
                message: self.message,
            });
        }
        self.data.ok_or_else(|| Error::Api {
            message: format!("response without data: {}", self.message),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLayer {
    pub id: String,
    pub name: String,
    pub url: String,
    pub attribution: String,
}

/// WMS layer configured by an administrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsLayer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub attribution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialSettings {
    pub lat_long: Vec<f64>,
    pub zoom: u8,
    pub has_attribution: bool,
    #[serde(default)]
    pub base_layers: Vec<BaseLayer>,
    #[serde(default)]
    pub default_base_layer_id: Option<String>,
    #[serde(default)]
    pub wms_layers: Vec<WmsLayer>,
    #[serde(default)]
    pub default_wms_layer_ids: Vec<String>,
}

impl InitialSettings {
    /// Server-side default view; `None` when `lat_long` is incomplete
    pub fn viewport(&self) -> Option<Viewport> {
        Viewport::from_lat_long(&self.lat_long, self.zoom)
    }

    /// The base layer named by `default_base_layer_id`, if it is listed
    pub fn default_base_layer(&self) -> Option<&BaseLayer> {
        let id = self.default_base_layer_id.as_deref()?;
        self.base_layers.iter().find(|layer| layer.id == id)
    }
}

/// Layer of the internal catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalLayer {
    pub id: String,
    #[serde(default)]
    pub category_name: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsStyle {
    pub title: String,
    pub legend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsExport {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One layer advertised by a WMS capability document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsLayerInfo {
    pub name: String,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub bounding_box: Vec<f64>,
    #[serde(default)]
    pub styles: Vec<WmsStyle>,
    #[serde(default)]
    pub exports: Vec<WmsExport>,
    #[serde(default)]
    pub thumbnail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsInformation {
    pub url: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub layers: Vec<WmsLayerInfo>,
}

impl WmsInformation {
    pub fn layer(&self, name: &str) -> Option<&WmsLayerInfo> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

/// GetFeatureInfo query for a clicked map pixel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsFeatureRequest {
    pub url: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// `minx,miny,maxx,maxy` of the current map view
    pub bounding_box: String,
    /// Comma-joined layer names
    pub layers: String,
    #[serde(default)]
    pub filters: Option<Vec<String>>,
}

impl WmsFeatureRequest {
    /// Query pairs as sent to the backend; absent filters are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("url", self.url.clone()),
            ("x", self.x.to_string()),
            ("y", self.y.to_string()),
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("boundingBox", self.bounding_box.clone()),
            ("layers", self.layers.clone()),
        ];
        if let Some(filters) = &self.filters {
            pairs.extend(filters.iter().map(|filter| ("filters", filter.clone())));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsFeatureProperty {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsFeature {
    pub information: Vec<WmsFeatureProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInformationOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInformationFilter {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub options: Vec<LayerInformationOption>,
}

/// Tabular view of a vector layer together with the filters it supports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInformationTable {
    #[serde(default)]
    pub columns: Vec<serde_json::Value>,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub filters: Vec<LayerInformationFilter>,
}
