//! Active overlay descriptors held by the [`ActiveLayerStore`](super::store::ActiveLayerStore).

use serde::{Deserialize, Serialize};

/// A WMS raster overlay currently instructed to render.
///
/// Identity is `id`; the remote service knows the layer by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWmsLayer {
    pub id: String,
    pub name: String,
    pub title: String,
    pub url: String,
    pub opacity: f64,
    pub z_index: i32,
}

impl ActiveWmsLayer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: title.into(),
            url: url.into(),
            opacity: 1.0,
            z_index: 1,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

/// Path styling for vector overlays; unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

impl PathStyle {
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn fill_opacity(mut self, fill_opacity: f64) -> Self {
        self.fill_opacity = Some(fill_opacity);
        self
    }

    pub fn fill_color(mut self, fill_color: impl Into<String>) -> Self {
        self.fill_color = Some(fill_color.into());
        self
    }

    /// Returns `self` with every field set in `overrides` replaced.
    pub fn merged(&self, overrides: &PathStyle) -> PathStyle {
        PathStyle {
            color: overrides.color.clone().or_else(|| self.color.clone()),
            weight: overrides.weight.or(self.weight),
            opacity: overrides.opacity.or(self.opacity),
            fill_opacity: overrides.fill_opacity.or(self.fill_opacity),
            fill_color: overrides
                .fill_color
                .clone()
                .or_else(|| self.fill_color.clone()),
        }
    }
}

/// A GeoJSON vector overlay currently instructed to render.
///
/// `geojson` is kept as raw JSON; it is only interpreted when mounted, so a
/// malformed payload still yields a (featureless) overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGeoJsonLayer {
    pub id: String,
    /// Catalog layer the features were queried from
    pub layer_id: String,
    pub name: String,
    pub title: String,
    pub geojson: serde_json::Value,
    pub opacity: f64,
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<PathStyle>,
}

impl ActiveGeoJsonLayer {
    pub fn new(
        id: impl Into<String>,
        layer_id: impl Into<String>,
        title: impl Into<String>,
        geojson: serde_json::Value,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            layer_id: layer_id.into(),
            name: title.clone(),
            title,
            geojson,
            opacity: 1.0,
            z_index: 1,
            style: None,
        }
    }

    pub fn with_style(mut self, style: PathStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Style pushed to an already mounted overlay: the per-layer override with
    /// the layer opacity on top.
    pub fn update_style(&self) -> PathStyle {
        self.style
            .clone()
            .unwrap_or_default()
            .merged(&PathStyle::default().opacity(self.opacity))
    }
}

/// A WMS layer registered by the user from a capability document.
///
/// Registered layers are not displayed until promoted into an [`ActiveWmsLayer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWmsLayer {
    pub id: String,
    pub name: String,
    pub title: String,
    pub url: String,
}

impl UserWmsLayer {
    /// Promotes the registration into an active overlay at the given stacking order.
    pub fn activate(&self, z_index: i32) -> ActiveWmsLayer {
        ActiveWmsLayer::new(&self.id, &self.name, &self.title, &self.url).with_z_index(z_index)
    }
}

/// Snapshot of both active overlay lists, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveLayers {
    pub wms: Vec<ActiveWmsLayer>,
    pub geojson: Vec<ActiveGeoJsonLayer>,
}

impl ActiveLayers {
    pub fn wms_layer(&self, id: &str) -> Option<&ActiveWmsLayer> {
        self.wms.iter().find(|layer| layer.id == id)
    }

    pub fn geojson_layer(&self, id: &str) -> Option<&ActiveGeoJsonLayer> {
        self.geojson.iter().find(|layer| layer.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.wms.is_empty() && self.geojson.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_style_merge_prefers_overrides() {
        let base = PathStyle::default()
            .color("#3388ff")
            .weight(2.0)
            .opacity(1.0)
            .fill_opacity(0.2);
        let overrides = PathStyle::default().color("#ff6b35").fill_color("#ff6b35");

        let merged = base.merged(&overrides);
        assert_eq!(merged.color.as_deref(), Some("#ff6b35"));
        assert_eq!(merged.fill_color.as_deref(), Some("#ff6b35"));
        assert_eq!(merged.weight, Some(2.0));
        assert_eq!(merged.fill_opacity, Some(0.2));
    }

    #[test]
    fn test_update_style_puts_layer_opacity_last() {
        let layer = ActiveGeoJsonLayer::new("g", "l", "G", json!(null))
            .with_style(PathStyle::default().color("#000").opacity(0.3))
            .with_opacity(0.7);

        let style = layer.update_style();
        assert_eq!(style.opacity, Some(0.7));
        assert_eq!(style.color.as_deref(), Some("#000"));
    }

    #[test]
    fn test_wms_layer_uses_camel_case_keys() {
        let layer = ActiveWmsLayer::new("a", "ws:roads", "Roads", "https://example.org/wms")
            .with_z_index(3);
        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(value["zIndex"], json!(3));
        assert_eq!(value["opacity"], json!(1.0));
    }

    #[test]
    fn test_user_layer_activation() {
        let user = UserWmsLayer {
            id: "ws:rivers".to_string(),
            name: "ws:rivers".to_string(),
            title: "Rivers".to_string(),
            url: "https://example.org/wms".to_string(),
        };
        let active = user.activate(4);
        assert_eq!(active.id, "ws:rivers");
        assert_eq!(active.opacity, 1.0);
        assert_eq!(active.z_index, 4);
    }
}
