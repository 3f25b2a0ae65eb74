//! Viewer configuration
//!
//! A single serde-backed structure carries the catalog endpoint, the fallback
//! viewport and the styling defaults used when overlays are mounted. It can be
//! built from defaults, a JSON document, or a file, and then patched from the
//! environment.

use crate::constants::{
    DEFAULT_FILL_OPACITY, DEFAULT_PATH_COLOR, DEFAULT_PATH_WEIGHT, DEFAULT_REQUEST_TIMEOUT_MS,
    FILTERED_LAYER_COLOR, FILTERED_LAYER_FILL_OPACITY, FILTERED_LAYER_OPACITY,
    FILTERED_LAYER_Z_INDEX, MARKER_ICON_ANCHOR, MARKER_ICON_SIZE, MARKER_ICON_URL,
    MARKER_POPUP_ANCHOR, MARKER_SHADOW_ANCHOR, MARKER_SHADOW_SIZE, MARKER_SHADOW_URL,
};
use crate::core::viewport::Viewport;
use crate::layers::model::PathStyle;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`ViewerConfig::api_url`].
pub const ENV_API_URL: &str = "GEOVIEWER_API_URL";

/// Environment variable overriding [`ViewerConfig::share_base_url`].
pub const ENV_SHARE_BASE_URL: &str = "GEOVIEWER_SHARE_BASE_URL";

/// Icon substituted for Point and MultiPoint features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerIcon {
    pub icon_url: String,
    pub icon_size: (u32, u32),
    pub icon_anchor: (u32, u32),
    pub popup_anchor: (i32, i32),
    pub shadow_url: Option<String>,
    pub shadow_size: (u32, u32),
    pub shadow_anchor: (u32, u32),
}

impl Default for MarkerIcon {
    fn default() -> Self {
        Self {
            icon_url: MARKER_ICON_URL.to_string(),
            icon_size: MARKER_ICON_SIZE,
            icon_anchor: MARKER_ICON_ANCHOR,
            popup_anchor: MARKER_POPUP_ANCHOR,
            shadow_url: Some(MARKER_SHADOW_URL.to_string()),
            shadow_size: MARKER_SHADOW_SIZE,
            shadow_anchor: MARKER_SHADOW_ANCHOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    /// Base URL of the catalog REST API
    pub api_url: String,
    pub request_timeout_ms: u64,
    /// Used when neither a shared link nor the server provides a viewport
    pub default_viewport: Viewport,
    pub marker_icon: MarkerIcon,
    /// Base style for vector overlays, before per-layer overrides
    pub default_path_style: PathStyle,
    pub filtered_layer_style: PathStyle,
    pub filtered_layer_opacity: f64,
    pub filtered_layer_z_index: i32,
    /// Page URL that share links are built on
    pub share_base_url: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            default_viewport: Viewport::from_coords(-9.19, -75.0152, 6),
            marker_icon: MarkerIcon::default(),
            default_path_style: PathStyle::default()
                .color(DEFAULT_PATH_COLOR)
                .weight(DEFAULT_PATH_WEIGHT)
                .fill_opacity(DEFAULT_FILL_OPACITY),
            filtered_layer_style: PathStyle::default()
                .color(FILTERED_LAYER_COLOR)
                .weight(DEFAULT_PATH_WEIGHT)
                .opacity(FILTERED_LAYER_OPACITY)
                .fill_opacity(FILTERED_LAYER_FILL_OPACITY)
                .fill_color(FILTERED_LAYER_COLOR),
            filtered_layer_opacity: FILTERED_LAYER_OPACITY,
            filtered_layer_z_index: FILTERED_LAYER_Z_INDEX,
            share_base_url: "http://localhost:4200/".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parses a JSON document; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Applies `GEOVIEWER_API_URL` and `GEOVIEWER_SHARE_BASE_URL` when set.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = lookup(ENV_API_URL) {
            self.api_url = api_url;
        }
        if let Some(base) = lookup(ENV_SHARE_BASE_URL) {
            self.share_base_url = base;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api_url must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if !self.default_viewport.is_shareable() {
            return Err(Error::Config(format!(
                "default viewport {:?} is out of range",
                self.default_viewport
            )));
        }
        Ok(())
    }
}
