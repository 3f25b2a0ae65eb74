//! Viewer-wide defaults derived from Leaflet conventions and the shared-link format.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Query parameter carrying the viewport latitude.
pub const PARAM_LAT: &str = "lat";

/// Query parameter carrying the viewport longitude.
pub const PARAM_LNG: &str = "lng";

/// Query parameter carrying the viewport zoom.
pub const PARAM_ZOOM: &str = "zoom";

/// Query parameter carrying the comma-joined active WMS layers.
pub const PARAM_LAYERS: &str = "layers";

/// Zoom range accepted from a shared link.
pub const MIN_SHARED_ZOOM: u8 = 1;
pub const MAX_SHARED_ZOOM: u8 = 20;

/// Decimal places used for lat/lng in generated share links.
pub const SHARED_COORD_PRECISION: usize = 6;

/// Base map tiles sit below every overlay.
pub const BASE_LAYER_Z_INDEX: i32 = 0;

/// Image format requested from WMS servers.
pub const WMS_IMAGE_FORMAT: &str = "image/png";

/// Default vector stroke (Leaflet's path blue).
pub const DEFAULT_PATH_COLOR: &str = "#3388ff";
pub const DEFAULT_PATH_WEIGHT: f64 = 2.0;
pub const DEFAULT_FILL_OPACITY: f64 = 0.2;

/// Style given to filtered query results.
pub const FILTERED_LAYER_COLOR: &str = "#ff6b35";
pub const FILTERED_LAYER_OPACITY: f64 = 0.8;
pub const FILTERED_LAYER_FILL_OPACITY: f64 = 0.4;

/// Filtered overlays are stacked above catalog overlays.
pub const FILTERED_LAYER_Z_INDEX: i32 = 1000;

/// Id prefix for overlays produced by a filter query.
pub const FILTERED_LAYER_PREFIX: &str = "filtered_";

/// Marker icon used for point features.
pub const MARKER_ICON_URL: &str = "https://i.postimg.cc/Cx43MmyF/marker-icon.png";
pub const MARKER_SHADOW_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.7.1/images/marker-shadow.png";

/// Marker icon default size (regular PNG).
pub const MARKER_ICON_SIZE: (u32, u32) = (25, 41);

/// Anchor inside the icon (hot-spot) in pixel coords.
pub const MARKER_ICON_ANCHOR: (u32, u32) = (12, 41);

/// Popup offset relative to the icon anchor.
pub const MARKER_POPUP_ANCHOR: (i32, i32) = (1, -34);

pub const MARKER_SHADOW_SIZE: (u32, u32) = (41, 41);
pub const MARKER_SHADOW_ANCHOR: (u32, u32) = (12, 41);

/// Feature property holding the row id used by the inspector.
pub const FEATURE_ID_PROPERTY: &str = "_id";

/// HTTP timeout for catalog requests.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
