//! Shareable views.
//!
//! A view is the viewport plus the active WMS list, carried in the query
//! parameters `lat`, `lng`, `zoom` and `layers`. Decoding is lenient: broken
//! layer entries are dropped one by one and an unusable viewport is simply
//! absent, leaving the caller to fall back to its default.

pub mod codec;

use crate::constants::{PARAM_LAT, PARAM_LAYERS, PARAM_LNG, PARAM_ZOOM, SHARED_COORD_PRECISION};
use crate::core::geo::LatLng;
use crate::core::viewport::Viewport;
use crate::layers::model::ActiveWmsLayer;
use crate::layers::store::ActiveLayerStore;
use crate::Result;
use url::Url;

/// What survived decoding a shared query string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedView {
    /// Present only when `lat`, `lng` and `zoom` were all given and in range
    pub viewport: Option<Viewport>,
    pub layers: Vec<ActiveWmsLayer>,
    /// Layer entries that could not be read
    pub dropped: usize,
}

impl DecodedView {
    /// Decodes the query part of a full URL
    pub fn from_url(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(decode_query(url.query().unwrap_or_default()))
    }
}

/// Builds the query string for a view, without a leading `?`.
///
/// Coordinates keep full precision, so decoding yields the same viewport.
pub fn encode_query(viewport: &Viewport, layers: &[ActiveWmsLayer]) -> String {
    let mut query = format!(
        "{}={}&{}={}&{}={}",
        PARAM_LAT, viewport.center.lat, PARAM_LNG, viewport.center.lng, PARAM_ZOOM, viewport.zoom
    );
    push_layers(&mut query, layers);
    query
}

fn push_layers(query: &mut String, layers: &[ActiveWmsLayer]) {
    if layers.is_empty() {
        return;
    }
    let entries: Vec<String> = layers.iter().map(codec::encode_layer).collect();
    query.push('&');
    query.push_str(PARAM_LAYERS);
    query.push('=');
    query.push_str(&entries.join(","));
}

pub fn decode_query(query: &str) -> DecodedView {
    let mut lat = None;
    let mut lng = None;
    let mut zoom = None;
    let mut view = DecodedView::default();

    for (key, raw) in codec::split_query(query) {
        match key.as_str() {
            PARAM_LAT => lat = parse_coordinate(raw),
            PARAM_LNG => lng = parse_coordinate(raw),
            PARAM_ZOOM => {
                zoom = codec::decode_component(raw)
                    .ok()
                    .and_then(|z| codec::parse_zoom(&z))
            }
            PARAM_LAYERS => {
                for entry in raw.split(',').filter(|entry| !entry.is_empty()) {
                    match codec::decode_layer(entry) {
                        Ok(layer) => view.layers.push(layer),
                        Err(_e) => {
                            #[cfg(feature = "debug")]
                            log::warn!("Dropping shared layer entry {}: {}", entry, _e);
                            view.dropped += 1;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if let (Some(lat), Some(lng), Some(zoom)) = (lat, lng, zoom) {
        let viewport = Viewport::from_coords(lat, lng, zoom);
        if viewport.is_shareable() {
            view.viewport = Some(viewport);
        }
    }
    view
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    codec::decode_component(raw)
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// The shared viewport when there is one, `fallback` otherwise
pub fn resolve_viewport(decoded: &DecodedView, fallback: Viewport) -> Viewport {
    match decoded.viewport {
        Some(viewport) => viewport,
        None => {
            #[cfg(feature = "debug")]
            log::debug!("No usable shared viewport, using {:?}", fallback);
            fallback
        }
    }
}

/// Replaces the active WMS list with the shared layers.
///
/// Does nothing when no entry survived decoding; returns whether the store
/// was touched.
pub fn hydrate(store: &mut ActiveLayerStore, decoded: &DecodedView) -> bool {
    if decoded.layers.is_empty() {
        return false;
    }
    store.replace_active_wms_layers(decoded.layers.clone());
    true
}

/// Full share link on top of `base_url`, with coordinates rounded to six decimals.
pub fn share_link(
    base_url: &str,
    viewport: &Viewport,
    layers: &[ActiveWmsLayer],
) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    let mut query = format!(
        "{}={:.prec$}&{}={:.prec$}&{}={}",
        PARAM_LAT,
        viewport.center.lat,
        PARAM_LNG,
        viewport.center.lng,
        PARAM_ZOOM,
        viewport.zoom,
        prec = SHARED_COORD_PRECISION
    );
    push_layers(&mut query, layers);
    url.set_query(Some(&query));
    Ok(url.into())
}

/// HTML snippet embedding the shared view
pub fn embed_code(link: &str) -> String {
    format!(
        r#"<iframe src="{}" width="100%" height="400" frameborder="0" allowfullscreen></iframe>"#,
        link
    )
}

pub fn google_maps_link(viewport: &Viewport) -> String {
    format!(
        "https://www.google.com/maps/@{},{},{}z",
        viewport.center.lat, viewport.center.lng, viewport.zoom
    )
}

pub fn street_view_link(point: &LatLng) -> String {
    format!(
        "https://www.google.com/maps/@?api=1&map_action=pano&viewpoint={},{}",
        point.lat, point.lng
    )
}
