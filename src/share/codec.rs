//! Query-string plumbing for shared views.
//!
//! Layer entries are JSON objects escaped the way browsers escape a URI
//! component, then joined with raw commas. A comma inside an entry is always
//! escaped, so splitting the raw parameter value on ',' recovers the entries.

use crate::layers::model::ActiveWmsLayer;
use crate::{Error, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Value};

/// Characters left as-is by `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

pub fn decode_component(input: &str) -> Result<String> {
    percent_decode_str(input)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::ParseError(format!("invalid percent-encoding: {}", e)))
}

/// Splits a raw query into `(decoded key, raw value)` pairs.
///
/// Values stay encoded so that escaped separators inside them survive.
pub fn split_query(query: &str) -> Vec<(String, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(&key.replace('+', " ")).unwrap_or_else(|_| key.to_string());
            (key, value)
        })
        .collect()
}

pub fn encode_layer(layer: &ActiveWmsLayer) -> String {
    let entry = json!({
        "id": layer.id,
        "name": layer.name,
        "title": layer.title,
        "url": layer.url,
        "opacity": layer.opacity,
        "zIndex": layer.z_index,
    });
    encode_component(&entry.to_string())
}

/// Decodes one shared layer entry.
///
/// `id`, `name`, `title` and `url` must be present and non-empty. A missing or
/// null `opacity` or `zIndex` becomes `1`.
pub fn decode_layer(raw: &str) -> Result<ActiveWmsLayer> {
    let decoded = decode_component(raw)?;
    let entry: Value = serde_json::from_str(&decoded)?;
    if !entry.is_object() {
        return Err(Error::ParseError(format!(
            "layer entry is not an object: {}",
            decoded
        )));
    }

    let field = |key: &str| -> Result<String> {
        required_text(entry.get(key))
            .ok_or_else(|| Error::ParseError(format!("layer entry lacks `{}`", key)))
    };
    let layer = ActiveWmsLayer::new(field("id")?, field("name")?, field("title")?, field("url")?)
        .with_opacity(entry.get("opacity").and_then(Value::as_f64).unwrap_or(1.0))
        .with_z_index(
            entry
                .get("zIndex")
                .and_then(Value::as_f64)
                .filter(|z| z.is_finite())
                .map(|z| z.trunc() as i32)
                .unwrap_or(1),
        );
    Ok(layer)
}

fn required_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer zoom from a query value; a fractional part is discarded.
pub fn parse_zoom(raw: &str) -> Option<u8> {
    let zoom = raw.trim().parse::<f64>().ok()?.trunc();
    if zoom.is_finite() && (0.0..=f64::from(u8::MAX)).contains(&zoom) {
        Some(zoom as u8)
    } else {
        None
    }
}
