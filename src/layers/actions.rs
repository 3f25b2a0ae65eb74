//! User actions that end in a store mutation.
//!
//! These sit between catalog responses and the [`ActiveLayerStore`]: showing
//! and hiding layers, registering layers from external WMS services and
//! replacing filtered query results. Fetch-then-add flows run inside a
//! [`PanelScope`] so that results arriving after their panel closed are dropped.

use crate::catalog::models::{InternalLayer, WmsInformation};
use crate::catalog::CatalogClient;
use crate::constants::FILTERED_LAYER_PREFIX;
use crate::core::config::ViewerConfig;
use crate::layers::model::{ActiveGeoJsonLayer, ActiveWmsLayer, UserWmsLayer};
use crate::layers::store::ActiveLayerStore;
use crate::{Error, Result};
use futures::future::{AbortHandle, Abortable};
use fxhash::FxHashMap;
use serde_json::Value;
use std::cell::RefCell;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shows a catalog layer on top of the others, or hides it if already shown.
///
/// Returns whether the layer is active afterwards.
pub fn toggle_catalog_layer(store: &mut ActiveLayerStore, layer: &InternalLayer) -> bool {
    if store.remove_active_wms_layer(&layer.id) {
        return false;
    }
    let z_index = store.next_z_index();
    store.add_active_wms_layer(
        ActiveWmsLayer::new(&layer.id, &layer.name, &layer.title, &layer.url).with_z_index(z_index),
    );
    true
}

/// Registers one layer of an external WMS service under its remote name.
pub fn register_user_wms_layer(
    store: &mut ActiveLayerStore,
    info: &WmsInformation,
    layer_name: &str,
) -> Result<UserWmsLayer> {
    let advertised = info.layer(layer_name).ok_or_else(|| {
        Error::Layer(format!("{} does not advertise layer {}", info.url, layer_name))
    })?;
    let layer = UserWmsLayer {
        id: advertised.name.clone(),
        name: advertised.name.clone(),
        title: advertised.title.clone(),
        url: info.url.clone(),
    };
    store.add_user_wms_layer(layer.clone());
    Ok(layer)
}

/// Show/hide toggle for a registered user layer
pub fn toggle_user_wms_layer(store: &mut ActiveLayerStore, id: &str) -> Result<bool> {
    if store.remove_active_wms_layer(id) {
        return Ok(false);
    }
    let layer = store
        .user_wms_layers()
        .iter()
        .find(|layer| layer.id == id)
        .cloned()
        .ok_or_else(|| Error::Layer(format!("no registered WMS layer {}", id)))?;
    let z_index = store.next_z_index();
    store.add_active_wms_layer(layer.activate(z_index));
    Ok(true)
}

/// Id prefix shared by every filtered overlay of `layer_id`
pub fn filtered_layer_prefix(layer_id: &str) -> String {
    format!("{}{}_", FILTERED_LAYER_PREFIX, layer_id)
}

/// Replaces the filtered overlay of `layer_id` with a new result.
///
/// Earlier results for the same layer are removed first. A null `geojson`
/// (no matches) only clears them. Returns the id of the added overlay.
pub fn apply_filtered_layer(
    store: &mut ActiveLayerStore,
    layer_id: &str,
    title: &str,
    geojson: Value,
    config: &ViewerConfig,
) -> Option<String> {
    let prefix = filtered_layer_prefix(layer_id);
    store.remove_geojson_layers_with_prefix(&prefix);
    if geojson.is_null() {
        return None;
    }

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let id = format!("{}{}", prefix, millis);
    let layer = ActiveGeoJsonLayer::new(&id, layer_id, format!("{} Filtrada", title), geojson)
        .with_opacity(config.filtered_layer_opacity)
        .with_z_index(config.filtered_layer_z_index)
        .with_style(config.filtered_layer_style.clone());
    store.add_active_geojson_layer(layer);
    Some(id)
}

/// Cancellation context for the lifetime of one open panel.
///
/// Futures started through [`run`](Self::run) are aborted when the scope is
/// closed or dropped. Each future's abort handle is held only while it runs.
#[derive(Debug, Default)]
pub struct PanelScope {
    handles: Mutex<FxHashMap<u64, AbortHandle>>,
    next_key: AtomicU64,
    closed: AtomicBool,
}

/// Releases a running future's abort handle once it finishes or is dropped
struct RunGuard<'a> {
    scope: &'a PanelScope,
    key: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut handles) = self.scope.handles.lock() {
            handles.remove(&self.key);
        }
    }
}

impl PanelScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives `future` to completion unless the scope closes first.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        if self.is_closed() {
            return None;
        }
        let (handle, registration) = AbortHandle::new_pair();
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handles) = self.handles.lock() {
            handles.insert(key, handle);
        }
        let _guard = RunGuard { scope: self, key };
        Abortable::new(future, registration).await.ok()
    }

    /// Number of futures currently running in this scope
    pub fn running(&self) -> usize {
        self.handles.lock().map(|handles| handles.len()).unwrap_or_default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut handles) = self.handles.lock() {
            for (_, handle) in handles.drain() {
                handle.abort();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for PanelScope {
    fn drop(&mut self) {
        self.close();
    }
}

/// Fetches a filtered result and swaps it in, unless `scope` closed meanwhile.
///
/// Returns `Ok(None)` when the result was discarded or matched nothing. A
/// failed fetch leaves the store untouched.
pub async fn load_filtered_layer<C>(
    client: &C,
    store: &RefCell<ActiveLayerStore>,
    scope: &PanelScope,
    layer: &InternalLayer,
    filters: &Value,
    config: &ViewerConfig,
) -> Result<Option<String>>
where
    C: CatalogClient + ?Sized,
{
    let Some(result) = scope.run(client.filtered_layer(&layer.id, filters)).await else {
        #[cfg(feature = "debug")]
        log::debug!("Panel closed, dropping filtered result for layer {}", layer.id);
        return Ok(None);
    };
    let geojson = result?;
    let title = if layer.title.is_empty() {
        &layer.name
    } else {
        &layer.title
    };
    Ok(apply_filtered_layer(
        &mut store.borrow_mut(),
        &layer.id,
        title,
        geojson,
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::WmsLayerInfo;
    use serde_json::json;

    fn internal(id: &str) -> InternalLayer {
        InternalLayer {
            id: id.to_string(),
            category_name: "Transport".to_string(),
            name: format!("ws:{}", id),
            title: format!("Layer {}", id),
            description: String::new(),
            url: "https://geo.example.org/wms".to_string(),
            download_url: None,
        }
    }

    fn capabilities() -> WmsInformation {
        WmsInformation {
            url: "https://ext.example.org/wms".to_string(),
            name: "WMS".to_string(),
            title: "External".to_string(),
            version: "1.3.0".to_string(),
            description: String::new(),
            keywords: vec![],
            operations: vec![],
            layers: vec![WmsLayerInfo {
                name: "ext:rivers".to_string(),
                title: "Rivers".to_string(),
                summary: String::new(),
                keywords: vec![],
                bounding_box: vec![],
                styles: vec![],
                exports: vec![],
                thumbnail: String::new(),
            }],
        }
    }

    #[test]
    fn test_toggle_catalog_layer_stacks_on_top() {
        let mut store = ActiveLayerStore::new();
        assert!(toggle_catalog_layer(&mut store, &internal("a")));
        assert!(toggle_catalog_layer(&mut store, &internal("b")));
        assert_eq!(store.layers().wms_layer("b").unwrap().z_index, 2);

        assert!(!toggle_catalog_layer(&mut store, &internal("a")));
        assert!(!store.is_wms_active("a"));
        assert!(toggle_catalog_layer(&mut store, &internal("a")));
        assert_eq!(store.layers().wms_layer("a").unwrap().z_index, 3);
    }

    #[test]
    fn test_register_and_toggle_user_layer() {
        let mut store = ActiveLayerStore::new();
        let info = capabilities();

        assert!(matches!(
            register_user_wms_layer(&mut store, &info, "ext:roads"),
            Err(Error::Layer(_))
        ));
        let registered = register_user_wms_layer(&mut store, &info, "ext:rivers").unwrap();
        register_user_wms_layer(&mut store, &info, "ext:rivers").unwrap();
        assert_eq!(registered.id, "ext:rivers");
        assert_eq!(store.user_wms_layers().len(), 1);
        assert!(!store.is_wms_active("ext:rivers"));

        assert!(toggle_user_wms_layer(&mut store, "ext:rivers").unwrap());
        assert_eq!(store.wms_layers()[0].url, "https://ext.example.org/wms");
        assert!(!toggle_user_wms_layer(&mut store, "ext:rivers").unwrap());
        assert!(toggle_user_wms_layer(&mut store, "unknown").is_err());
    }

    #[test]
    fn test_filtered_layer_replaces_previous_result() {
        let mut store = ActiveLayerStore::new();
        let config = ViewerConfig::default();
        store.add_active_geojson_layer(ActiveGeoJsonLayer::new(
            "filtered_12_1",
            "12",
            "Other",
            json!(null),
        ));

        let empty = json!({"type": "FeatureCollection", "features": []});
        let first = apply_filtered_layer(&mut store, "1", "Roads", empty, &config).unwrap();
        assert!(first.starts_with("filtered_1_"));

        let layer = store.layers().geojson_layer(&first).unwrap();
        assert_eq!(layer.title, "Roads Filtrada");
        assert_eq!(layer.opacity, 0.8);
        assert_eq!(layer.z_index, 1000);
        assert_eq!(layer.style.as_ref().unwrap().fill_color.as_deref(), Some("#ff6b35"));

        assert!(apply_filtered_layer(&mut store, "1", "Roads", json!(null), &config).is_none());
        let ids: Vec<&str> = store.geojson_layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["filtered_12_1"]);
    }

    #[test]
    fn test_closed_scope_skips_future() {
        let scope = PanelScope::new();
        scope.close();
        let output = futures::executor::block_on(scope.run(async { 5 }));
        assert_eq!(output, None);

        let open = PanelScope::new();
        assert_eq!(futures::executor::block_on(open.run(async { 5 })), Some(5));
    }

    #[test]
    fn test_finished_runs_release_their_handles() {
        let scope = PanelScope::new();
        for i in 0..1000 {
            assert_eq!(futures::executor::block_on(scope.run(async move { i })), Some(i));
        }
        assert_eq!(scope.running(), 0);

        // a run dropped before completion is released too
        let mut pending = Box::pin(scope.run(futures::future::pending::<()>()));
        let waker = futures::task::noop_waker();
        let mut cx = std::task::Context::from_waker(&waker);
        assert!(pending.as_mut().poll(&mut cx).is_pending());
        assert_eq!(scope.running(), 1);
        drop(pending);
        assert_eq!(scope.running(), 0);
    }
}
