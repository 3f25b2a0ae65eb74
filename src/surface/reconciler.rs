//! Keeps a [`MapSurface`] in agreement with the active overlay lists.
//!
//! Each [`sync`](MapSurfaceReconciler::sync) runs two independent passes, WMS
//! first and GeoJSON second. A pass removes surface objects whose key is no
//! longer desired, updates the ones still desired in place and mounts the rest.
//! WMS objects are keyed by the remote layer `name`, GeoJSON objects by `id`.
//!
//! The reconciler remembers the parameters it last pushed to each object and
//! only issues an update when they differ, so repeated syncs over an unchanged
//! state are silent.

use crate::catalog::models::BaseLayer;
use crate::constants::{BASE_LAYER_Z_INDEX, WMS_IMAGE_FORMAT};
use crate::core::config::{MarkerIcon, ViewerConfig};
use crate::data::geojson::ParsedGeoJson;
use crate::layers::model::{ActiveGeoJsonLayer, ActiveLayers, ActiveWmsLayer, PathStyle};
use crate::layers::store::{ActiveLayerStore, SubscriptionId};
use crate::surface::{
    FeatureInspector, MapSurface, TileLayerOptions, VectorFeature, VectorLayerSpec, WmsTileOptions,
};
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

struct MountedBase<H> {
    id: String,
    handle: H,
}

struct MountedWms<H> {
    handle: H,
    opacity: f64,
    z_index: i32,
}

struct MountedGeoJson<H> {
    handle: H,
    style: PathStyle,
}

pub struct MapSurfaceReconciler<S: MapSurface> {
    surface: S,
    base: Option<MountedBase<S::Handle>>,
    wms: FxHashMap<String, MountedWms<S::Handle>>,
    geojson: FxHashMap<String, MountedGeoJson<S::Handle>>,
    base_style: PathStyle,
    marker: MarkerIcon,
    inspector: Option<Rc<dyn FeatureInspector>>,
    /// Latest state a store listener could not apply because the reconciler was borrowed
    deferred: Rc<RefCell<Option<ActiveLayers>>>,
}

/// Reconciler shared with a store subscription
pub type SharedReconciler<S> = Rc<RefCell<MapSurfaceReconciler<S>>>;

impl<S: MapSurface> MapSurfaceReconciler<S> {
    pub fn new(surface: S, config: &ViewerConfig) -> Self {
        Self {
            surface,
            base: None,
            wms: FxHashMap::default(),
            geojson: FxHashMap::default(),
            base_style: config.default_path_style.clone(),
            marker: config.marker_icon.clone(),
            inspector: None,
            deferred: Rc::new(RefCell::new(None)),
        }
    }

    /// Sets the receiver of feature clicks for layers mounted from now on
    pub fn with_inspector(mut self, inspector: Rc<dyn FeatureInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Id of the base layer currently shown
    pub fn base_layer_id(&self) -> Option<&str> {
        self.base.as_ref().map(|base| base.id.as_str())
    }

    /// Shows `layer` as the base map, removing the previous one.
    ///
    /// Only one base tile layer is ever mounted. Returns `false` when `layer`
    /// is already the base map.
    pub fn set_base_layer(&mut self, layer: &BaseLayer) -> bool {
        if self.base_layer_id() == Some(layer.id.as_str()) {
            return false;
        }
        if let Some(previous) = self.base.take() {
            #[cfg(feature = "debug")]
            log::debug!("Unmounting base layer {}", previous.id);
            self.surface.remove_layer(previous.handle);
        }

        #[cfg(feature = "debug")]
        log::debug!("Mounting base layer {} from {}", layer.id, layer.url);
        let handle = self.surface.add_tile_layer(&base_tile_options(layer));
        self.base = Some(MountedBase {
            id: layer.id.clone(),
            handle,
        });
        true
    }

    pub fn mounted_wms_count(&self) -> usize {
        self.wms.len()
    }

    pub fn mounted_geojson_count(&self) -> usize {
        self.geojson.len()
    }

    pub fn is_wms_mounted(&self, name: &str) -> bool {
        self.wms.contains_key(name)
    }

    pub fn is_geojson_mounted(&self, id: &str) -> bool {
        self.geojson.contains_key(id)
    }

    /// Whether a store change is waiting for [`flush`](Self::flush)
    pub fn has_deferred(&self) -> bool {
        self.deferred.borrow().is_some()
    }

    /// Applies the store state that arrived while the reconciler was borrowed.
    ///
    /// Returns `false` when nothing was pending.
    pub fn flush(&mut self) -> bool {
        let pending = self.deferred.borrow_mut().take();
        match pending {
            Some(layers) => {
                self.sync(&layers);
                true
            }
            None => false,
        }
    }

    /// Brings the surface in line with `layers`.
    pub fn sync(&mut self, layers: &ActiveLayers) {
        self.deferred.borrow_mut().take();
        self.sync_wms(&layers.wms);
        self.sync_geojson(&layers.geojson);
    }

    fn sync_wms(&mut self, layers: &[ActiveWmsLayer]) {
        // last entry wins when two layers share a name
        let mut desired: FxHashMap<&str, usize> = FxHashMap::default();
        for (index, layer) in layers.iter().enumerate() {
            desired.insert(layer.name.as_str(), index);
        }

        let mut stale: Vec<String> = self
            .wms
            .keys()
            .filter(|name| !desired.contains_key(name.as_str()))
            .cloned()
            .collect();
        stale.sort();
        for name in stale {
            if let Some(mounted) = self.wms.remove(&name) {
                #[cfg(feature = "debug")]
                log::debug!("Unmounting WMS layer {}", name);
                self.surface.remove_layer(mounted.handle);
            }
        }

        for (index, layer) in layers.iter().enumerate() {
            if desired.get(layer.name.as_str()) != Some(&index) {
                continue;
            }
            match self.wms.get_mut(&layer.name) {
                Some(mounted) => {
                    if mounted.opacity != layer.opacity {
                        self.surface.set_wms_opacity(&mounted.handle, layer.opacity);
                        mounted.opacity = layer.opacity;
                    }
                    if mounted.z_index != layer.z_index {
                        self.surface.set_wms_z_index(&mounted.handle, layer.z_index);
                        mounted.z_index = layer.z_index;
                    }
                }
                None => {
                    #[cfg(feature = "debug")]
                    log::debug!(
                        "Mounting WMS layer {} from {} at z {}",
                        layer.name,
                        layer.url,
                        layer.z_index
                    );
                    let handle = self.surface.add_wms_layer(&wms_tile_options(layer));
                    self.wms.insert(
                        layer.name.clone(),
                        MountedWms {
                            handle,
                            opacity: layer.opacity,
                            z_index: layer.z_index,
                        },
                    );
                }
            }
        }
    }

    fn sync_geojson(&mut self, layers: &[ActiveGeoJsonLayer]) {
        let desired: FxHashMap<&str, &ActiveGeoJsonLayer> =
            layers.iter().map(|layer| (layer.id.as_str(), layer)).collect();

        let mut stale: Vec<String> = self
            .geojson
            .keys()
            .filter(|id| !desired.contains_key(id.as_str()))
            .cloned()
            .collect();
        stale.sort();
        for id in stale {
            if let Some(mounted) = self.geojson.remove(&id) {
                #[cfg(feature = "debug")]
                log::debug!("Unmounting GeoJSON layer {}", id);
                self.surface.remove_layer(mounted.handle);
            }
        }

        for layer in layers {
            match self.geojson.get_mut(&layer.id) {
                Some(mounted) => {
                    let style = layer.update_style();
                    if mounted.style != style {
                        self.surface.set_vector_style(&mounted.handle, &style);
                        mounted.style = style;
                    }
                }
                None => self.mount_geojson(layer),
            }
        }
    }

    fn mount_geojson(&mut self, layer: &ActiveGeoJsonLayer) {
        let parsed = ParsedGeoJson::from_value(&layer.geojson);
        #[cfg(feature = "debug")]
        if parsed.skipped > 0 {
            log::debug!(
                "GeoJSON layer {} has {} unreadable feature(s)",
                layer.id,
                parsed.skipped
            );
        }

        let mut style = self
            .base_style
            .merged(&PathStyle::default().opacity(layer.opacity));
        if let Some(overrides) = &layer.style {
            style = style.merged(overrides);
        }

        let features: Vec<VectorFeature> = parsed
            .features
            .into_iter()
            .map(|feature| VectorFeature::from_feature(feature, &self.marker))
            .collect();
        let spec = VectorLayerSpec {
            id: layer.id.clone(),
            layer_id: layer.layer_id.clone(),
            features,
            style,
            inspector: self.inspector.clone(),
        };
        let bounds = spec.bounds();

        #[cfg(feature = "debug")]
        log::debug!(
            "Mounting GeoJSON layer {} with {} feature(s)",
            layer.id,
            spec.features.len()
        );
        let handle = self.surface.add_vector_layer(spec);
        self.geojson.insert(
            layer.id.clone(),
            MountedGeoJson {
                handle,
                style: layer.update_style(),
            },
        );

        match bounds {
            Some(bounds) if bounds.is_valid() => {
                #[cfg(feature = "debug")]
                log::debug!("Fitting camera to GeoJSON layer {}", layer.id);
                self.surface.fit_bounds(&bounds);
            }
            _ => {
                #[cfg(feature = "debug")]
                log::debug!("GeoJSON layer {} has no usable bounds", layer.id);
            }
        }
    }
}

fn base_tile_options(layer: &BaseLayer) -> TileLayerOptions {
    TileLayerOptions {
        id: layer.id.clone(),
        url: layer.url.clone(),
        attribution: layer.attribution.clone(),
        detect_retina: true,
        z_index: BASE_LAYER_Z_INDEX,
    }
}

fn wms_tile_options(layer: &ActiveWmsLayer) -> WmsTileOptions {
    WmsTileOptions {
        url: layer.url.clone(),
        layers: layer.name.clone(),
        format: WMS_IMAGE_FORMAT.to_string(),
        transparent: true,
        attribution: layer.title.clone(),
        opacity: layer.opacity,
        z_index: layer.z_index,
    }
}

/// Syncs the reconciler with `store` now and after every later change.
///
/// The subscription holds only a weak reference, so dropping every clone of
/// the returned handle stops further syncs. A change that arrives while the
/// reconciler is borrowed is kept and applied by the next sync or
/// [`flush`](MapSurfaceReconciler::flush).
pub fn attach<S>(
    reconciler: MapSurfaceReconciler<S>,
    store: &mut ActiveLayerStore,
) -> (SharedReconciler<S>, SubscriptionId)
where
    S: MapSurface + 'static,
{
    let shared = Rc::new(RefCell::new(reconciler));
    shared.borrow_mut().sync(store.layers());

    let weak = Rc::downgrade(&shared);
    let deferred = Rc::clone(&shared.borrow().deferred);
    let id = store.subscribe(move |change, layers| {
        if !change.touches_active_layers() {
            return;
        }
        let Some(shared) = weak.upgrade() else {
            return;
        };
        match shared.try_borrow_mut() {
            Ok(mut reconciler) => reconciler.sync(layers),
            Err(_) => {
                #[cfg(feature = "debug")]
                log::debug!("Reconciler busy, deferring sync after {:?}", change);
                *deferred.borrow_mut() = Some(layers.clone());
            }
        };
    });
    (shared, id)
}
