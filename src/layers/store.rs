//! The canonical list of active overlays.
//!
//! The store owns both active lists plus the user's registered WMS layers.
//! Every mutation that changes something notifies observers synchronously,
//! before the mutating call returns: callback listeners first, in subscription
//! order, then channel subscribers. Calls that change nothing (adding a
//! duplicate id, removing an absent one) do not notify.

use crate::layers::model::{ActiveGeoJsonLayer, ActiveLayers, ActiveWmsLayer, UserWmsLayer};
use crate::layers::ordering;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Handle returned by [`ActiveLayerStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What a mutation changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    WmsAdded(String),
    WmsRemoved(String),
    WmsCleared,
    WmsOpacityChanged(String),
    WmsReordered(String),
    GeoJsonAdded(String),
    GeoJsonRemoved(String),
    GeoJsonCleared,
    UserWmsAdded(String),
    UserWmsRemoved(String),
}

impl StoreChange {
    /// Whether the change can affect what is drawn on the map
    pub fn touches_active_layers(&self) -> bool {
        !matches!(
            self,
            StoreChange::UserWmsAdded(_) | StoreChange::UserWmsRemoved(_)
        )
    }
}

type Listener = Box<dyn FnMut(&StoreChange, &ActiveLayers)>;

pub struct ActiveLayerStore {
    layers: ActiveLayers,
    user_wms_layers: Vec<UserWmsLayer>,
    listeners: Vec<(SubscriptionId, Listener)>,
    channels: Vec<Sender<StoreChange>>,
    next_subscription: u64,
}

impl ActiveLayerStore {
    pub fn new() -> Self {
        Self {
            layers: ActiveLayers::default(),
            user_wms_layers: Vec::new(),
            listeners: Vec::new(),
            channels: Vec::new(),
            next_subscription: 0,
        }
    }

    // Reads

    pub fn layers(&self) -> &ActiveLayers {
        &self.layers
    }

    pub fn wms_layers(&self) -> &[ActiveWmsLayer] {
        &self.layers.wms
    }

    pub fn geojson_layers(&self) -> &[ActiveGeoJsonLayer] {
        &self.layers.geojson
    }

    pub fn user_wms_layers(&self) -> &[UserWmsLayer] {
        &self.user_wms_layers
    }

    pub fn is_wms_active(&self, id: &str) -> bool {
        self.layers.wms_layer(id).is_some()
    }

    /// Owned copy of both active lists
    pub fn snapshot(&self) -> ActiveLayers {
        self.layers.clone()
    }

    // Observation

    /// Registers a listener invoked after every change with the new state.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreChange, &ActiveLayers) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Message-passing alternative to [`subscribe`](Self::subscribe).
    ///
    /// Changes are sent before the mutating call returns. Dropping the
    /// receiver ends the subscription.
    pub fn subscribe_channel(&mut self) -> Receiver<StoreChange> {
        let (sender, receiver) = unbounded();
        self.channels.push(sender);
        receiver
    }

    fn notify(&mut self, change: StoreChange) {
        #[cfg(feature = "debug")]
        log::trace!("active layer store change: {:?}", change);

        for (_, listener) in self.listeners.iter_mut() {
            listener(&change, &self.layers);
        }
        self.channels
            .retain(|sender| sender.send(change.clone()).is_ok());
    }

    // WMS overlays

    /// Appends the layer unless its id is already active. Returns whether it was added.
    pub fn add_active_wms_layer(&mut self, layer: ActiveWmsLayer) -> bool {
        if self.is_wms_active(&layer.id) {
            return false;
        }
        let id = layer.id.clone();
        self.layers.wms.push(layer);
        self.notify(StoreChange::WmsAdded(id));
        true
    }

    pub fn remove_active_wms_layer(&mut self, id: &str) -> bool {
        let before = self.layers.wms.len();
        self.layers.wms.retain(|layer| layer.id != id);
        if self.layers.wms.len() == before {
            return false;
        }
        self.notify(StoreChange::WmsRemoved(id.to_string()));
        true
    }

    pub fn remove_all_active_wms_layers(&mut self) {
        if self.layers.wms.is_empty() {
            return;
        }
        self.layers.wms.clear();
        self.notify(StoreChange::WmsCleared);
    }

    /// Clears the WMS list, then adds each layer in order.
    pub fn replace_active_wms_layers(&mut self, layers: Vec<ActiveWmsLayer>) {
        self.remove_all_active_wms_layers();
        for layer in layers {
            self.add_active_wms_layer(layer);
        }
    }

    /// Range is not checked here; sliders keep it in `[0, 1]`.
    pub fn update_opacity(&mut self, id: &str, opacity: f64) -> bool {
        let Some(layer) = self.layers.wms.iter_mut().find(|layer| layer.id == id) else {
            return false;
        };
        if layer.opacity == opacity {
            return false;
        }
        layer.opacity = opacity;
        self.notify(StoreChange::WmsOpacityChanged(id.to_string()));
        true
    }

    pub fn next_z_index(&self) -> i32 {
        ordering::next_z_index(&self.layers.wms)
    }

    pub fn move_layer_to_front(&mut self, id: &str) -> bool {
        self.reorder(id, ordering::move_to_front)
    }

    pub fn move_layer_to_back(&mut self, id: &str) -> bool {
        self.reorder(id, ordering::move_to_back)
    }

    pub fn move_layer_up(&mut self, id: &str) -> bool {
        self.reorder(id, ordering::move_up)
    }

    pub fn move_layer_down(&mut self, id: &str) -> bool {
        self.reorder(id, ordering::move_down)
    }

    fn reorder(&mut self, id: &str, op: fn(&mut [ActiveWmsLayer], &str) -> bool) -> bool {
        if !op(&mut self.layers.wms, id) {
            return false;
        }
        self.notify(StoreChange::WmsReordered(id.to_string()));
        true
    }

    // GeoJSON overlays

    pub fn add_active_geojson_layer(&mut self, layer: ActiveGeoJsonLayer) -> bool {
        if self.layers.geojson_layer(&layer.id).is_some() {
            return false;
        }
        let id = layer.id.clone();
        self.layers.geojson.push(layer);
        self.notify(StoreChange::GeoJsonAdded(id));
        true
    }

    pub fn remove_active_geojson_layer(&mut self, id: &str) -> bool {
        let before = self.layers.geojson.len();
        self.layers.geojson.retain(|layer| layer.id != id);
        if self.layers.geojson.len() == before {
            return false;
        }
        self.notify(StoreChange::GeoJsonRemoved(id.to_string()));
        true
    }

    pub fn remove_all_active_geojson_layers(&mut self) {
        if self.layers.geojson.is_empty() {
            return;
        }
        self.layers.geojson.clear();
        self.notify(StoreChange::GeoJsonCleared);
    }

    /// Removes every GeoJSON overlay whose id starts with `prefix`, one at a time.
    pub fn remove_geojson_layers_with_prefix(&mut self, prefix: &str) -> usize {
        let ids: Vec<String> = self
            .layers
            .geojson
            .iter()
            .filter(|layer| layer.id.starts_with(prefix))
            .map(|layer| layer.id.clone())
            .collect();
        for id in &ids {
            self.remove_active_geojson_layer(id);
        }
        ids.len()
    }

    // User-registered WMS layers

    pub fn add_user_wms_layer(&mut self, layer: UserWmsLayer) -> bool {
        if self.user_wms_layers.iter().any(|l| l.id == layer.id) {
            return false;
        }
        let id = layer.id.clone();
        self.user_wms_layers.push(layer);
        self.notify(StoreChange::UserWmsAdded(id));
        true
    }

    pub fn remove_user_wms_layer(&mut self, id: &str) -> bool {
        let before = self.user_wms_layers.len();
        self.user_wms_layers.retain(|layer| layer.id != id);
        if self.user_wms_layers.len() == before {
            return false;
        }
        self.notify(StoreChange::UserWmsRemoved(id.to_string()));
        true
    }
}

impl Default for ActiveLayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActiveLayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveLayerStore")
            .field("layers", &self.layers)
            .field("user_wms_layers", &self.user_wms_layers)
            .field("listeners", &self.listeners.len())
            .field("channels", &self.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn wms(id: &str, z_index: i32) -> ActiveWmsLayer {
        ActiveWmsLayer::new(id, id.to_uppercase(), id, "u").with_z_index(z_index)
    }

    fn geojson(id: &str) -> ActiveGeoJsonLayer {
        let empty = json!({"type": "FeatureCollection", "features": []});
        ActiveGeoJsonLayer::new(id, "layer", id, empty)
    }

    fn recorded(store: &mut ActiveLayerStore) -> Rc<RefCell<Vec<StoreChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store.subscribe(move |change, _| sink.borrow_mut().push(change.clone()));
        log
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = ActiveLayerStore::new();
        assert!(store.add_active_wms_layer(wms("a", 1)));
        assert!(!store.add_active_wms_layer(wms("a", 7)));
        assert_eq!(store.wms_layers().len(), 1);
        assert_eq!(store.wms_layers()[0].z_index, 1);
    }

    #[test]
    fn test_ids_stay_unique_under_mixed_operations() {
        let mut store = ActiveLayerStore::new();
        let ops = ["a", "b", "a", "c", "-b", "b", "b", "-a", "a", "-z"];
        for op in ops {
            match op.strip_prefix('-') {
                Some(id) => {
                    store.remove_active_wms_layer(id);
                }
                None => {
                    store.add_active_wms_layer(wms(op, 1));
                }
            }
            let mut ids: Vec<&str> = store.wms_layers().iter().map(|l| l.id.as_str()).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), total);
        }
        let ids: Vec<&str> = store.wms_layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_notifications_are_synchronous_and_skip_noops() {
        let mut store = ActiveLayerStore::new();
        let log = recorded(&mut store);

        store.add_active_wms_layer(wms("a", 1));
        assert_eq!(log.borrow().len(), 1);

        store.add_active_wms_layer(wms("a", 1));
        store.remove_active_wms_layer("missing");
        store.update_opacity("missing", 0.5);
        store.move_layer_up("a");
        assert_eq!(log.borrow().len(), 1);

        store.update_opacity("a", 0.4);
        store.remove_all_active_wms_layers();
        assert_eq!(
            *log.borrow(),
            vec![
                StoreChange::WmsAdded("a".to_string()),
                StoreChange::WmsOpacityChanged("a".to_string()),
                StoreChange::WmsCleared,
            ]
        );
    }

    #[test]
    fn test_listener_sees_post_mutation_state() {
        let mut store = ActiveLayerStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |_, layers| sink.borrow_mut().push(layers.wms.len()));

        store.add_active_wms_layer(wms("a", 1));
        store.add_active_wms_layer(wms("b", 2));
        store.remove_active_wms_layer("a");
        assert_eq!(*seen.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = ActiveLayerStore::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = store.subscribe(move |_, _| *sink.borrow_mut() += 1);

        store.add_active_wms_layer(wms("a", 1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_active_wms_layer(wms("b", 2));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_channel_subscriber_receives_before_return() {
        let mut store = ActiveLayerStore::new();
        let receiver = store.subscribe_channel();

        store.add_active_geojson_layer(geojson("g1"));
        assert_eq!(
            receiver.try_recv().ok(),
            Some(StoreChange::GeoJsonAdded("g1".to_string()))
        );

        drop(receiver);
        store.remove_active_geojson_layer("g1");
        assert_eq!(store.channels.len(), 0);
    }

    #[test]
    fn test_opacity_update() {
        let mut store = ActiveLayerStore::new();
        store.add_active_wms_layer(wms("a", 1));
        assert!(store.update_opacity("a", 0.25));
        assert_eq!(store.wms_layers()[0].opacity, 0.25);
        // not range checked
        assert!(store.update_opacity("a", 3.0));
        assert_eq!(store.wms_layers()[0].opacity, 3.0);
    }

    #[test]
    fn test_store_move_to_back_scenario() {
        let mut store = ActiveLayerStore::new();
        store.add_active_wms_layer(wms("a", 1));
        let z = store.next_z_index();
        assert_eq!(z, 2);
        store.add_active_wms_layer(wms("b", z));

        assert!(store.move_layer_to_back("b"));
        assert_eq!(store.layers().wms_layer("b").unwrap().z_index, 0);
        assert_eq!(store.layers().wms_layer("a").unwrap().z_index, 1);
    }

    #[test]
    fn test_geojson_prefix_removal() {
        let mut store = ActiveLayerStore::new();
        store.add_active_geojson_layer(geojson("filtered_roads_1"));
        store.add_active_geojson_layer(geojson("filtered_roads_2"));
        store.add_active_geojson_layer(geojson("filtered_rivers_1"));
        store.add_active_geojson_layer(geojson("roads"));

        assert_eq!(store.remove_geojson_layers_with_prefix("filtered_roads"), 2);
        let ids: Vec<&str> = store.geojson_layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["filtered_rivers_1", "roads"]);
    }

    #[test]
    fn test_geojson_list_is_independent() {
        let mut store = ActiveLayerStore::new();
        store.add_active_wms_layer(wms("a", 1));
        store.add_active_geojson_layer(geojson("a"));
        store.remove_all_active_geojson_layers();
        assert_eq!(store.wms_layers().len(), 1);
        assert!(store.geojson_layers().is_empty());
    }

    #[test]
    fn test_replace_clears_first() {
        let mut store = ActiveLayerStore::new();
        let log = recorded(&mut store);
        store.add_active_wms_layer(wms("old", 1));
        store.replace_active_wms_layers(vec![wms("x", 1), wms("y", 2), wms("x", 3)]);

        let ids: Vec<&str> = store.wms_layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(log.borrow()[1], StoreChange::WmsCleared);
    }

    #[test]
    fn test_user_wms_layers() {
        let mut store = ActiveLayerStore::new();
        let layer = UserWmsLayer {
            id: "ws:a".to_string(),
            name: "ws:a".to_string(),
            title: "A".to_string(),
            url: "u".to_string(),
        };
        assert!(store.add_user_wms_layer(layer.clone()));
        assert!(!store.add_user_wms_layer(layer));
        assert_eq!(store.user_wms_layers().len(), 1);
        assert!(store.remove_user_wms_layer("ws:a"));
        assert!(!StoreChange::UserWmsAdded("x".to_string()).touches_active_layers());
    }
}
