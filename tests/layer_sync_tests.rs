use geoviewer::prelude::*;
use serde_json::json;

/// End-to-end checks of store mutations flowing through an attached reconciler
#[cfg(test)]
mod layer_sync_tests {
    use super::*;

    fn wms(id: &str, z_index: i32) -> ActiveWmsLayer {
        ActiveWmsLayer::new(id, id.to_uppercase(), id, "u").with_z_index(z_index)
    }

    fn attached(store: &mut ActiveLayerStore) -> SharedReconciler<RecordingSurface> {
        let reconciler =
            MapSurfaceReconciler::new(RecordingSurface::new(), &ViewerConfig::default());
        let (shared, _) = attach(reconciler, store);
        shared
    }

    fn take_ops(shared: &SharedReconciler<RecordingSurface>) -> Vec<SurfaceOp> {
        shared.borrow_mut().surface_mut().take_ops()
    }

    /// The scenario from the layer panel: show two layers, send the second to the back
    #[test]
    fn test_show_two_then_move_to_back() {
        let mut store = ActiveLayerStore::new();
        let shared = attached(&mut store);

        store.add_active_wms_layer(ActiveWmsLayer::new("a", "A", "A", "u"));
        let z_index = store.next_z_index();
        assert_eq!(z_index, 2);
        store.add_active_wms_layer(ActiveWmsLayer::new("b", "B", "B", "u").with_z_index(z_index));
        take_ops(&shared);

        assert!(store.move_layer_to_back("b"));
        assert_eq!(store.layers().wms_layer("b").map(|l| l.z_index), Some(0));
        assert_eq!(store.layers().wms_layer("a").map(|l| l.z_index), Some(1));

        let ops = take_ops(&shared);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], SurfaceOp::SetWmsZIndex { z_index: 0, .. }));

        let surface = shared.borrow();
        assert_eq!(surface.surface().wms_layer("B").map(|o| o.z_index), Some(0));
    }

    /// Every store change is reflected before the mutating call returns
    #[test]
    fn test_surface_tracks_store_synchronously() {
        let mut store = ActiveLayerStore::new();
        let shared = attached(&mut store);

        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            store.add_active_wms_layer(wms(id, i as i32 + 1));
            assert_eq!(shared.borrow().mounted_wms_count(), i + 1);
        }

        store.update_opacity("b", 0.25);
        assert_eq!(
            shared.borrow().surface().wms_layer("B").map(|o| o.opacity),
            Some(0.25)
        );

        store.move_layer_up("a");
        let a = shared.borrow().surface().wms_layer("A").map(|o| o.z_index);
        assert_eq!(a, store.layers().wms_layer("a").map(|l| l.z_index));

        store.remove_all_active_wms_layers();
        assert_eq!(shared.borrow().mounted_wms_count(), 0);
        assert_eq!(shared.borrow().surface().mounted_count(), 0);
    }

    /// Re-syncing an unchanged store issues nothing
    #[test]
    fn test_resync_is_idempotent() {
        let mut store = ActiveLayerStore::new();
        let shared = attached(&mut store);
        store.add_active_wms_layer(wms("a", 1));
        store.add_active_geojson_layer(ActiveGeoJsonLayer::new(
            "g",
            "1",
            "G",
            json!({"type": "LineString", "coordinates": [[0, 0], [2, 2]]}),
        ));
        take_ops(&shared);

        let snapshot = store.snapshot();
        shared.borrow_mut().sync(&snapshot);
        shared.borrow_mut().sync(&snapshot);
        assert!(take_ops(&shared).is_empty());
    }

    /// A bare Point mounts one marker and fits the camera once
    #[test]
    fn test_point_geojson_fits_camera_once() {
        let mut store = ActiveLayerStore::new();
        let shared = attached(&mut store);

        store.add_active_geojson_layer(ActiveGeoJsonLayer::new(
            "p",
            "1",
            "Point",
            json!({"type": "Point", "coordinates": [10, 20]}),
        ));
        {
            let reconciler = shared.borrow();
            let surface = reconciler.surface();
            assert_eq!(surface.fit_count(), 1);
            assert_eq!(surface.vector_layer("p").map(|s| s.marker_count()), Some(1));
        }

        // an empty GeoJSON layer and a WMS layer leave the camera alone
        store.add_active_geojson_layer(ActiveGeoJsonLayer::new(
            "empty",
            "2",
            "Empty",
            json!({"type": "FeatureCollection", "features": []}),
        ));
        store.add_active_wms_layer(wms("a", 1));
        assert_eq!(shared.borrow().surface().fit_count(), 1);
    }

    /// Filtered results replace each other on the surface too
    #[test]
    fn test_filtered_layer_swap_on_surface() {
        let config = ViewerConfig::default();
        let mut store = ActiveLayerStore::new();
        let shared = attached(&mut store);

        let polygon = json!({
            "type": "Feature",
            "properties": {"_id": "row-1"},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
        });
        let first = apply_filtered_layer(&mut store, "9", "Parcels", polygon.clone(), &config);
        let second = apply_filtered_layer(&mut store, "9", "Parcels", polygon, &config);
        assert!(first.is_some() && second.is_some());

        let reconciler = shared.borrow();
        assert_eq!(reconciler.mounted_geojson_count(), 1);
        let spec = second
            .as_deref()
            .and_then(|id| reconciler.surface().vector_layer(id))
            .expect("second result is mounted");
        assert_eq!(spec.style.color.as_deref(), Some("#ff6b35"));
        assert_eq!(spec.style.fill_opacity, Some(0.4));
    }

    /// Feature clicks carry the row id and the catalog layer id
    #[test]
    fn test_feature_click_opens_inspector() {
        let inspector = RecordingInspector::new();
        let mut store = ActiveLayerStore::new();
        let reconciler =
            MapSurfaceReconciler::new(RecordingSurface::new(), &ViewerConfig::default())
                .with_inspector(Rc::new(inspector.clone()));
        let (shared, _) = attach(reconciler, &mut store);

        store.add_active_geojson_layer(ActiveGeoJsonLayer::new(
            "g",
            "layer-3",
            "G",
            json!({
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": {"_id": "a1"},
                        "geometry": {"type": "Point", "coordinates": [1, 1]}
                    },
                    {
                        "type": "Feature",
                        "properties": {},
                        "geometry": {"type": "Point", "coordinates": [2, 2]}
                    }
                ]
            }),
        ));

        let reconciler = shared.borrow();
        let spec = reconciler.surface().vector_layer("g").expect("mounted");
        assert!(spec.click(0));
        assert!(spec.click(1));
        assert_eq!(
            inspector.requests(),
            vec![
                InspectRequest {
                    feature_id: Some("a1".to_string()),
                    layer_id: "layer-3".to_string()
                },
                InspectRequest {
                    feature_id: None,
                    layer_id: "layer-3".to_string()
                },
            ]
        );
    }
}
