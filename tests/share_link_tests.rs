use geoviewer::prelude::*;
use geoviewer::share::codec;

/// Shared links from generation to restoration
#[cfg(test)]
mod share_link_tests {
    use super::*;

    fn layers() -> Vec<ActiveWmsLayer> {
        vec![
            ActiveWmsLayer::new(
                "10",
                "peru:districts",
                "Distritos, 2023",
                "https://geo.example.org/geoserver/wms",
            )
            .with_opacity(0.7)
            .with_z_index(2),
            ActiveWmsLayer::new(
                "ext:rivers",
                "ext:rivers",
                "Ríos & lagos",
                "https://ext.example.org/wms?map=/srv/a.map",
            )
            .with_z_index(5),
        ]
    }

    /// Query strings decode back into the same viewport and layers, in order
    #[test]
    fn test_round_trip_preserves_order() {
        for count in 0..=2 {
            let viewport = Viewport::from_coords(-12.0464, -77.0428, 13);
            let expected: Vec<ActiveWmsLayer> = layers().into_iter().take(count).collect();
            let decoded = decode_query(&encode_query(&viewport, &expected));
            assert_eq!(decoded.viewport, Some(viewport));
            assert_eq!(decoded.layers, expected);
        }
    }

    /// One good and one broken entry yield just the good one
    #[test]
    fn test_malformed_entry_resilience() {
        let good = codec::encode_layer(&layers()[0]);
        let broken = codec::encode_component("{\"id\": \"x\", \"name\": ");
        let decoded = decode_query(&format!("lat=0&lng=0&zoom=3&layers={},{}", broken, good));
        assert_eq!(decoded.layers, vec![layers()[0].clone()]);
        assert_eq!(decoded.dropped, 1);
    }

    /// Restoring a link replaces whatever was active and mounts it
    #[test]
    fn test_link_hydrates_store_and_surface() {
        let viewport = Viewport::from_coords(-9.5, -75.25, 7);
        let link = share_link("https://maps.example.org/viewer", &viewport, &layers()).unwrap();
        let decoded = DecodedView::from_url(&link).unwrap();
        assert_eq!(decoded.viewport, Some(Viewport::from_coords(-9.5, -75.25, 7)));

        let mut store = ActiveLayerStore::new();
        store.add_active_wms_layer(ActiveWmsLayer::new("stale", "stale", "Stale", "u"));
        let reconciler =
            MapSurfaceReconciler::new(RecordingSurface::new(), &ViewerConfig::default());
        let (shared, _) = attach(reconciler, &mut store);

        assert!(hydrate(&mut store, &decoded));
        assert_eq!(store.wms_layers(), layers().as_slice());

        let reconciler = shared.borrow();
        assert!(!reconciler.is_wms_mounted("stale"));
        assert!(reconciler.is_wms_mounted("peru:districts"));
        assert!(reconciler.is_wms_mounted("ext:rivers"));
    }

    /// A link without a usable viewport falls back to the configured default
    #[test]
    fn test_fallback_viewport() {
        let config = ViewerConfig::default();
        let decoded =
            DecodedView::from_url("https://maps.example.org/?lat=12&lng=200&zoom=4").unwrap();
        assert_eq!(resolve_viewport(&decoded, config.default_viewport), config.default_viewport);

        let decoded = DecodedView::from_url("https://maps.example.org/").unwrap();
        assert!(decoded.layers.is_empty());
        assert!(decoded.viewport.is_none());
    }

    /// Generated links round coordinates and embed cleanly
    #[test]
    fn test_share_link_and_embed() {
        let base_url = ViewerConfig::default().share_base_url;
        let link = share_link(&base_url, &Viewport::from_coords(1.0, 2.0, 5), &[]).unwrap();
        assert_eq!(link, "http://localhost:4200/?lat=1.000000&lng=2.000000&zoom=5");
        assert!(embed_code(&link).contains(&format!("src=\"{}\"", link)));
    }
}
