use geoviewer::{
    catalog::{client::HttpCatalogClient, feature_query_groups, CatalogClient},
    share::{embed_code, hydrate, resolve_viewport, share_link, DecodedView},
    surface::{reconciler::attach, recording::RecordingSurface},
    ActiveLayerStore, MapSurfaceReconciler, ViewerConfig,
};

const USAGE: &str = "usage: geoviewer-app [--config <file>] [--fetch-settings] [<share-url>]";

/// Command line options
#[derive(Debug, Default)]
struct Options {
    config: Option<String>,
    fetch_settings: bool,
    share_url: Option<String>,
}

impl Options {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self, String> {
        let mut options = Options::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    options.config = Some(args.next().ok_or("--config needs a path")?);
                }
                "--fetch-settings" => options.fetch_settings = true,
                "-h" | "--help" => return Err(USAGE.to_string()),
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown flag {}\n{}", flag, USAGE))
                }
                _ => options.share_url = Some(arg),
            }
        }
        Ok(options)
    }
}

/// Restores a shared view headlessly
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = Options::parse(std::env::args().skip(1))?;
    let config = match &options.config {
        Some(path) => ViewerConfig::from_file(path)?,
        None => ViewerConfig::default(),
    }
    .with_env_overrides()?;

    let mut fallback = config.default_viewport;
    let mut base_layer = None;
    if options.fetch_settings {
        let client = HttpCatalogClient::new(&config)?;
        match client.initial_settings().await {
            Ok(settings) => {
                if let Some(viewport) = settings.viewport() {
                    fallback = viewport;
                }
                base_layer = settings.default_base_layer().cloned();
            }
            Err(e) => eprintln!("Could not load initial settings: {}", e),
        }
    }

    let decoded = match &options.share_url {
        Some(url) => DecodedView::from_url(url)?,
        None => DecodedView::default(),
    };
    let viewport = resolve_viewport(&decoded, fallback);

    let mut store = ActiveLayerStore::new();
    let reconciler = MapSurfaceReconciler::new(RecordingSurface::new(), &config);
    let (reconciler, _subscription) = attach(reconciler, &mut store);
    if let Some(base_layer) = &base_layer {
        reconciler.borrow_mut().set_base_layer(base_layer);
    }
    hydrate(&mut store, &decoded);

    println!(
        "View: {:.6}, {:.6} at zoom {}",
        viewport.center.lat, viewport.center.lng, viewport.zoom
    );
    if decoded.dropped > 0 {
        println!("Ignored {} unreadable layer entries", decoded.dropped);
    }

    println!("Surface commands:");
    for op in reconciler.borrow().surface().ops() {
        println!("  {}", op);
    }

    for (url, layers) in feature_query_groups(store.wms_layers()) {
        println!("Feature query: {} -> {}", url, layers);
    }

    let link = share_link(&config.share_base_url, &viewport, store.wms_layers())?;
    println!("Share link: {}", link);
    println!("Embed: {}", embed_code(&link));

    Ok(())
}
