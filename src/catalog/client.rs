use crate::catalog::models::{
    ApiResponse, BaseLayer, InitialSettings, InternalLayer, LayerInformationTable, WmsFeature,
    WmsFeatureRequest, WmsInformation,
};
use crate::catalog::CatalogClient;
use crate::core::config::ViewerConfig;
use crate::share::codec::encode_component;
use crate::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// [`CatalogClient`] over the backend REST API
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpCatalogClient {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("geoviewer/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base: api_base(&config.api_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.endpoint(path)?;
        let result: Result<T> = async {
            let response = self.http.get(url).query(query).send().await?;
            let envelope: ApiResponse<T> = response.json().await?;
            envelope.into_result()
        }
        .await;
        log_failure(path, &result);
        result
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = self.endpoint(path)?;
        let result: Result<T> = async {
            let response = self.http.post(url).json(body).send().await?;
            let envelope: ApiResponse<T> = response.json().await?;
            envelope.into_result()
        }
        .await;
        log_failure(path, &result);
        result
    }
}

#[cfg(feature = "debug")]
fn log_failure<T>(path: &str, result: &Result<T>) {
    if let Err(e) = result {
        log::warn!("Catalog request {} failed: {}", path, e);
    }
}

#[cfg(not(feature = "debug"))]
fn log_failure<T>(_path: &str, _result: &Result<T>) {}

/// Parses the API root so that relative endpoints resolve beneath it
fn api_base(api_url: &str) -> Result<Url> {
    let mut base = Url::parse(api_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn layer_path(layer_id: &str, tail: &str) -> String {
    format!("layers/{}/{}", encode_component(layer_id), tail)
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn initial_settings(&self) -> Result<InitialSettings> {
        self.get("initial-settings/", &[]).await
    }

    async fn base_layers(&self) -> Result<Vec<BaseLayer>> {
        self.get("base-layers/", &[]).await
    }

    async fn wms_information(&self, url: &str) -> Result<WmsInformation> {
        self.get("wms-layers/", &[("url", url.to_string())]).await
    }

    async fn wms_feature_information(
        &self,
        request: &WmsFeatureRequest,
    ) -> Result<Vec<WmsFeature>> {
        self.get("wms-layers/features/", &request.query_pairs()).await
    }

    async fn layers_by_category(
        &self,
        category_id: &str,
        include_wms_layers: bool,
    ) -> Result<Vec<InternalLayer>> {
        self.get(
            "layers/",
            &[
                ("categoryId", category_id.to_string()),
                ("includeWmsLayers", include_wms_layers.to_string()),
            ],
        )
        .await
    }

    async fn layer_by_id(&self, layer_id: &str) -> Result<InternalLayer> {
        self.get(&layer_path(layer_id, ""), &[]).await
    }

    async fn layer_information_table(&self, layer_id: &str) -> Result<LayerInformationTable> {
        self.get(&layer_path(layer_id, "tables/"), &[]).await
    }

    async fn filtered_layer(&self, layer_id: &str, filters: &Value) -> Result<Value> {
        self.post(&layer_path(layer_id, "filter/"), filters).await
    }

    async fn geojson_layer(&self, layer_id: &str, row_id: &str) -> Result<Value> {
        let tail = format!("geojson/{}", encode_component(row_id));
        self.get(&layer_path(layer_id, &tail), &[]).await
    }

    async fn summary(&self, layer_id: &str) -> Result<Value> {
        self.get(&layer_path(layer_id, "summary/"), &[]).await
    }

    async fn graphs(&self, layer_id: &str) -> Result<Value> {
        self.get(&layer_path(layer_id, "graphs/"), &[]).await
    }

    async fn tendencies(&self, layer_id: &str) -> Result<Value> {
        self.get(&layer_path(layer_id, "tendencies/"), &[]).await
    }
}
