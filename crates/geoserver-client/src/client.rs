//! HTTP client for GeoServer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, info, instrument};

use crate::config::GeoServerConfig;
use crate::error::{GeoServerError, GeoServerResult};
use crate::features::FeatureCollection;
use crate::urls;

/// Longest error body kept in `UnexpectedStatus`.
const MAX_ERROR_BODY: usize = 512;

/// Anything that can produce a vector layer as a feature collection.
#[async_trait]
pub trait LayerSource: Send + Sync {
    /// Fetch every feature of `workspace:layer`.
    async fn fetch_layer(&self, workspace: &str, layer: &str) -> GeoServerResult<FeatureCollection>;
}

/// GeoServer client sharing one connection pool across requests.
#[derive(Debug, Clone)]
pub struct GeoServerClient {
    pub(crate) http: Client,
    pub(crate) config: GeoServerConfig,
}

impl GeoServerClient {
    pub fn new(config: GeoServerConfig) -> GeoServerResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self { http, config })
    }

    /// WFS GetFeature URL for a vector layer.
    pub fn vector_layer_url(&self, workspace: &str, layer: &str) -> GeoServerResult<reqwest::Url> {
        urls::vector_layer_url(&self.config.base_url, workspace, layer)
    }

    /// GDAL WCS connection string for a raster layer.
    pub fn wcs_coverage_url(&self, workspace: &str, layer: &str) -> GeoServerResult<String> {
        urls::wcs_coverage_url(&self.config.base_url, workspace, layer)
    }

    /// Attach basic auth when credentials are configured.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        }
    }
}

#[async_trait]
impl LayerSource for GeoServerClient {
    #[instrument(skip(self), fields(base = %self.config.base_url))]
    async fn fetch_layer(
        &self,
        workspace: &str,
        layer: &str,
    ) -> GeoServerResult<FeatureCollection> {
        let url = self.vector_layer_url(workspace, layer)?;
        debug!(url = %url, "Requesting WFS GetFeature");

        let response = self.authorize(self.http.get(url)).send().await?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await?;

        let collection = decode_feature_collection(&body)?;
        info!(features = collection.len(), "Fetched vector layer");
        Ok(collection)
    }
}

/// Decode a WFS GeoJSON payload.
pub fn decode_feature_collection(body: &[u8]) -> GeoServerResult<FeatureCollection> {
    let collection: FeatureCollection =
        serde_json::from_slice(body).map_err(|e| GeoServerError::Decode(e.to_string()))?;
    if collection.type_ != "FeatureCollection" {
        return Err(GeoServerError::Decode(format!(
            "expected a FeatureCollection, got '{}'",
            collection.type_
        )));
    }
    Ok(collection)
}

/// Turn a non-2xx response into `UnexpectedStatus`.
pub(crate) async fn ensure_success(response: Response) -> GeoServerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(GeoServerError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_non_collection() {
        let err = decode_feature_collection(br#"{"type": "Feature", "features": []}"#).unwrap_err();
        assert!(err.to_string().contains("expected a FeatureCollection"));
    }

    #[test]
    fn test_decode_rejects_xml_exception() {
        let body = br#"<?xml version="1.0"?><ServiceExceptionReport/>"#;
        assert!(matches!(
            decode_feature_collection(body),
            Err(GeoServerError::Decode(_))
        ));
    }

    #[test]
    fn test_vector_layer_url_uses_config_base() {
        let config = GeoServerConfig::new("http://gs.local/geoserver").unwrap();
        let client = GeoServerClient::new(config).unwrap();
        let url = client.vector_layer_url("topp", "states").unwrap();
        assert!(url.as_str().starts_with("http://gs.local/geoserver/topp/ows?service=WFS"));
    }
}
