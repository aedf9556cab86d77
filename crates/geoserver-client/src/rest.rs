//! GeoServer REST operations: coverage stores, raster upload, CRS and
//! shapefile datastores.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{info, instrument};

use crate::client::{ensure_success, GeoServerClient};
use crate::error::{GeoServerError, GeoServerResult};
use crate::urls::{self, validate_name};

/// Workspace used when a coverage store is created without one.
pub const DEFAULT_WORKSPACE: &str = "default";

/// How GeoServer obtains the data for a new coverage store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadMethod {
    /// Upload the file bytes in the request body.
    File,
    /// GeoServer downloads the data from a URL.
    Url,
    /// The data already sits on the GeoServer host.
    External,
    Remote,
}

impl UploadMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMethod::File => "file",
            UploadMethod::Url => "url",
            UploadMethod::External => "external",
            UploadMethod::Remote => "remote",
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for [`GeoServerClient::create_coverage_store`].
#[derive(Debug, Clone)]
pub struct CoverageStoreRequest {
    /// Local file path, or a URL / server path for non-file methods.
    pub path: String,
    pub workspace: Option<String>,
    /// Store and coverage name; defaults to the file stem of `path`.
    pub layer_name: Option<String>,
    pub file_type: String,
    pub content_type: String,
    pub method: UploadMethod,
}

impl CoverageStoreRequest {
    /// A GeoTIFF file upload.
    pub fn geotiff(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            workspace: None,
            layer_name: None,
            file_type: "GeoTIFF".to_string(),
            content_type: "image/tiff".to_string(),
            method: UploadMethod::File,
        }
    }

    /// Store name: explicit, or the file name up to its first dot.
    pub fn store_name(&self) -> String {
        if let Some(name) = &self.layer_name {
            return name.clone();
        }
        let file_name = self
            .path
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.path);
        file_name.split('.').next().unwrap_or(file_name).to_string()
    }
}

impl GeoServerClient {
    /// Create a coverage store and its coverage in one call.
    ///
    /// Returns the store name. Only `201 Created` counts as success.
    #[instrument(skip(self, request), fields(path = %request.path, method = %request.method))]
    pub async fn create_coverage_store(
        &self,
        request: &CoverageStoreRequest,
    ) -> GeoServerResult<String> {
        let workspace = request.workspace.as_deref().unwrap_or(DEFAULT_WORKSPACE);
        let store = request.store_name();
        validate_name("coverage store", &store)?;

        let file_type = request.file_type.to_lowercase();
        let resource = format!("{}.{}", request.method, file_type);
        let mut url = urls::rest_url(
            &self.config.base_url,
            workspace,
            &["coveragestores", store.as_str(), resource.as_str()],
        )?;
        url.query_pairs_mut().append_pair("coverageName", &store);

        let builder = self.http.put(url).header(ACCEPT, "application/json");
        let builder = match request.method {
            UploadMethod::File => {
                let body = tokio::fs::read(&request.path).await?;
                builder
                    .header(CONTENT_TYPE, request.content_type.as_str())
                    .body(body)
            }
            _ => builder
                .header(CONTENT_TYPE, "text/plain")
                .body(request.path.clone()),
        };

        let response = self.authorize(builder).send().await?;
        if response.status() != StatusCode::CREATED {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeoServerError::UnexpectedStatus { status, body });
        }

        info!(workspace, store = %store, "Created coverage store");
        Ok(store)
    }

    /// Upload a GeoTIFF into an existing (or new) coverage store and publish
    /// it as `layer`.
    #[instrument(skip(self, file))]
    pub async fn upload_raster(
        &self,
        workspace: &str,
        store: &str,
        layer: &str,
        file: &Path,
    ) -> GeoServerResult<u16> {
        validate_name("coverage store", store)?;
        validate_name("layer", layer)?;

        let mut url = urls::rest_url(
            &self.config.base_url,
            workspace,
            &["coveragestores", store, "file.geotiff"],
        )?;
        url.query_pairs_mut()
            .append_pair("configure", "all")
            .append_pair("coverageName", layer);

        let body = tokio::fs::read(file).await?;
        let builder = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "image/tiff")
            .body(body);
        let response = ensure_success(self.authorize(builder).send().await?).await?;

        info!(file = %file.display(), "Uploaded raster");
        Ok(response.status().as_u16())
    }

    /// Set the declared spatial reference system of a coverage.
    #[instrument(skip(self))]
    pub async fn set_crs(
        &self,
        workspace: &str,
        store: &str,
        layer: &str,
        srs: &str,
    ) -> GeoServerResult<u16> {
        validate_name("coverage store", store)?;
        validate_name("layer", layer)?;
        if srs.is_empty() || srs.contains(|c: char| matches!(c, '<' | '>' | '&')) {
            return Err(GeoServerError::InvalidName {
                kind: "srs",
                value: srs.to_string(),
            });
        }

        let resource = format!("{layer}.xml");
        let url = urls::rest_url(
            &self.config.base_url,
            workspace,
            &["coveragestores", store, "coverages", resource.as_str()],
        )?;
        let body = format!("<coverage><srs>{srs}</srs></coverage>");

        let builder = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body);
        let response = ensure_success(self.authorize(builder).send().await?).await?;
        Ok(response.status().as_u16())
    }

    /// Upload a zipped shapefile into a datastore, overwriting existing data.
    #[instrument(skip(self, zip_path))]
    pub async fn upload_shapefile(
        &self,
        workspace: &str,
        datastore: &str,
        zip_path: &Path,
    ) -> GeoServerResult<u16> {
        validate_name("datastore", datastore)?;

        let mut url = urls::rest_url(
            &self.config.base_url,
            workspace,
            &["datastores", datastore, "file.shp"],
        )?;
        url.query_pairs_mut().append_pair("update", "overwrite");

        let body = tokio::fs::read(zip_path).await?;
        let builder = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "application/zip")
            .body(body);
        let response = ensure_success(self.authorize(builder).send().await?).await?;

        info!(zip = %zip_path.display(), "Uploaded shapefile");
        Ok(response.status().as_u16())
    }
}
