//! Application state for the classification service.

use std::sync::Arc;

use geoserver_client::{GeoServerClient, GeoServerConfig, GeoServerResult, LayerSource};

/// Shared application state.
pub struct AppState {
    /// Where vector layers come from.
    pub layers: Arc<dyn LayerSource>,

    /// Answer every error with HTTP 200 (the body still carries `error`).
    pub legacy_error_status: bool,
}

impl AppState {
    pub fn new(layers: Arc<dyn LayerSource>) -> Self {
        Self {
            layers,
            legacy_error_status: false,
        }
    }

    /// State backed by a real GeoServer.
    pub fn from_config(config: GeoServerConfig) -> GeoServerResult<Self> {
        let client = GeoServerClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn with_legacy_error_status(mut self, enabled: bool) -> Self {
        self.legacy_error_status = enabled;
        self
    }
}
