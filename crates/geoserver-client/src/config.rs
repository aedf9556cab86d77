//! GeoServer connection configuration.

use std::time::Duration;

use clap::Args;
use reqwest::Url;

use crate::error::{GeoServerError, GeoServerResult};

/// Default timeout for outbound GeoServer calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where GeoServer lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct GeoServerConfig {
    /// Base URL, e.g. `http://localhost:8080/geoserver`.
    pub base_url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl GeoServerConfig {
    pub fn new(base_url: &str) -> GeoServerResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GeoServerError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GeoServerError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            username: None,
            password: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Command-line / environment arguments for GeoServer access.
///
/// Variable names match the `.env` files used by existing deployments.
#[derive(Args, Debug, Clone)]
pub struct GeoServerArgs {
    /// GeoServer base URL
    #[arg(long, env = "GEOSERVER_URL")]
    pub geoserver_url: String,

    /// GeoServer REST user
    #[arg(long, env = "GEOSERVER_NAME")]
    pub geoserver_user: Option<String>,

    /// GeoServer REST password
    #[arg(long, env = "GEOSERVER_PASSWORD", hide_env_values = true)]
    pub geoserver_password: Option<String>,

    /// Timeout for GeoServer requests, in seconds
    #[arg(long, env = "GEOSERVER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub geoserver_timeout_secs: u64,
}

impl GeoServerArgs {
    pub fn to_config(&self) -> GeoServerResult<GeoServerConfig> {
        let mut config = GeoServerConfig::new(&self.geoserver_url)?
            .with_timeout(Duration::from_secs(self.geoserver_timeout_secs));
        if let Some(user) = &self.geoserver_user {
            config = config.with_credentials(
                user.clone(),
                self.geoserver_password.clone().unwrap_or_default(),
            );
        }
        Ok(config)
    }
}
