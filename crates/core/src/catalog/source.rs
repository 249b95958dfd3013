use std::{future::Future, time::Duration};

use thiserror::Error;
use tracing::debug;

use crate::{config::AppConfig, models::Route};

/// Errors from fetching the route collection.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The body was not a JSON array of routes.
    #[error("invalid routes payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Anything that can produce the remote route collection.
pub trait RouteSource: Send + Sync + 'static {
    /// Fetch every route. Called once per refresh, never retried.
    fn fetch_routes(&self) -> impl Future<Output = Result<Vec<Route>, FetchError>> + Send;
}

/// `GET {base_url}/routes` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRouteSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRouteSource {
    /// Build a client for `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Build a client from the application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            config.api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Full URL of the routes collection.
    pub fn routes_url(&self) -> String {
        format!("{}/routes", self.base_url.trim_end_matches('/'))
    }
}

impl RouteSource for HttpRouteSource {
    async fn fetch_routes(&self) -> Result<Vec<Route>, FetchError> {
        let url = self.routes_url();
        debug!(%url, "Requesting routes");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(FetchError::Decode)
    }
}
