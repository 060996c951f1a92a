use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

/// Server-side GET of remote feeds, relayed verbatim to the browser so it
/// never has to make the cross-origin request itself.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            &config.user_agent,
            config.fetch_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Fetch `url` once and return the body text. Upstream error statuses
    /// are not treated as failures; their body is relayed like any other.
    pub async fn fetch_raw(&self, url: &str) -> Result<String, FetchError> {
        info!("Proxying feed: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Upstream {} answered with status {}", url, status);
        }

        let body = response.text().await?;
        Ok(body)
    }
}
