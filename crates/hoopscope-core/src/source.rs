// Where season documents come from.
//
// `StatsSource` is the fetch seam: the loader only needs "the HTML for season
// N". `HttpStatsSource` is the real implementation; tests swap in fakes.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::season::SeasonKey;

/// Placeholder substituted with the season year in the path template.
pub const SEASON_PLACEHOLDER: &str = "{season}";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Anything that can produce the raw HTML document for a season.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_season(&self, season: SeasonKey) -> Result<String, FetchError>;
}

// ---------------------------------------------------------------------------
// HttpStatsSource
// ---------------------------------------------------------------------------

/// Fetches `<base_url><path_template>` with the season substituted in.
pub struct HttpStatsSource {
    http: reqwest::Client,
    base_url: String,
    path_template: String,
}

impl HttpStatsSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            path_template: config.path_template.clone(),
        })
    }

    /// The address for one season.
    pub fn season_url(&self, season: SeasonKey) -> String {
        season_url(&self.base_url, &self.path_template, season)
    }
}

pub fn season_url(base_url: &str, path_template: &str, season: SeasonKey) -> String {
    let path = path_template.replace(SEASON_PLACEHOLDER, &season.to_string());
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn fetch_season(&self, season: SeasonKey) -> Result<String, FetchError> {
        let url = self.season_url(season);
        info!(%url, "fetching season table");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        debug!(%url, bytes = body.len(), "fetched season document");
        Ok(body)
    }
}
