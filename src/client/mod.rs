//! Result-feed client
//!
//! Thin HTTP client for the game's history endpoint. One GET returns the most
//! recent rounds (newest first, capped by the configured page size); the poll
//! loop calls `fetch_latest` on every tick and treats any failure as "keep
//! the previous snapshot".

use serde::Deserialize;

use crate::config::FeedConfig;
use crate::error::Result;
use crate::types::Round;

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    data: Option<HistoryPayload>,
}

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    #[serde(rename = "resultList", default)]
    result_list: Vec<Round>,
}

/// Client for the outcome history feed
#[derive(Debug, Clone)]
pub struct HistoryClient {
    http: reqwest::Client,
    url: String,
    page_size: usize,
}

impl HistoryClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            url: config.url(),
            page_size: config.page_size,
        })
    }

    /// Fetch the latest rounds, newest first. An envelope without a result
    /// list yields an empty snapshot rather than an error.
    pub async fn fetch_latest(&self) -> Result<Vec<Round>> {
        let envelope: HistoryEnvelope = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut rounds = envelope
            .data
            .map(|payload| payload.result_list)
            .unwrap_or_default();
        rounds.truncate(self.page_size);
        Ok(rounds)
    }
}
