//! Service configuration
//!
//! Defaults match the live feed the service was tuned against; everything can
//! be overridden through `SICBO_*` environment variables or the binary's CLI
//! flags.

use std::env;
use std::time::Duration;

/// Result-feed polling configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL of the history endpoint
    pub base_url: String,
    /// Game identifier passed through as `gameId`
    pub game_id: String,
    /// Table identifier passed through as `tableId`
    pub table_id: String,
    /// Window size requested per fetch (`size`), also the history cap
    pub page_size: usize,
    /// Seconds between refreshes
    pub poll_interval_secs: u64,
    /// Minimum rounds required before the ensemble runs a full cycle
    pub min_history: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.xeuigogo.info/v2/history/getLastResult".to_string(),
            game_id: "ktrng_3986".to_string(),
            table_id: "39861215743193".to_string(),
            page_size: 100,
            poll_interval_secs: 5,
            min_history: 5,
        }
    }
}

impl FeedConfig {
    /// Full request URL including the query string
    pub fn url(&self) -> String {
        format!(
            "{}?gameId={}&size={}&tableId={}&curPage=1",
            self.base_url, self.game_id, self.page_size, self.table_id
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Aggregated configuration for the daemon
#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    pub feed: FeedConfig,
    pub server: ServerConfig,
}

impl BotConfig {
    /// Build from defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("SICBO_FEED_URL") {
            config.feed.base_url = url;
        }
        if let Ok(game_id) = env::var("SICBO_GAME_ID") {
            config.feed.game_id = game_id;
        }
        if let Ok(table_id) = env::var("SICBO_TABLE_ID") {
            config.feed.table_id = table_id;
        }
        if let Ok(secs) = env::var("SICBO_POLL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.feed.poll_interval_secs = secs;
            }
        }
        if let Ok(port) = env::var("SICBO_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        config
    }
}
