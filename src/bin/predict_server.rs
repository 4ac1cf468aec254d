//! Prediction daemon: polls the result feed and serves the shaped payload.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{info, warn};

use sicbo_bot::client::HistoryClient;
use sicbo_bot::config::BotConfig;
use sicbo_bot::server::{self, AppState};
use sicbo_bot::service::PredictionService;
use sicbo_bot::types::Round;

#[derive(Parser, Debug)]
#[command(name = "predict_server", about = "Tai/Xiu rolling prediction server")]
struct Args {
    /// Port to serve on (overrides SICBO_PORT)
    #[arg(long)]
    port: Option<u16>,
    /// History endpoint base URL (overrides SICBO_FEED_URL)
    #[arg(long)]
    feed_url: Option<String>,
    /// Seconds between feed refreshes
    #[arg(long)]
    poll_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = BotConfig::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.feed_url {
        config.feed.base_url = url;
    }
    if let Some(secs) = args.poll_secs {
        config.feed.poll_interval_secs = secs;
    }

    let client = HistoryClient::new(&config.feed)?;
    let service = Arc::new(PredictionService::new(config.feed.min_history));
    let history = Arc::new(RwLock::new(Vec::<Round>::new()));

    // Poll loop: the only writer of the snapshot and the only caller of
    // on_snapshot, so cycles stay serialized regardless of request load.
    {
        let service = service.clone();
        let history = history.clone();
        let poll_interval = config.feed.poll_interval();
        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                match client.fetch_latest().await {
                    Ok(rounds) if !rounds.is_empty() => {
                        *history.write().await = rounds.clone();
                        service.on_snapshot(&rounds).await;
                    }
                    Ok(_) => {
                        warn!("feed returned an empty result list");
                    }
                    Err(e) => {
                        warn!("feed refresh failed: {}", e);
                    }
                }
            }
        });
    }

    let state = AppState { service, history };
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("prediction server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
