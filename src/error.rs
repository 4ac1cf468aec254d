//! Error types for the prediction service

use thiserror::Error;

/// Top-level error type
#[derive(Error, Debug)]
pub enum BotError {
    /// Transport-level failure talking to the result feed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered but the payload was not usable
    #[error("feed error: {0}")]
    Feed(String),

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, BotError>;
