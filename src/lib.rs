//! sicbo-bot — rolling next-outcome prediction for a Tai/Xiu dice feed
//!
//! The crate polls a game's result history, classifies each round into
//! Big / Small / Triple, and re-runs a heuristic voting ensemble every time a
//! new round lands:
//!
//! - `engine` — the prediction core: streak analysis, five heuristic models,
//!   a rule cascade, per-model accuracy tracking, and the weighted combiner
//! - `service` — the per-round cycle and the cached last prediction
//! - `client` — result-feed HTTP client
//! - `server` — axum routes shaping the public payload
//!
//! The engine is deliberately a scorer, not a statistical model; it makes no
//! claim of predictive power beyond the heuristics it encodes.

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod service;
pub mod types;

pub use error::{BotError, Result};
