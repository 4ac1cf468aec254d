//! Prediction engine
//!
//! Pure, synchronous core: the streak analyzer feeds five heuristic models,
//! a rule cascade votes independently, the performance tracker weights every
//! model by its recent accuracy, and the ensemble collapses the votes into a
//! single call with a bounded confidence.

pub mod ensemble;
pub mod models;
pub mod patterns;
pub mod performance;
pub mod rules;
pub mod streak;

pub use ensemble::{Ensemble, Prediction, VoteRecord};
pub use models::{BridgeVote, ModelId};
pub use patterns::{dominant_ngram, DominantPattern};
pub use performance::{PerformanceTracker, DEFAULT_LOOKBACK};
pub use rules::{RulePredictor, RuleVote};
pub use streak::{detect, StreakInfo};
