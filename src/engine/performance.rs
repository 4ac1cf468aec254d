//! Rolling model accuracy tracking
//!
//! Every cycle each model's call is recorded against the round id it was
//! issued on. Scoring a model walks the recent rounds and compares the call
//! stored one round earlier (the prediction made while this round was still
//! open) against the category the round actually resolved to. The resulting
//! multiplier scales the model's ensemble weight.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use crate::engine::models::ModelId;
use crate::types::{Call, Round};

/// Default number of rounds inspected per score
pub const DEFAULT_LOOKBACK: usize = 10;

/// Append-only ledger of every call each model has issued
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    ledger: HashMap<ModelId, HashMap<String, Option<Call>>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the call a model issued while `game_num` was the latest round.
    /// Entries are never rewritten; the first call for a round stands.
    pub fn record(&mut self, model: ModelId, game_num: &str, call: Option<Call>) {
        self.ledger
            .entry(model)
            .or_default()
            .entry(game_num.to_string())
            .or_insert(call);
    }

    /// Calls recorded for a model over the process lifetime
    pub fn recorded(&self, model: ModelId) -> usize {
        self.ledger.get(&model).map_or(0, |m| m.len())
    }

    /// Accuracy multiplier in [0.5, 1.5] over the last `lookback` rounds.
    ///
    /// A model with no ledger entries at all (or a history too short to
    /// score) sits at the neutral 1.0. Otherwise each of the most recent
    /// `min(lookback, len - 1)` rounds contributes a hit when the call stored
    /// under the next-older round id matches the round's resolved category;
    /// missing and abstaining entries never match.
    pub fn score(&self, history: &[Round], model: ModelId, lookback: usize) -> Decimal {
        let entries = match self.ledger.get(&model) {
            Some(entries) if !entries.is_empty() => entries,
            _ => return Decimal::ONE,
        };
        if history.len() < 2 || lookback == 0 {
            return Decimal::ONE;
        }

        let lookback = lookback.min(history.len() - 1);
        let mut matches = 0usize;
        for i in 0..lookback {
            let stored = entries
                .get(&history[i + 1].game_num)
                .copied()
                .flatten();
            let actual = history[i].category();
            if let (Some(call), Some(category)) = (stored, actual) {
                if call.matches(category) {
                    matches += 1;
                }
            }
        }

        let half = Decimal::from(lookback as i64) / dec!(2);
        let multiplier = Decimal::ONE + (Decimal::from(matches as i64) - half) / half;
        multiplier.clamp(dec!(0.5), dec!(1.5))
    }
}
