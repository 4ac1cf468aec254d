//! Weighted-vote combiner
//!
//! Runs the model set plus the rule predictor over a snapshot, weights each
//! call by the model's tracked accuracy, and collapses the votes into one
//! final call with a bounded confidence. Owns the prediction ledger and the
//! rule predictor's RNG; callers hold exactly one instance per stream.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::engine::models::{self, ModelId};
use crate::engine::performance::{PerformanceTracker, DEFAULT_LOOKBACK};
use crate::engine::rules::RulePredictor;
use crate::engine::streak::{self, adjacent_switches, StreakInfo};
use crate::types::{categories, Call, Round};

/// Flat ensemble weight of the rule predictor (never performance-adjusted)
const RULE_WEIGHT: Decimal = dec!(0.2);

/// Full cycles need at least this many rounds; below it every model is
/// replaced by a flip of the latest result
const FULL_CYCLE_MIN: usize = 5;

/// Confidence band the score margin is rescaled into
const MIN_CONFIDENCE: Decimal = dec!(0.61);
const MAX_CONFIDENCE: Decimal = dec!(0.97);

/// One contributing vote, kept for logging and diagnostics
#[derive(Debug, Clone)]
pub struct VoteRecord {
    pub source: &'static str,
    pub call: Option<Call>,
    pub weight: Decimal,
    pub rationale: Option<String>,
}

/// Combined prediction for the next round
#[derive(Debug, Clone)]
pub struct Prediction {
    pub call: Option<Call>,
    /// Percent in [61, 97] when a call is made, 0 otherwise
    pub confidence_percent: u32,
    pub big_score: Decimal,
    pub small_score: Decimal,
    /// Whether the bad-pattern dampener fired
    pub dampened: bool,
    pub votes: Vec<VoteRecord>,
}

impl Prediction {
    fn none() -> Self {
        Self {
            call: None,
            confidence_percent: 0,
            big_score: Decimal::ZERO,
            small_score: Decimal::ZERO,
            dampened: false,
            votes: Vec::new(),
        }
    }
}

/// Noisy or freakish tape: many switches in the recent window, or a run so
/// long the regime is suspect. Both accumulators get shaved.
fn is_bad_pattern(history: &[Round], streak: &StreakInfo) -> bool {
    if history.len() < 3 {
        return false;
    }
    let cats = categories(history);
    let window = &cats[..cats.len().min(15)];
    adjacent_switches(window) >= 9 || streak.length >= 10
}

/// Rescale the accumulator margin into the published confidence band.
fn scale_confidence(big: Decimal, small: Decimal) -> u32 {
    let sum = big + small;
    let margin = if sum > Decimal::ZERO {
        (big - small).abs() / sum
    } else {
        Decimal::ZERO
    };
    let scaled = MIN_CONFIDENCE + margin * (MAX_CONFIDENCE - MIN_CONFIDENCE);
    let bounded = scaled.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    (bounded * dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// The voting ensemble. One instance per outcome stream.
pub struct Ensemble {
    tracker: PerformanceTracker,
    rule: RulePredictor,
}

impl Ensemble {
    pub fn new() -> Self {
        Self {
            tracker: PerformanceTracker::new(),
            rule: RulePredictor::new(),
        }
    }

    /// Deterministic ensemble for tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            tracker: PerformanceTracker::new(),
            rule: RulePredictor::with_seed(seed),
        }
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    /// Run one prediction cycle over a snapshot (newest first).
    pub fn predict(&mut self, history: &[Round]) -> Prediction {
        if history.is_empty() {
            return Prediction::none();
        }

        let info = streak::detect(history);
        let current_round = history[0].game_num.clone();

        // Model votes; sparse history swaps every model for a plain flip of
        // the latest result instead of asking the models to read noise.
        let (model_calls, bridge_rationale) = if history.len() < FULL_CYCLE_MIN {
            let fallback = Call::against(history[0].category());
            (
                ModelId::ALL.map(|_| Some(fallback)),
                "[Bridge] short history, flipping the latest result".to_string(),
            )
        } else {
            let bridge = models::bridge(history, &info);
            (
                [
                    models::trend(history, &info),
                    models::short(history, &info),
                    models::mean(history, &info),
                    models::recent_switch(history, &info),
                    bridge.call,
                ],
                bridge.rationale,
            )
        };
        let rule_vote = self.rule.predict(history);

        // Score against the ledger as it stood before this round, then
        // append this round's calls for future scoring.
        let multipliers =
            ModelId::ALL.map(|m| self.tracker.score(history, m, DEFAULT_LOOKBACK));
        for (model, call) in ModelId::ALL.iter().zip(model_calls.iter()) {
            self.tracker.record(*model, &current_round, *call);
        }

        let mut big_score = Decimal::ZERO;
        let mut small_score = Decimal::ZERO;
        let mut votes = Vec::with_capacity(ModelId::ALL.len() + 1);

        for ((model, call), multiplier) in
            ModelId::ALL.iter().zip(model_calls.iter()).zip(multipliers.iter())
        {
            let weight = model.base_weight() * multiplier;
            match call {
                Some(Call::Big) => big_score += weight,
                Some(Call::Small) => small_score += weight,
                None => {}
            }
            votes.push(VoteRecord {
                source: model.as_str(),
                call: *call,
                weight,
                rationale: (*model == ModelId::Bridge).then(|| bridge_rationale.clone()),
            });
        }

        match rule_vote.call {
            Call::Big => big_score += RULE_WEIGHT,
            Call::Small => small_score += RULE_WEIGHT,
        }
        votes.push(VoteRecord {
            source: "ai",
            call: Some(rule_vote.call),
            weight: RULE_WEIGHT,
            rationale: Some(rule_vote.rationale),
        });

        let dampened = is_bad_pattern(history, &info);
        if dampened {
            big_score *= dec!(0.8);
            small_score *= dec!(0.8);
        }

        let call = if big_score > small_score {
            Call::Big
        } else {
            Call::Small
        };

        Prediction {
            call: Some(call),
            confidence_percent: scale_confidence(big_score, small_score),
            big_score,
            small_score,
            dampened,
            votes,
        }
    }
}

impl Default for Ensemble {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(n: u32, faces: [u8; 3]) -> Round {
        Round {
            game_num: format!("#{}", n),
            faces: faces.to_vec(),
            score: faces.iter().map(|f| *f as u32).sum(),
        }
    }

    fn history_at(top: u32, tape: &str) -> Vec<Round> {
        tape.chars()
            .enumerate()
            .map(|(i, c)| match c {
                'B' => round(top - i as u32, [6, 5, 4]),
                'S' => round(top - i as u32, [1, 2, 3]),
                _ => panic!("bad tape"),
            })
            .collect()
    }

    fn history(tape: &str) -> Vec<Round> {
        history_at(9000, tape)
    }

    #[test]
    fn test_empty_history_yields_no_call() {
        let mut ensemble = Ensemble::with_seed(1);
        let p = ensemble.predict(&[]);
        assert_eq!(p.call, None);
        assert_eq!(p.confidence_percent, 0);
        assert!(p.votes.is_empty());
    }

    #[test]
    fn test_sparse_history_flips_latest() {
        let mut ensemble = Ensemble::with_seed(1);
        let p = ensemble.predict(&history("SSS"));
        // All five models flip the Small latest to Big; the rule predictor
        // reads the low scores and calls Small at its flat 0.2 weight.
        assert_eq!(p.call, Some(Call::Big));
        assert_eq!(p.big_score, dec!(1.00));
        assert_eq!(p.small_score, dec!(0.2));
        assert_eq!(p.confidence_percent, 85);
    }

    #[test]
    fn test_quiet_big_streak_keeps_riding() {
        // 8 Big rounds: bridge calls the break but the four continuation
        // models outvote it.
        let mut ensemble = Ensemble::with_seed(1);
        let p = ensemble.predict(&history("BBBBBBBB"));
        assert_eq!(p.call, Some(Call::Big));
        assert!(!p.dampened);
        let bridge = p.votes.iter().find(|v| v.source == "bridge").unwrap();
        assert_eq!(bridge.call, Some(Call::Small));
        assert!(bridge.rationale.is_some());
    }

    #[test]
    fn test_confidence_band() {
        let mut ensemble = Ensemble::with_seed(3);
        for tape in ["BBB", "BSBSBSBS", "BBBBBBBB", "SSSSSSSSSSSS", "BBSSBBSSBBSS"] {
            let p = ensemble.predict(&history(tape));
            assert!(p.call.is_some());
            assert!(
                (61..=97).contains(&p.confidence_percent),
                "{} -> {}",
                tape,
                p.confidence_percent
            );
        }
    }

    #[test]
    fn test_choppy_tape_gets_dampened() {
        let mut ensemble = Ensemble::with_seed(1);
        let p = ensemble.predict(&history("BSBSBSBSBSBSBSB"));
        assert!(p.dampened);
        assert!((61..=97).contains(&p.confidence_percent));
    }

    #[test]
    fn test_marathon_streak_gets_dampened() {
        let mut ensemble = Ensemble::with_seed(1);
        let p = ensemble.predict(&history("BBBBBBBBBBBB"));
        assert!(p.dampened);
        assert_eq!(p.call, Some(Call::Big));
    }

    #[test]
    fn test_votes_are_recorded_for_tracked_models() {
        let mut ensemble = Ensemble::with_seed(1);
        ensemble.predict(&history_at(9000, "BBBBBB"));
        for model in ModelId::ALL {
            assert_eq!(ensemble.tracker().recorded(model), 1);
        }
        // next round arrives at the head of the snapshot
        ensemble.predict(&history_at(9001, "BBBBBBB"));
        for model in ModelId::ALL {
            assert_eq!(ensemble.tracker().recorded(model), 2);
        }
    }

    #[test]
    fn test_first_cycle_multiplier_is_neutral() {
        // Cold ledger: the five tracked models all ride at base weight, so
        // the accumulators land on exact base-weight sums.
        let mut ensemble = Ensemble::with_seed(1);
        let p = ensemble.predict(&history("BBBBBBBB"));
        // trend + short + mean + switch at 1.0 multiplier, plus the rule
        let bridge_weight = ModelId::Bridge.base_weight();
        assert_eq!(p.small_score, bridge_weight);
    }

    #[test]
    fn test_scale_confidence_floor_and_ceiling() {
        assert_eq!(scale_confidence(Decimal::ZERO, Decimal::ZERO), 61);
        assert_eq!(scale_confidence(dec!(1), dec!(1)), 61);
        assert_eq!(scale_confidence(dec!(1), Decimal::ZERO), 97);
        assert_eq!(scale_confidence(Decimal::ZERO, dec!(0.4)), 97);
        let mid = scale_confidence(dec!(0.8), dec!(0.4));
        assert!((61..=97).contains(&mid));
    }

    #[test]
    fn test_tie_resolves_small() {
        // Equal accumulators collapse to Small by construction
        assert_eq!(scale_confidence(dec!(0.5), dec!(0.5)), 61);
        let mut ensemble = Ensemble::with_seed(1);
        let p = ensemble.predict(&history("BBBBBBBB"));
        // sanity: the decision rule is strictly-greater on the Big side
        assert!(p.big_score > p.small_score);
    }
}
