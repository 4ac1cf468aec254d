//! Rule-cascade predictor
//!
//! An independent decision-tree heuristic over the last few rounds and their
//! scores. Unlike the model set it never consults the streak analyzer and it
//! always produces a call; the sparse-history and dead-even branches fall
//! back to a coin flip, so the RNG is injectable for deterministic tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::types::{categories, Call, Category, Round};

/// A rule-based call with the branch that produced it
#[derive(Debug, Clone)]
pub struct RuleVote {
    pub call: Call,
    pub rationale: String,
}

/// Ordered rule cascade, first match wins
pub struct RulePredictor {
    rng: StdRng,
}

impl RulePredictor {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic predictor for tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn coin_flip(&mut self) -> Call {
        if self.rng.gen_bool(0.5) {
            Call::Big
        } else {
            Call::Small
        }
    }

    pub fn predict(&mut self, history: &[Round]) -> RuleVote {
        use Category::{Big, Small};

        if history.len() < 3 {
            return RuleVote {
                call: self.coin_flip(),
                rationale: "[AI] insufficient history, random call".to_string(),
            };
        }

        let cats = categories(history);

        let last3 = &cats[..3];
        if last3 == [Some(Big), Some(Small), Some(Big)] {
            return RuleVote {
                call: Call::Small,
                rationale: "[AI] pattern 1T1X detected, next lands Small".to_string(),
            };
        }
        if last3 == [Some(Small), Some(Big), Some(Small)] {
            return RuleVote {
                call: Call::Big,
                rationale: "[AI] pattern 1X1T detected, next lands Big".to_string(),
            };
        }

        if cats.len() >= 4 {
            let last4 = &cats[..4];
            if last4 == [Some(Big), Some(Big), Some(Small), Some(Small)] {
                return RuleVote {
                    call: Call::Big,
                    rationale: "[AI] pattern 2T2X detected, next lands Big".to_string(),
                };
            }
            if last4 == [Some(Small), Some(Small), Some(Big), Some(Big)] {
                return RuleVote {
                    call: Call::Small,
                    rationale: "[AI] pattern 2X2T detected, next lands Small".to_string(),
                };
            }
        }

        if history.len() >= 9 {
            if cats[..6].iter().all(|c| *c == Some(Big)) {
                return RuleVote {
                    call: Call::Small,
                    rationale: "[AI] Big run of six, calling the break to Small".to_string(),
                };
            }
            if cats[..6].iter().all(|c| *c == Some(Small)) {
                return RuleVote {
                    call: Call::Big,
                    rationale: "[AI] Small run of six, calling the break to Big".to_string(),
                };
            }
        }

        let recent_scores: Vec<Decimal> = history
            .iter()
            .take(5)
            .map(|r| Decimal::from(r.score))
            .collect();
        let avg_score =
            recent_scores.iter().sum::<Decimal>() / Decimal::from(recent_scores.len() as i64);
        if avg_score > Decimal::from(10) {
            return RuleVote {
                call: Call::Big,
                rationale: format!("[AI] high average score ({:.1}), calling Big", avg_score),
            };
        }
        if avg_score < Decimal::from(8) {
            return RuleVote {
                call: Call::Small,
                rationale: format!("[AI] low average score ({:.1}), calling Small", avg_score),
            };
        }

        let recent = &cats[..cats.len().min(5)];
        let big_count = recent.iter().filter(|c| **c == Some(Big)).count();
        let small_count = recent.iter().filter(|c| **c == Some(Small)).count();
        if big_count > small_count + 1 {
            return RuleVote {
                call: Call::Small,
                rationale: format!(
                    "[AI] Big holds the recent majority ({}/{}), calling Small",
                    big_count,
                    recent.len()
                ),
            };
        }
        if small_count > big_count + 1 {
            return RuleVote {
                call: Call::Big,
                rationale: format!(
                    "[AI] Small holds the recent majority ({}/{}), calling Big",
                    small_count,
                    recent.len()
                ),
            };
        }

        let overall_big = cats.iter().filter(|c| **c == Some(Big)).count();
        let overall_small = cats.iter().filter(|c| **c == Some(Small)).count();
        if overall_big > overall_small + 2 {
            return RuleVote {
                call: Call::Small,
                rationale: "[AI] Big dominates overall, calling Small".to_string(),
            };
        }
        if overall_small > overall_big + 2 {
            return RuleVote {
                call: Call::Big,
                rationale: "[AI] Small dominates overall, calling Big".to_string(),
            };
        }

        RuleVote {
            call: self.coin_flip(),
            rationale: "[AI] balanced history, random call".to_string(),
        }
    }
}

impl Default for RulePredictor {
    fn default() -> Self {
        Self::new()
    }
}
