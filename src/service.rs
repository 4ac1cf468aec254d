//! Prediction service
//!
//! Owns one `Ensemble` and the cached last prediction. The poll loop hands a
//! fresh snapshot to `on_snapshot` every tick; a cycle only runs when the
//! latest round id actually changed, so repeated polls inside the same round
//! are free and readers never observe a half-written prediction.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::engine::Ensemble;
use crate::types::{Call, Round};

/// The last emitted decision, overwritten only on a new round id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedPrediction {
    /// Round id the prediction was issued on
    pub round: Option<String>,
    pub call: Option<Call>,
    /// Display-only suggested totals for the called side
    pub picked_numbers: [u8; 3],
    /// Percent in [61, 97], 0 when no call was made
    pub confidence_percent: u32,
    pub generated_at: DateTime<Utc>,
}

impl CachedPrediction {
    fn empty() -> Self {
        Self {
            round: None,
            call: None,
            picked_numbers: [0, 0, 0],
            confidence_percent: 0,
            generated_at: Utc::now(),
        }
    }
}

/// Uniform sample of three distinct totals on the called side, sorted.
/// Cosmetic output only; nothing downstream reads it back.
struct NumberPicker {
    rng: StdRng,
}

impl NumberPicker {
    fn pick(&mut self, call: Option<Call>) -> [u8; 3] {
        let range = match call {
            Some(Call::Small) => 4..=10u8,
            Some(Call::Big) => 11..=17u8,
            None => return [0, 0, 0],
        };
        let mut numbers: Vec<u8> = Vec::with_capacity(3);
        while numbers.len() < 3 {
            let candidate = self.rng.gen_range(range.clone());
            if !numbers.contains(&candidate) {
                numbers.push(candidate);
            }
        }
        numbers.sort_unstable();
        [numbers[0], numbers[1], numbers[2]]
    }
}

struct ServiceState {
    ensemble: Ensemble,
    picker: NumberPicker,
    cached: CachedPrediction,
}

/// Snapshot-in, cached-prediction-out
pub struct PredictionService {
    min_history: usize,
    state: RwLock<ServiceState>,
}

impl PredictionService {
    pub fn new(min_history: usize) -> Self {
        Self {
            min_history,
            state: RwLock::new(ServiceState {
                ensemble: Ensemble::new(),
                picker: NumberPicker {
                    rng: StdRng::from_entropy(),
                },
                cached: CachedPrediction::empty(),
            }),
        }
    }

    /// Deterministic service for tests
    pub fn with_seed(min_history: usize, seed: u64) -> Self {
        Self {
            min_history,
            state: RwLock::new(ServiceState {
                ensemble: Ensemble::with_seed(seed),
                picker: NumberPicker {
                    rng: StdRng::seed_from_u64(seed),
                },
                cached: CachedPrediction::empty(),
            }),
        }
    }

    /// The last emitted prediction; read lock only, never blocks on a cycle.
    pub async fn current(&self) -> CachedPrediction {
        self.state.read().await.cached.clone()
    }

    /// Feed a fresh snapshot (newest first). Runs a cycle only when the
    /// latest round id differs from the cached one.
    pub async fn on_snapshot(&self, rounds: &[Round]) -> CachedPrediction {
        let Some(latest) = rounds.first() else {
            return self.current().await;
        };

        {
            let state = self.state.read().await;
            if state.cached.round.as_deref() == Some(latest.game_num.as_str()) {
                return state.cached.clone();
            }
        }

        let mut state = self.state.write().await;
        if state.cached.round.as_deref() == Some(latest.game_num.as_str()) {
            return state.cached.clone();
        }

        let cached = if rounds.len() >= self.min_history {
            let prediction = state.ensemble.predict(rounds);
            for vote in &prediction.votes {
                debug!(
                    source = vote.source,
                    call = ?vote.call,
                    weight = %vote.weight,
                    rationale = vote.rationale.as_deref().unwrap_or(""),
                    "model vote"
                );
            }
            let picked = state.picker.pick(prediction.call);
            info!(
                round = %latest.game_num,
                call = ?prediction.call,
                confidence = prediction.confidence_percent,
                dampened = prediction.dampened,
                "prediction issued"
            );
            CachedPrediction {
                round: Some(latest.game_num.clone()),
                call: prediction.call,
                picked_numbers: picked,
                confidence_percent: prediction.confidence_percent,
                generated_at: Utc::now(),
            }
        } else {
            debug!(
                round = %latest.game_num,
                rounds = rounds.len(),
                "snapshot below minimum history, holding back"
            );
            CachedPrediction {
                round: Some(latest.game_num.clone()),
                call: None,
                picked_numbers: [0, 0, 0],
                confidence_percent: 0,
                generated_at: Utc::now(),
            }
        };

        state.cached = cached.clone();
        cached
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

    fn history(top: u32, tape: &str) -> Vec<Round> {
        tape.chars()
            .enumerate()
            .map(|(i, c)| match c {
                'B' => round(top - i as u32, [6, 5, 4]),
                'S' => round(top - i as u32, [1, 2, 3]),
                _ => panic!("bad tape"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_snapshot_keeps_default() {
        let service = PredictionService::with_seed(5, 1);
        let cached = service.on_snapshot(&[]).await;
        assert_eq!(cached.round, None);
        assert_eq!(cached.call, None);
        assert_eq!(cached.confidence_percent, 0);
        assert_eq!(cached.picked_numbers, [0, 0, 0]);
    }

    #[tokio::test]
    async fn test_short_snapshot_holds_back() {
        let service = PredictionService::with_seed(5, 1);
        let cached = service.on_snapshot(&history(100, "BSB")).await;
        assert_eq!(cached.round.as_deref(), Some("#100"));
        assert_eq!(cached.call, None);
        assert_eq!(cached.confidence_percent, 0);
        assert_eq!(cached.picked_numbers, [0, 0, 0]);
    }

    #[tokio::test]
    async fn test_full_cycle_produces_call() {
        let service = PredictionService::with_seed(5, 1);
        let cached = service.on_snapshot(&history(100, "BBBBBBBB")).await;
        assert_eq!(cached.round.as_deref(), Some("#100"));
        assert_eq!(cached.call, Some(Call::Big));
        assert!((61..=97).contains(&cached.confidence_percent));
        // Big side totals, distinct and sorted
        let n = cached.picked_numbers;
        assert!(n.iter().all(|v| (11..=17).contains(v)));
        assert!(n[0] < n[1] && n[1] < n[2]);
    }

    #[tokio::test]
    async fn test_same_round_is_idempotent() {
        let service = PredictionService::with_seed(5, 7);
        let snapshot = history(100, "BSBSBSBS");
        let first = service.on_snapshot(&snapshot).await;
        let second = service.on_snapshot(&snapshot).await;
        assert_eq!(first, second);
        assert_eq!(service.current().await, first);
    }

    #[tokio::test]
    async fn test_new_round_overwrites_cache() {
        let service = PredictionService::with_seed(5, 7);
        let first = service.on_snapshot(&history(100, "BSBSBSBS")).await;
        let second = service.on_snapshot(&history(101, "SBSBSBSB")).await;
        assert_ne!(first.round, second.round);
        assert_eq!(second.round.as_deref(), Some("#101"));
        assert_eq!(service.current().await, second);
    }

    #[tokio::test]
    async fn test_small_call_numbers_range() {
        let service = PredictionService::with_seed(5, 3);
        // 8 Small rounds: the ensemble rides the Small run
        let cached = service.on_snapshot(&history(100, "SSSSSSSS")).await;
        assert_eq!(cached.call, Some(Call::Small));
        let n = cached.picked_numbers;
        assert!(n.iter().all(|v| (4..=10).contains(v)));
        assert!(n[0] < n[1] && n[1] < n[2]);
    }

    #[test]
    fn test_picker_is_deterministic_per_seed() {
        let mut a = NumberPicker {
            rng: StdRng::seed_from_u64(11),
        };
        let mut b = NumberPicker {
            rng: StdRng::seed_from_u64(11),
        };
        assert_eq!(a.pick(Some(Call::Big)), b.pick(Some(Call::Big)));
        assert_eq!(a.pick(Some(Call::Small)), b.pick(Some(Call::Small)));
        assert_eq!(a.pick(None), [0, 0, 0]);
    }
}
