//! The heuristic model set
//!
//! Five independent predictors over the classified history:
//! - `trend` — decay-weighted majority with 4-gram pattern override
//! - `short` — 3-gram pattern hunter over a short window
//! - `mean` — Big/Small balance reversion
//! - `recent_switch` — churn-driven flip of the latest result
//! - `bridge` — streak-break specialist with its own adjusted probability
//!
//! All five consume the same `StreakInfo` computed once per cycle and share a
//! streak guard: past the model's run threshold the bridge-break signal
//! dominates (break probability above 0.75 flips the run, anything lower
//! rides it).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::patterns::dominant_ngram;
use crate::engine::streak::{adjacent_switches, StreakInfo};
use crate::types::{categories, Call, Category, Round};

/// Identifier for a tracked model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    Trend,
    Short,
    Mean,
    Switch,
    Bridge,
}

impl ModelId {
    pub const ALL: [ModelId; 5] = [
        ModelId::Trend,
        ModelId::Short,
        ModelId::Mean,
        ModelId::Switch,
        ModelId::Bridge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Trend => "trend",
            ModelId::Short => "short",
            ModelId::Mean => "mean",
            ModelId::Switch => "switch",
            ModelId::Bridge => "bridge",
        }
    }

    /// Base ensemble weight before the performance multiplier
    pub fn base_weight(&self) -> Decimal {
        match self {
            ModelId::Trend => dec!(0.2),
            ModelId::Short => dec!(0.2),
            ModelId::Mean => dec!(0.25),
            ModelId::Switch => dec!(0.2),
            ModelId::Bridge => dec!(0.15),
        }
    }

    /// Run length at which the streak guard takes over
    fn streak_threshold(&self) -> usize {
        match self {
            ModelId::Trend => 5,
            _ => 4,
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum rounds before any model produces a call
const MIN_ROUNDS: usize = 3;

/// Shared streak guard: past the threshold the run itself decides the vote.
fn streak_guard(streak: &StreakInfo, model: ModelId) -> Option<Call> {
    if streak.length >= model.streak_threshold() {
        if streak.break_probability > dec!(0.75) {
            Some(Call::against(streak.category))
        } else {
            Some(Call::toward(streak.category))
        }
    } else {
        None
    }
}

/// Flip keyed on the Small side: a Small latest flips to Big; Big, Triple and
/// unknown all resolve to Small.
fn flip(latest: Option<Category>) -> Call {
    match latest {
        Some(Category::Small) => Call::Big,
        _ => Call::Small,
    }
}

fn powi(base: Decimal, exp: usize) -> Decimal {
    (0..exp).fold(Decimal::ONE, |acc, _| acc * base)
}

/// Decay-weighted trend model.
///
/// The last 15 rounds are weighted by 1.2^(14 - i), newest heaviest. A
/// dominant 4-gram in the last 10 (three or more occurrences) overrides the
/// weighting: the vote is Big when the pattern's tail differs from the latest
/// category, Small otherwise. Failing that, a weighted gap of at least 25%
/// votes the flip of the heavy side; the fallback flips the latest round.
pub fn trend(history: &[Round], streak: &StreakInfo) -> Option<Call> {
    if history.len() < MIN_ROUNDS {
        return None;
    }
    if let Some(call) = streak_guard(streak, ModelId::Trend) {
        return Some(call);
    }

    let cats = categories(history);
    let window = &cats[..cats.len().min(15)];

    let mut big_weight = Decimal::ZERO;
    let mut small_weight = Decimal::ZERO;
    for (i, cat) in window.iter().enumerate() {
        let weight = powi(dec!(1.2), 14 - i);
        match cat {
            Some(Category::Big) => big_weight += weight,
            Some(Category::Small) => small_weight += weight,
            _ => {}
        }
    }
    let total = big_weight + small_weight;

    let recent = &window[..window.len().min(10)];
    if recent.len() >= 4 {
        if let Some(dominant) = dominant_ngram(recent, 4) {
            if dominant.count >= 3 {
                return Some(if dominant.last() != recent[0] {
                    Call::Big
                } else {
                    Call::Small
                });
            }
        }
    }

    if total > Decimal::ZERO && (big_weight - small_weight).abs() / total >= dec!(0.25) {
        return Some(if big_weight > small_weight {
            Call::Small
        } else {
            Call::Big
        });
    }

    Some(flip(window[0]))
}

/// Short-window pattern model: dominant 3-gram over the last 8 rounds, two
/// occurrences are enough to trigger.
pub fn short(history: &[Round], streak: &StreakInfo) -> Option<Call> {
    if history.len() < MIN_ROUNDS {
        return None;
    }
    if let Some(call) = streak_guard(streak, ModelId::Short) {
        return Some(call);
    }

    let cats = categories(history);
    let window = &cats[..cats.len().min(8)];

    if window.len() >= 3 {
        if let Some(dominant) = dominant_ngram(window, 3) {
            if dominant.count >= 2 {
                return Some(if dominant.last() != window[0] {
                    Call::Big
                } else {
                    Call::Small
                });
            }
        }
    }

    Some(flip(window[0]))
}

/// Balance-reversion model over the last 12 rounds.
///
/// Counts fold Triple and unknown rounds into the Small side (window length
/// minus Big count). A near-even split flips the latest round; a skewed one
/// votes the minority side.
pub fn mean(history: &[Round], streak: &StreakInfo) -> Option<Call> {
    if history.len() < MIN_ROUNDS {
        return None;
    }
    if let Some(call) = streak_guard(streak, ModelId::Mean) {
        return Some(call);
    }

    let cats = categories(history);
    let window = &cats[..cats.len().min(12)];
    let big = window.iter().filter(|c| **c == Some(Category::Big)).count();
    let small = window.len() - big;

    let deviation =
        Decimal::from(big.abs_diff(small) as i64) / Decimal::from(window.len() as i64);
    if deviation < dec!(0.35) {
        return Some(flip(window[0]));
    }

    Some(if small > big { Call::Big } else { Call::Small })
}

/// Churn model over the last 10 rounds.
pub fn recent_switch(history: &[Round], streak: &StreakInfo) -> Option<Call> {
    if history.len() < MIN_ROUNDS {
        return None;
    }
    if let Some(call) = streak_guard(streak, ModelId::Switch) {
        return Some(call);
    }

    let cats = categories(history);
    let window = &cats[..cats.len().min(10)];
    // The high-churn branch was tuned down to the same call as the calm one,
    // so the count no longer steers the vote.
    // TODO: decide whether six or more switches should ride the latest result
    // instead of flipping it.
    let _switches = adjacent_switches(window);

    Some(flip(window[0]))
}

/// Bridge model output: the call plus the adjusted break probability that
/// produced it.
#[derive(Debug, Clone)]
pub struct BridgeVote {
    pub call: Option<Call>,
    pub break_probability: Decimal,
    pub rationale: String,
}

impl BridgeVote {
    pub fn short_history() -> Self {
        Self {
            call: None,
            break_probability: Decimal::ZERO,
            rationale: "[Bridge] not enough history to read the bridge".to_string(),
        }
    }
}

fn fmt_pattern(pattern: &[Option<Category>]) -> String {
    pattern
        .iter()
        .map(|c| match c {
            Some(Category::Big) => "B",
            Some(Category::Small) => "S",
            Some(Category::Triple) => "T",
            None => "?",
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Streak-break specialist.
///
/// Starts from the shared break probability and adjusts it with score
/// volatility (mean absolute deviation over the last 20 rounds) and pattern
/// stability (a 3-gram repeated three or more times while the last 5 rounds
/// all sit on the current run). Above 0.65 the vote flips the run, otherwise
/// it rides it.
pub fn bridge(history: &[Round], streak: &StreakInfo) -> BridgeVote {
    if history.len() < MIN_ROUNDS {
        return BridgeVote::short_history();
    }

    let cats = categories(history);
    let window = &cats[..cats.len().min(20)];
    let scores: Vec<Decimal> = history
        .iter()
        .take(20)
        .map(|r| Decimal::from(r.score))
        .collect();

    let count = Decimal::from(scores.len() as i64);
    let avg: Decimal = scores.iter().sum::<Decimal>() / count;
    let deviation: Decimal = scores.iter().map(|s| (*s - avg).abs()).sum::<Decimal>() / count;

    let last5 = &window[..window.len().min(5)];
    let dominant = dominant_ngram(window, 3);
    let stable = dominant.as_ref().map_or(false, |d| d.count >= 3);

    let run_label = streak
        .category
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unclassified".to_string());

    let mut probability = streak.break_probability;
    let rationale;
    if streak.length >= 6 {
        probability = (probability + dec!(0.15)).min(dec!(0.9));
        rationale = format!(
            "[Bridge] {}-round {} run, break pressure high",
            streak.length, run_label
        );
    } else if streak.length >= 4 && deviation > dec!(3) {
        probability = (probability + dec!(0.1)).min(dec!(0.85));
        rationale = format!(
            "[Bridge] score volatility {:.1} raising break pressure",
            deviation
        );
    } else if stable && last5.iter().all(|c| *c == streak.category) {
        probability = (probability + dec!(0.05)).min(dec!(0.8));
        let pattern = dominant.as_ref().map(|d| fmt_pattern(&d.pattern)).unwrap_or_default();
        rationale = format!("[Bridge] repeating pattern {} on the current run", pattern);
    } else {
        probability = (probability - dec!(0.15)).max(dec!(0.15));
        rationale = "[Bridge] no strong break signal, riding the bridge".to_string();
    }

    let call = if probability > dec!(0.65) {
        Call::against(streak.category)
    } else {
        Call::toward(streak.category)
    };

    BridgeVote {
        call: Some(call),
        break_probability: probability,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::streak;

    fn round(n: usize, faces: [u8; 3]) -> Round {
        Round {
            game_num: format!("#{}", 5000 - n),
            faces: faces.to_vec(),
            score: faces.iter().map(|f| *f as u32).sum(),
        }
    }

    /// Build a newest-first history from a pattern string, 'B' big, 'S' small.
    fn history(tape: &str) -> Vec<Round> {
        tape.chars()
            .enumerate()
            .map(|(i, c)| match c {
                'B' => round(i, [6, 5, 4]),
                'S' => round(i, [1, 2, 3]),
                'T' => round(i, [2, 2, 2]),
                _ => panic!("bad tape"),
            })
            .collect()
    }

    fn run_all(tape: &str) -> Vec<Option<Call>> {
        let h = history(tape);
        let info = streak::detect(&h);
        vec![
            trend(&h, &info),
            short(&h, &info),
            mean(&h, &info),
            recent_switch(&h, &info),
            bridge(&h, &info).call,
        ]
    }

    #[test]
    fn test_sparse_history_abstains() {
        for tape in ["", "B", "BS"] {
            for call in run_all(tape) {
                assert_eq!(call, None, "history {:?} must abstain", tape);
            }
        }
    }

    #[test]
    fn test_guard_rides_quiet_streak() {
        // 8 Big in a row: break probability lands at exactly 0.75, which does
        // not clear the 0.75 bar, so every guarded model rides the run.
        let h = history("BBBBBBBB");
        let info = streak::detect(&h);
        assert_eq!(trend(&h, &info), Some(Call::Big));
        assert_eq!(short(&h, &info), Some(Call::Big));
        assert_eq!(mean(&h, &info), Some(Call::Big));
        assert_eq!(recent_switch(&h, &info), Some(Call::Big));
    }

    #[test]
    fn test_guard_flips_hot_streak() {
        // An 8-run on top of a churny tail pushes the break probability past
        // 0.75 and every guarded model turns against the run.
        let h = history("BBBBBBBBSBSBSBS");
        let info = streak::detect(&h);
        assert!(info.break_probability > dec!(0.75));
        assert_eq!(trend(&h, &info), Some(Call::Small));
        assert_eq!(short(&h, &info), Some(Call::Small));
        assert_eq!(mean(&h, &info), Some(Call::Small));
        assert_eq!(recent_switch(&h, &info), Some(Call::Small));
    }

    #[test]
    fn test_trend_pattern_override() {
        // Strict alternation: BSBS repeats four times in the last 10, tail S
        // differs from the latest B, so the model calls Big.
        let h = history("BSBSBSBSBS");
        let info = streak::detect(&h);
        assert_eq!(info.length, 1);
        assert_eq!(trend(&h, &info), Some(Call::Big));
    }

    #[test]
    fn test_trend_weighted_gap_flips_heavy_side() {
        // Big dominates the decay weights with no dominant 4-gram; the model
        // votes the flip of the heavy side.
        let h = history("BBSBBSBBS");
        let info = streak::detect(&h);
        assert_eq!(trend(&h, &info), Some(Call::Small));
    }

    #[test]
    fn test_short_pattern_trigger() {
        // BBS repeats in the last 8; tail S == latest? latest is B, tail is S,
        // different -> Big.
        let h = history("BBSBBSBB");
        let info = streak::detect(&h);
        assert_eq!(short(&h, &info), Some(Call::Big));
    }

    #[test]
    fn test_mean_balanced_flips_latest() {
        let h = history("BSBSBSBSBSBS");
        let info = streak::detect(&h);
        assert_eq!(mean(&h, &info), Some(Call::Small));

        let h = history("SBSBSBSBSBSB");
        let info = streak::detect(&h);
        assert_eq!(mean(&h, &info), Some(Call::Big));
    }

    #[test]
    fn test_mean_skew_votes_minority() {
        // 9 Big / 3 Small without tripping the streak guard
        let h = history("BBSBBSBBSBBB");
        let info = streak::detect(&h);
        assert_eq!(info.length, 2);
        assert_eq!(mean(&h, &info), Some(Call::Small));
    }

    #[test]
    fn test_switch_always_flips_latest() {
        let h = history("SBBSBBSBB");
        let info = streak::detect(&h);
        assert_eq!(recent_switch(&h, &info), Some(Call::Big));

        let h = history("BSSBSSBSS");
        let info = streak::detect(&h);
        assert_eq!(recent_switch(&h, &info), Some(Call::Small));
    }

    #[test]
    fn test_bridge_flips_long_run() {
        let h = history("BBBBBBBB");
        let info = streak::detect(&h);
        let vote = bridge(&h, &info);
        // 0.75 base + 0.15 long-run bump, capped at 0.9
        assert_eq!(vote.break_probability, dec!(0.9));
        assert_eq!(vote.call, Some(Call::Small));
        assert!(vote.rationale.contains("run"));
    }

    #[test]
    fn test_bridge_rides_calm_water() {
        let h = history("BSBS");
        let info = streak::detect(&h);
        let vote = bridge(&h, &info);
        assert_eq!(vote.break_probability, dec!(0.15));
        assert_eq!(vote.call, Some(Call::Big));
    }

    #[test]
    fn test_bridge_probability_in_unit_interval() {
        for tape in ["BBB", "BBBBBBBBBBBB", "BSBSBSBSBS", "BBSSBBSSBB", "TTTBBB"] {
            let h = history(tape);
            let info = streak::detect(&h);
            let vote = bridge(&h, &info);
            assert!(vote.break_probability >= Decimal::ZERO);
            assert!(vote.break_probability <= Decimal::ONE);
        }
    }

    #[test]
    fn test_model_weights_sum_to_one() {
        let total: Decimal = ModelId::ALL.iter().map(|m| m.base_weight()).sum();
        assert_eq!(total, dec!(1.00));
    }
}
