//! Streak detection and break-probability estimation
//!
//! Every model in the set consumes the same `StreakInfo` per cycle; it is
//! recomputed fresh from the snapshot and never persisted.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{categories, Category, Round};

/// Window inspected for switches and Big/Small imbalance
const BREAK_WINDOW: usize = 15;

/// Current run plus the estimated chance it ends next round
#[derive(Debug, Clone, PartialEq)]
pub struct StreakInfo {
    /// Consecutive most-recent rounds sharing one category
    pub length: usize,
    /// Category of the run, `None` on empty history
    pub category: Option<Category>,
    /// Heuristic break chance, always within [0, 1]
    pub break_probability: Decimal,
}

impl StreakInfo {
    fn empty() -> Self {
        Self {
            length: 0,
            category: None,
            break_probability: Decimal::ZERO,
        }
    }
}

/// Count adjacent category changes in a newest-first window.
pub fn adjacent_switches(window: &[Option<Category>]) -> usize {
    window.windows(2).filter(|pair| pair[0] != pair[1]).count()
}

/// Analyze the snapshot (newest first) for the current streak and its break
/// probability.
///
/// The run stops at the first category change; Triple and unclassifiable
/// rounds count as their own categories, so a Triple terminates a Big run the
/// same way a Small does. The break probability is tiered on run length, fed
/// by the switch count and Big/Small imbalance over the last 15 rounds.
pub fn detect(history: &[Round]) -> StreakInfo {
    if history.is_empty() {
        return StreakInfo::empty();
    }

    let cats = categories(history);
    let current = cats[0];
    let length = cats.iter().take_while(|c| **c == current).count();

    let window = &cats[..cats.len().min(BREAK_WINDOW)];
    let switches = adjacent_switches(window);
    let big = window.iter().filter(|c| **c == Some(Category::Big)).count();
    let small = window
        .iter()
        .filter(|c| **c == Some(Category::Small))
        .count();
    let imbalance =
        Decimal::from(big.abs_diff(small) as i64) / Decimal::from(window.len() as i64);
    let switches = Decimal::from(switches as i64);

    let break_probability = if length >= 8 {
        (dec!(0.6) + switches / dec!(15) + imbalance * dec!(0.15)).min(dec!(0.9))
    } else if length >= 5 {
        (dec!(0.35) + switches / dec!(10) + imbalance * dec!(0.25)).min(dec!(0.85))
    } else if length >= 3 && switches >= dec!(7) {
        dec!(0.3)
    } else {
        Decimal::ZERO
    };

    StreakInfo {
        length,
        category: current,
        break_probability,
    }
}
