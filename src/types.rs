//! Core domain types
//!
//! A `Round` is one resolved game event: three dice and their summed score.
//! Rounds classify into `Category` (Big / Small / Triple); predictions are
//! `Call`s (Big / Small only — nobody calls a Triple).

use serde::{Deserialize, Serialize};
use std::fmt;

/// One completed round as delivered by the result feed, newest first.
///
/// `game_num` is the feed's textual round id (`"#2435721"`); it is unique and
/// monotonically increasing. Malformed records (missing dice) deserialize
/// with empty `faces` and classify as unknown rather than failing the fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    #[serde(rename = "gameNum")]
    pub game_num: String,
    #[serde(rename = "facesList", default)]
    pub faces: Vec<u8>,
    #[serde(default)]
    pub score: u32,
}

impl Round {
    /// Classify this round.
    ///
    /// All three faces equal → Triple. Otherwise Big when the score reaches
    /// 11, Small below. Rounds without exactly three faces have no category;
    /// callers treat that as neither Big nor Small.
    pub fn category(&self) -> Option<Category> {
        match *self.faces.as_slice() {
            [a, b, c] if a == b && b == c => Some(Category::Triple),
            [_, _, _] if self.score >= 11 => Some(Category::Big),
            [_, _, _] => Some(Category::Small),
            _ => None,
        }
    }
}

/// Outcome classification of a single round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Score 11 or higher (non-triple)
    Big,
    /// Score 10 or lower (non-triple)
    Small,
    /// All three faces equal
    Triple,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Big => write!(f, "Big"),
            Category::Small => write!(f, "Small"),
            Category::Triple => write!(f, "Triple"),
        }
    }
}

/// A model's directional call for the next round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Call {
    Big,
    Small,
}

impl Call {
    /// The flip of the current category: Big runs flip to Small, anything
    /// else (Small, Triple, unknown) flips to Big.
    pub fn against(current: Option<Category>) -> Call {
        match current {
            Some(Category::Big) => Call::Small,
            _ => Call::Big,
        }
    }

    /// Ride the current category: Big stays Big, anything else resolves to
    /// Small.
    pub fn toward(current: Option<Category>) -> Call {
        match current {
            Some(Category::Big) => Call::Big,
            _ => Call::Small,
        }
    }

    /// Does this call cash against the given category?
    pub fn matches(&self, category: Category) -> bool {
        matches!(
            (self, category),
            (Call::Big, Category::Big) | (Call::Small, Category::Small)
        )
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::Big => write!(f, "Big"),
            Call::Small => write!(f, "Small"),
        }
    }
}

/// Classified view of a history snapshot, newest first.
pub fn categories(history: &[Round]) -> Vec<Option<Category>> {
    history.iter().map(|r| r.category()).collect()
}
