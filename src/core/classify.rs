//! Per-currency change detection between two snapshots

use super::currency::{CurrencyCode, RateSnapshot};
use std::collections::HashMap;
use std::fmt::Display;

/// Smallest rate difference treated as a real move.
pub const DEFAULT_CHANGE_EPSILON: f64 = 0.00001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeClassification {
    Increased,
    Decreased,
    Unchanged,
    /// No previous rate to compare against.
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl ChangeClassification {
    pub fn direction(self) -> Option<Direction> {
        match self {
            ChangeClassification::Increased => Some(Direction::Up),
            ChangeClassification::Decreased => Some(Direction::Down),
            ChangeClassification::Unchanged | ChangeClassification::New => None,
        }
    }
}

impl Display for ChangeClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChangeClassification::Increased => "increased",
                ChangeClassification::Decreased => "decreased",
                ChangeClassification::Unchanged => "unchanged",
                ChangeClassification::New => "new",
            }
        )
    }
}

pub type Classifications = HashMap<CurrencyCode, ChangeClassification>;

/// Compares a single rate pair. A difference of at least `epsilon` in either
/// direction counts as a move; equal rates never do.
pub fn classify_rate(previous: f64, current: f64, epsilon: f64) -> ChangeClassification {
    let diff = current - previous;
    let moved = diff != 0.0 && diff.abs() >= epsilon;
    if !moved {
        ChangeClassification::Unchanged
    } else if diff > 0.0 {
        ChangeClassification::Increased
    } else {
        ChangeClassification::Decreased
    }
}

/// Classifies every code of `current` against `previous`.
///
/// Without a previous snapshot every code is `New`; callers use that to
/// suppress indicators on a first render.
pub fn classify(
    previous: Option<&RateSnapshot>,
    current: &RateSnapshot,
    epsilon: f64,
) -> Classifications {
    current
        .iter()
        .map(|(code, rate)| {
            let class = match previous.and_then(|prev| prev.get(code.as_str())) {
                Some(prev_rate) => classify_rate(prev_rate, rate, epsilon),
                None => ChangeClassification::New,
            };
            (code.clone(), class)
        })
        .collect()
}

/// True when any entry would carry an up/down indicator.
pub fn has_movement(classifications: &Classifications) -> bool {
    classifications
        .values()
        .any(|class| class.direction().is_some())
}
