//! Candlestick reversal pattern detection.
//!
//! Only the most recent candle of the window is inspected. The built-in
//! rules look at single-candle geometry; the preceding candles are passed
//! along for rules that need trend context.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::candle::Candle;

/// Fewest candles a window must hold before any rule is evaluated.
pub const MIN_WINDOW: usize = 3;

/// Most candles the runner hands to [`detect`]: the current one plus ten before it.
pub const MAX_WINDOW: usize = 11;

/// Fixed confidence assigned to every built-in pattern.
pub const PATTERN_CONFIDENCE: f64 = 0.75;

/// The dominant shadow must be at least this many bodies long.
pub const SHADOW_TO_BODY: f64 = 2.0;

/// The opposite shadow may be at most this fraction of the body.
pub const OPPOSITE_SHADOW_TO_BODY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Hammer,
    ShootingStar,
}

impl PatternKind {
    pub const ALL: [PatternKind; 2] = [PatternKind::Hammer, PatternKind::ShootingStar];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Hammer => "hammer",
            PatternKind::ShootingStar => "shooting_star",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hammer" => Ok(PatternKind::Hammer),
            "shooting_star" | "shooting-star" | "shootingstar" => Ok(PatternKind::ShootingStar),
            other => Err(format!("unknown pattern '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for long exposure, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => f.write_str("buy"),
            Direction::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub pattern_kind: PatternKind,
    pub confidence: f64,
    pub direction: Direction,
    pub price: f64,
}

struct Rule {
    kind: PatternKind,
    direction: Direction,
    matches: fn(&Candle) -> bool,
}

// Evaluation order is precedence: a degenerate candle matching both rules
// is reported as a hammer.
const RULES: [Rule; 2] = [
    Rule {
        kind: PatternKind::Hammer,
        direction: Direction::Buy,
        matches: is_hammer,
    },
    Rule {
        kind: PatternKind::ShootingStar,
        direction: Direction::Sell,
        matches: is_shooting_star,
    },
];

/// Long lower shadow, almost no upper shadow.
pub fn is_hammer(candle: &Candle) -> bool {
    let body = candle.body();
    candle.lower_shadow() >= SHADOW_TO_BODY * body
        && candle.upper_shadow() <= OPPOSITE_SHADOW_TO_BODY * body
}

/// Long upper shadow, almost no lower shadow.
pub fn is_shooting_star(candle: &Candle) -> bool {
    let body = candle.body();
    candle.upper_shadow() >= SHADOW_TO_BODY * body
        && candle.lower_shadow() <= OPPOSITE_SHADOW_TO_BODY * body
}

/// Detect a reversal pattern on the last candle of `window`.
///
/// Returns `None` when the window holds fewer than [`MIN_WINDOW`] candles or
/// no rule matches.
pub fn detect(window: &[Candle]) -> Option<Signal> {
    if window.len() < MIN_WINDOW {
        return None;
    }
    let current = window.last()?;

    RULES
        .iter()
        .find(|rule| (rule.matches)(current))
        .map(|rule| Signal {
            pattern_kind: rule.kind,
            confidence: PATTERN_CONFIDENCE,
            direction: rule.direction,
            price: current.close,
        })
}
