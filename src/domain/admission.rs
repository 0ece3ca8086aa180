//! Trade admission: whether a detected signal may become a trade.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::pattern::Signal;
use super::risk_profile::RiskProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    LowConfidence,
    PatternDisabled,
    DailyLimitReached,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::LowConfidence => "confidence below threshold",
            RejectReason::PatternDisabled => "pattern not enabled",
            RejectReason::DailyLimitReached => "daily trade limit reached",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected(RejectReason),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Check a signal against the profile, reporting the first failed condition.
pub fn evaluate(signal: &Signal, profile: &RiskProfile, trades_opened_today: u32) -> Admission {
    if signal.confidence < profile.confidence_threshold() {
        Admission::Rejected(RejectReason::LowConfidence)
    } else if !profile.is_enabled(signal.pattern_kind) {
        Admission::Rejected(RejectReason::PatternDisabled)
    } else if trades_opened_today >= profile.max_trades_per_day() {
        Admission::Rejected(RejectReason::DailyLimitReached)
    } else {
        Admission::Admitted
    }
}

pub fn admit(signal: &Signal, profile: &RiskProfile, trades_opened_today: u32) -> bool {
    evaluate(signal, profile, trades_opened_today).is_admitted()
}
