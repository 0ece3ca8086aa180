//! Risk profiles: the policy knobs a backtest runs under.
//!
//! A [`RiskProfile`] can only be obtained through validation, either from a
//! [`RiskProfileSpec`] or from a [`ProfilePreset`], so every profile the
//! engine sees is in range. Deserialization goes through the same check.
//!
//! An empty pattern set or a zero daily cap is valid: such a profile simply
//! never opens a trade.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;
use super::pattern::PatternKind;

const SECTION: &str = "profile";

/// Unvalidated profile fields, as read from a config document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfileSpec {
    pub name: String,
    pub confidence_threshold: f64,
    pub enabled_patterns: BTreeSet<PatternKind>,
    pub max_trades_per_day: u32,
    pub max_position_size_fraction: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RiskProfileSpec", into = "RiskProfileSpec")]
pub struct RiskProfile {
    name: String,
    confidence_threshold: f64,
    enabled_patterns: BTreeSet<PatternKind>,
    max_trades_per_day: u32,
    max_position_size_fraction: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
}

impl RiskProfile {
    pub fn new(spec: RiskProfileSpec) -> Result<Self, ConfigError> {
        validate_spec(&spec)?;
        Ok(Self::from_spec(spec))
    }

    /// Preset values are covered by `every_preset_is_valid`.
    pub fn preset(preset: ProfilePreset) -> Self {
        Self::from_spec(preset.spec())
    }

    fn from_spec(spec: RiskProfileSpec) -> Self {
        RiskProfile {
            name: spec.name,
            confidence_threshold: spec.confidence_threshold,
            enabled_patterns: spec.enabled_patterns,
            max_trades_per_day: spec.max_trades_per_day,
            max_position_size_fraction: spec.max_position_size_fraction,
            stop_loss_pct: spec.stop_loss_pct,
            take_profit_pct: spec.take_profit_pct,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn enabled_patterns(&self) -> &BTreeSet<PatternKind> {
        &self.enabled_patterns
    }

    pub fn is_enabled(&self, kind: PatternKind) -> bool {
        self.enabled_patterns.contains(&kind)
    }

    pub fn max_trades_per_day(&self) -> u32 {
        self.max_trades_per_day
    }

    pub fn max_position_size_fraction(&self) -> f64 {
        self.max_position_size_fraction
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    /// The fields as an editable spec, e.g. for applying overrides.
    pub fn to_spec(&self) -> RiskProfileSpec {
        self.clone().into()
    }
}

impl TryFrom<RiskProfileSpec> for RiskProfile {
    type Error = ConfigError;

    fn try_from(spec: RiskProfileSpec) -> Result<Self, Self::Error> {
        RiskProfile::new(spec)
    }
}

impl From<RiskProfile> for RiskProfileSpec {
    fn from(profile: RiskProfile) -> Self {
        RiskProfileSpec {
            name: profile.name,
            confidence_threshold: profile.confidence_threshold,
            enabled_patterns: profile.enabled_patterns,
            max_trades_per_day: profile.max_trades_per_day,
            max_position_size_fraction: profile.max_position_size_fraction,
            stop_loss_pct: profile.stop_loss_pct,
            take_profit_pct: profile.take_profit_pct,
        }
    }
}

fn validate_spec(spec: &RiskProfileSpec) -> Result<(), ConfigError> {
    if spec.name.trim().is_empty() {
        return Err(ConfigError::invalid(SECTION, "name", "name must not be empty"));
    }

    let threshold = spec.confidence_threshold;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::invalid(
            SECTION,
            "confidence_threshold",
            "confidence_threshold must be between 0 and 1",
        ));
    }

    let size = spec.max_position_size_fraction;
    if !size.is_finite() || size <= 0.0 || size > 1.0 {
        return Err(ConfigError::invalid(
            SECTION,
            "max_position_size_fraction",
            "max_position_size_fraction must be in (0, 1]",
        ));
    }

    validate_pct("stop_loss_pct", spec.stop_loss_pct)?;
    validate_pct("take_profit_pct", spec.take_profit_pct)?;
    Ok(())
}

/// Percentages are fractions of the entry price; targets past 100% are allowed.
fn validate_pct(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(
            SECTION,
            key,
            format!("{key} must be a positive fraction"),
        ));
    }
    Ok(())
}

/// Built-in profiles, keyed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilePreset {
    Conservative,
    Moderate,
    Aggressive,
}

impl ProfilePreset {
    pub const ALL: [ProfilePreset; 3] = [
        ProfilePreset::Conservative,
        ProfilePreset::Moderate,
        ProfilePreset::Aggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfilePreset::Conservative => "conservative",
            ProfilePreset::Moderate => "moderate",
            ProfilePreset::Aggressive => "aggressive",
        }
    }

    pub fn spec(&self) -> RiskProfileSpec {
        let (confidence_threshold, patterns, max_trades_per_day, size, stop_loss, take_profit) =
            match self {
                ProfilePreset::Conservative => (0.75, &[PatternKind::Hammer][..], 2, 0.05, 0.02, 0.04),
                ProfilePreset::Moderate => (0.70, &PatternKind::ALL[..], 3, 0.10, 0.03, 0.06),
                ProfilePreset::Aggressive => (0.60, &PatternKind::ALL[..], 5, 0.20, 0.05, 0.10),
            };

        RiskProfileSpec {
            name: self.as_str().to_string(),
            confidence_threshold,
            enabled_patterns: patterns.iter().copied().collect(),
            max_trades_per_day,
            max_position_size_fraction: size,
            stop_loss_pct: stop_loss,
            take_profit_pct: take_profit,
        }
    }
}

impl fmt::Display for ProfilePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfilePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(ProfilePreset::Conservative),
            "moderate" => Ok(ProfilePreset::Moderate),
            "aggressive" => Ok(ProfilePreset::Aggressive),
            other => Err(format!("unknown preset '{other}'")),
        }
    }
}
