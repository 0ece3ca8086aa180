//! Configuration validation.
//!
//! Turns the raw `[backtest]` and `[profile]` sections into typed values,
//! failing on the first missing or out-of-range key before any run starts.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL, DEFAULT_SYMBOL};
use crate::domain::error::ConfigError;
use crate::domain::pattern::PatternKind;
use crate::domain::risk_profile::{ProfilePreset, RiskProfile, RiskProfileSpec};
use crate::ports::config_port::ConfigPort;

pub const BACKTEST_SECTION: &str = "backtest";
pub const PROFILE_SECTION: &str = "profile";

/// Name given to a profile defined without a preset or an explicit name.
pub const CUSTOM_PROFILE_NAME: &str = "custom";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ConfigError> {
    build_backtest_config(config).map(|_| ())
}

pub fn validate_profile_config(config: &dyn ConfigPort) -> Result<(), ConfigError> {
    build_risk_profile(config).map(|_| ())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, ConfigError> {
    let symbol = config
        .get_string(BACKTEST_SECTION, "symbol")
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    let initial_capital =
        optional(config, BACKTEST_SECTION, "initial_capital")?.unwrap_or(DEFAULT_INITIAL_CAPITAL);

    let backtest = BacktestConfig::new(symbol, initial_capital);
    backtest.validate()?;
    Ok(backtest)
}

/// Resolve the `[profile]` section.
///
/// With `preset`, file keys override the preset's values. Without it every
/// numeric key and `enabled_patterns` must be present.
pub fn build_risk_profile(config: &dyn ConfigPort) -> Result<RiskProfile, ConfigError> {
    let preset = optional::<ProfilePreset>(config, PROFILE_SECTION, "preset")?;

    let spec = match preset {
        Some(preset) => apply_overrides(config, preset.spec())?,
        None => RiskProfileSpec {
            name: config
                .get_string(PROFILE_SECTION, "name")
                .unwrap_or_else(|| CUSTOM_PROFILE_NAME.to_string()),
            confidence_threshold: required(config, PROFILE_SECTION, "confidence_threshold")?,
            enabled_patterns: enabled_patterns(config)?
                .ok_or_else(|| ConfigError::missing(PROFILE_SECTION, "enabled_patterns"))?,
            max_trades_per_day: required(config, PROFILE_SECTION, "max_trades_per_day")?,
            max_position_size_fraction: required(
                config,
                PROFILE_SECTION,
                "max_position_size_fraction",
            )?,
            stop_loss_pct: required(config, PROFILE_SECTION, "stop_loss_pct")?,
            take_profit_pct: required(config, PROFILE_SECTION, "take_profit_pct")?,
        },
    };

    RiskProfile::new(spec)
}

fn apply_overrides(
    config: &dyn ConfigPort,
    mut spec: RiskProfileSpec,
) -> Result<RiskProfileSpec, ConfigError> {
    if let Some(name) = config.get_string(PROFILE_SECTION, "name") {
        spec.name = name;
    }
    if let Some(v) = optional(config, PROFILE_SECTION, "confidence_threshold")? {
        spec.confidence_threshold = v;
    }
    if let Some(v) = enabled_patterns(config)? {
        spec.enabled_patterns = v;
    }
    if let Some(v) = optional(config, PROFILE_SECTION, "max_trades_per_day")? {
        spec.max_trades_per_day = v;
    }
    if let Some(v) = optional(config, PROFILE_SECTION, "max_position_size_fraction")? {
        spec.max_position_size_fraction = v;
    }
    if let Some(v) = optional(config, PROFILE_SECTION, "stop_loss_pct")? {
        spec.stop_loss_pct = v;
    }
    if let Some(v) = optional(config, PROFILE_SECTION, "take_profit_pct")? {
        spec.take_profit_pct = v;
    }
    Ok(spec)
}

fn enabled_patterns(config: &dyn ConfigPort) -> Result<Option<BTreeSet<PatternKind>>, ConfigError> {
    let Some(items) = config.get_list(PROFILE_SECTION, "enabled_patterns") else {
        return Ok(None);
    };
    items
        .iter()
        .map(|item| {
            item.parse::<PatternKind>()
                .map_err(|reason| ConfigError::invalid(PROFILE_SECTION, "enabled_patterns", reason))
        })
        .collect::<Result<BTreeSet<_>, _>>()
        .map(Some)
}

fn optional<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    config
        .get_string(section, key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                ConfigError::invalid(section, key, format!("cannot parse '{raw}': {e}"))
            })
        })
        .transpose()
}

fn required<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    optional(config, section, key)?.ok_or_else(|| ConfigError::missing(section, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const FULL_PROFILE: &str = r#"
[backtest]
symbol = BTCUSDT
initial_capital = 50000

[profile]
name = swing
confidence_threshold = 0.7
enabled_patterns = hammer, shooting_star
max_trades_per_day = 4
max_position_size_fraction = 0.25
stop_loss_pct = 0.03
take_profit_pct = 0.09
"#;

    fn invalid_key(result: Result<RiskProfile, ConfigError>) -> String {
        match result {
            Err(ConfigError::Invalid { key, .. }) => key,
            other => panic!("expected invalid-value error, got {other:?}"),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(FULL_PROFILE);
        assert!(validate_backtest_config(&config).is_ok());
        let backtest = build_backtest_config(&config).unwrap();
        assert_eq!(backtest.symbol, "BTCUSDT");
        assert!((backtest.initial_capital - 50_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn backtest_section_defaults() {
        let config = make_config("[profile]\npreset = moderate\n");
        let backtest = build_backtest_config(&config).unwrap();
        assert_eq!(backtest.symbol, "UNKNOWN");
        assert!((backtest.initial_capital - 100_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn initial_capital_must_be_positive() {
        for bad in ["0", "-100", "inf"] {
            let config = make_config(&format!("[backtest]\ninitial_capital = {bad}\n"));
            assert!(matches!(
                validate_backtest_config(&config),
                Err(ConfigError::Invalid { ref key, .. }) if key == "initial_capital"
            ));
        }
    }

    #[test]
    fn initial_capital_must_be_numeric() {
        let config = make_config("[backtest]\ninitial_capital = lots\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(err.to_string().contains("initial_capital"));
    }

    #[test]
    fn full_profile_without_preset() {
        let profile = build_risk_profile(&make_config(FULL_PROFILE)).unwrap();
        assert_eq!(profile.name(), "swing");
        assert!((profile.confidence_threshold() - 0.7).abs() < f64::EPSILON);
        assert!(profile.is_enabled(PatternKind::ShootingStar));
        assert_eq!(profile.max_trades_per_day(), 4);
        assert!((profile.max_position_size_fraction() - 0.25).abs() < f64::EPSILON);
        assert!((profile.stop_loss_pct() - 0.03).abs() < f64::EPSILON);
        assert!((profile.take_profit_pct() - 0.09).abs() < f64::EPSILON);
    }

    #[test]
    fn name_defaults_to_custom() {
        let content = FULL_PROFILE.replace("name = swing\n", "");
        let profile = build_risk_profile(&make_config(&content)).unwrap();
        assert_eq!(profile.name(), "custom");
    }

    #[test]
    fn missing_key_without_preset_fails() {
        let content = FULL_PROFILE.replace("stop_loss_pct = 0.03\n", "");
        let err = build_risk_profile(&make_config(&content)).unwrap_err();
        assert_eq!(err, ConfigError::missing("profile", "stop_loss_pct"));
    }

    #[test]
    fn preset_alone_is_enough() {
        let config = make_config("[profile]\npreset = aggressive\n");
        let profile = build_risk_profile(&config).unwrap();
        assert_eq!(profile, RiskProfile::preset(ProfilePreset::Aggressive));
    }

    #[test]
    fn file_keys_override_preset() {
        let config = make_config(
            "[profile]\npreset = conservative\nname = careful\nmax_trades_per_day = 1\nenabled_patterns = shooting_star\n",
        );
        let profile = build_risk_profile(&config).unwrap();
        assert_eq!(profile.name(), "careful");
        assert_eq!(profile.max_trades_per_day(), 1);
        assert!(profile.is_enabled(PatternKind::ShootingStar));
        assert!(!profile.is_enabled(PatternKind::Hammer));
        // untouched values come from the preset
        assert!((profile.confidence_threshold() - 0.75).abs() < f64::EPSILON);
        assert!((profile.stop_loss_pct() - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn overrides_are_validated() {
        let config = make_config("[profile]\npreset = moderate\nstop_loss_pct = 1.5\n");
        assert_eq!(invalid_key(build_risk_profile(&config)), "stop_loss_pct");
    }

    #[test]
    fn unknown_preset_fails() {
        let config = make_config("[profile]\npreset = yolo\n");
        assert_eq!(invalid_key(build_risk_profile(&config)), "preset");
    }

    #[test]
    fn unknown_pattern_fails() {
        let content = FULL_PROFILE.replace("hammer, shooting_star", "hammer, doji");
        assert_eq!(
            invalid_key(build_risk_profile(&make_config(&content))),
            "enabled_patterns"
        );
    }

    #[test]
    fn negative_trade_cap_fails_to_parse() {
        let content = FULL_PROFILE.replace("max_trades_per_day = 4", "max_trades_per_day = -1");
        assert_eq!(
            invalid_key(build_risk_profile(&make_config(&content))),
            "max_trades_per_day"
        );
    }

    #[test]
    fn wide_target_and_zero_cap_are_accepted() {
        let content = FULL_PROFILE
            .replace("take_profit_pct = 0.09", "take_profit_pct = 1.5")
            .replace("max_trades_per_day = 4", "max_trades_per_day = 0");
        let profile = build_risk_profile(&make_config(&content)).unwrap();
        assert!((profile.take_profit_pct() - 1.5).abs() < f64::EPSILON);
        assert_eq!(profile.max_trades_per_day(), 0);
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let content = FULL_PROFILE.replace("confidence_threshold = 0.7", "confidence_threshold = 1.2");
        assert!(validate_profile_config(&make_config(&content)).is_err());
    }

    #[test]
    fn missing_profile_section_fails() {
        let config = make_config("[backtest]\nsymbol = X\n");
        assert!(matches!(
            validate_profile_config(&config),
            Err(ConfigError::Missing { .. })
        ));
    }
}
