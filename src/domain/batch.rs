//! Run several risk profiles over the same candle series.
//!
//! Runs share nothing but the read-only candles, so they can go through
//! rayon's pool. Results come back in the order the profiles were given.

use rayon::prelude::*;

use super::backtest::{self, BacktestConfig, BacktestReport};
use super::candle::Candle;
use super::error::CandleTraderError;
use super::risk_profile::RiskProfile;
use crate::ports::event_port::EventSink;

/// Run every profile against `candles`, one independent runner each.
///
/// `make_sink` builds the event sink for a profile's run; it is called on
/// whichever worker thread executes that run.
pub fn run_profiles<S, F>(
    config: &BacktestConfig,
    profiles: &[RiskProfile],
    candles: &[Candle],
    parallel: bool,
    make_sink: F,
) -> Result<Vec<BacktestReport>, CandleTraderError>
where
    S: EventSink,
    F: Fn(&RiskProfile) -> S + Sync,
{
    config.validate()?;

    let run_one = |profile: &RiskProfile| {
        backtest::run(config.clone(), profile.clone(), candles, make_sink(profile))
    };

    if parallel {
        profiles
            .par_iter()
            .map(run_one)
            .collect::<Result<Vec<_>, _>>()
    } else {
        profiles
            .iter()
            .map(run_one)
            .collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::event_sink::{MemorySink, NullSink};
    use crate::domain::risk_profile::ProfilePreset;
    use chrono::{Duration, NaiveDate};

    fn series() -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..40)
            .map(|i| {
                let t = start + Duration::hours(i);
                if i % 5 == 4 {
                    // hammer
                    Candle {
                        timestamp: t,
                        open: 100.0,
                        high: 102.1,
                        low: 95.0,
                        close: 102.0,
                        volume: 500.0,
                    }
                } else {
                    let p = 100.0 + (i % 7) as f64;
                    Candle {
                        timestamp: t,
                        open: p,
                        high: p + 1.0,
                        low: p - 1.0,
                        close: p,
                        volume: 500.0,
                    }
                }
            })
            .collect()
    }

    fn presets() -> Vec<RiskProfile> {
        ProfilePreset::ALL.into_iter().map(RiskProfile::preset).collect()
    }

    #[test]
    fn parallel_matches_sequential() {
        let config = BacktestConfig::default();
        let candles = series();
        let profiles = presets();

        let par = run_profiles(&config, &profiles, &candles, true, |_| NullSink).unwrap();
        let seq = run_profiles(&config, &profiles, &candles, false, |_| NullSink).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn results_keep_profile_order() {
        let config = BacktestConfig::default();
        let profiles = presets();
        let reports = run_profiles(&config, &profiles, &series(), true, |_| MemorySink::new()).unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.profile.name()).collect();
        assert_eq!(names, vec!["conservative", "moderate", "aggressive"]);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let config = BacktestConfig::new("TEST", -5.0);
        let result = run_profiles(&config, &presets(), &series(), true, |_| NullSink);
        assert!(matches!(result, Err(CandleTraderError::Config(_))));
    }

    #[test]
    fn no_profiles_no_reports() {
        let config = BacktestConfig::default();
        let reports = run_profiles(&config, &[], &series(), true, |_| NullSink).unwrap();
        assert!(reports.is_empty());
    }
}
