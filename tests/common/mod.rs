#![allow(dead_code)]

use candletrader::domain::candle::Candle;
use candletrader::domain::error::CandleTraderError;
use candletrader::domain::pattern::PatternKind;
use candletrader::domain::risk_profile::{RiskProfile, RiskProfileSpec};
use candletrader::ports::data_port::CandleSource;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Write;

pub struct MockCandleSource {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl CandleSource for MockCandleSource {
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, CandleTraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(CandleTraderError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, CandleTraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// `n` hours after [`start`].
pub fn hour(n: i64) -> NaiveDateTime {
    start() + Duration::hours(n)
}

pub fn candle(n: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp: hour(n),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// Zero-body candle; matches neither pattern.
pub fn flat(n: i64, price: f64) -> Candle {
    candle(n, price, price + 0.5, price - 0.5, price)
}

/// body 2, lower shadow 5, upper shadow 0.1
pub fn hammer(n: i64) -> Candle {
    candle(n, 100.0, 102.1, 95.0, 102.0)
}

/// body 2, upper shadow 5, lower shadow 0.1
pub fn shooting_star(n: i64) -> Candle {
    candle(n, 102.0, 107.0, 99.9, 100.0)
}

pub fn make_profile(
    threshold: f64,
    patterns: &[PatternKind],
    max_per_day: u32,
    size: f64,
    stop_loss: f64,
    take_profit: f64,
) -> RiskProfile {
    RiskProfile::new(RiskProfileSpec {
        name: "test".into(),
        confidence_threshold: threshold,
        enabled_patterns: patterns.iter().copied().collect(),
        max_trades_per_day: max_per_day,
        max_position_size_fraction: size,
        stop_loss_pct: stop_loss,
        take_profit_pct: take_profit,
    })
    .unwrap()
}

/// Accepts both patterns at 0.5 confidence; 10% sizing, 2% stop, 4% target.
pub fn permissive_profile() -> RiskProfile {
    make_profile(0.5, &PatternKind::ALL, 10, 0.1, 0.02, 0.04)
}

pub fn csv_text(candles: &[Candle]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for c in candles {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.timestamp.format("%Y-%m-%d %H:%M:%S"),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        ));
    }
    out
}

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
