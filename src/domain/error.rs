//! Domain error types.
//!
//! [`ConfigError`] is fatal and raised before a run starts. [`DataError`] is
//! per-candle and recoverable: the runner skips the candle and keeps going.

/// Invalid or missing run configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    Missing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    Invalid {
        section: String,
        key: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn missing(section: &str, key: &str) -> Self {
        ConfigError::Missing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// A candle that cannot be traded on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("{field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositivePrice { field: &'static str, value: f64 },

    #[error("volume must be non-negative, got {value}")]
    NegativeVolume { value: f64 },

    #[error("high {high} is below max(open, close) {body_top}")]
    HighBelowBody { high: f64, body_top: f64 },

    #[error("low {low} is above min(open, close) {body_bottom}")]
    LowAboveBody { low: f64, body_bottom: f64 },
}

/// Top-level error type for candletrader.
#[derive(Debug, thiserror::Error)]
pub enum CandleTraderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("backtest run already finished")]
    RunFinished,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CandleTraderError> for std::process::ExitCode {
    fn from(err: &CandleTraderError) -> Self {
        let code: u8 = match err {
            CandleTraderError::Io(_) => 1,
            CandleTraderError::Config(_) => 2,
            CandleTraderError::DataSource { .. } => 3,
            CandleTraderError::Report { .. } => 4,
            CandleTraderError::RunFinished => 5,
        };
        std::process::ExitCode::from(code)
    }
}
