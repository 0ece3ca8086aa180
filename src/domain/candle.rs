//! OHLCV candle representation and validity checks.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::DataError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// |close - open|
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// min(open, close) - low
    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// high - max(open, close)
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Checks that the candle can be traded on.
    ///
    /// Finiteness is checked first so the ordering comparisons below never see
    /// a NaN.
    pub fn validate(&self) -> Result<(), DataError> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];

        for (field, value) in prices.iter().copied().chain([("volume", self.volume)]) {
            if !value.is_finite() {
                return Err(DataError::NonFinite { field, value });
            }
        }

        for (field, value) in prices {
            if value <= 0.0 {
                return Err(DataError::NonPositivePrice { field, value });
            }
        }

        if self.volume < 0.0 {
            return Err(DataError::NegativeVolume { value: self.volume });
        }

        let body_top = self.open.max(self.close);
        if self.high < body_top {
            return Err(DataError::HighBelowBody {
                high: self.high,
                body_top,
            });
        }

        let body_bottom = self.open.min(self.close);
        if self.low > body_bottom {
            return Err(DataError::LowAboveBody {
                low: self.low,
                body_bottom,
            });
        }

        Ok(())
    }
}
