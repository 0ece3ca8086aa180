//! Candle data source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::CandleTraderError;

pub trait CandleSource {
    /// Candles for `symbol` in source order. Rows are not validated here; the
    /// runner decides what to skip.
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, CandleTraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, CandleTraderError>;
}
