//! Position ledger: trade records, capital, and equity tracking.
//!
//! Capital follows a notional model. Opening a trade debits nothing; only
//! realized P&L on close moves `current_capital`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::trade::{Trade, TradeExit, TradeId, TradeState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    initial_capital: f64,
    current_capital: f64,
    peak_capital: f64,
    trades: Vec<Trade>,
    // Leading trades that are all closed, and their P&L summed in open order.
    settled: usize,
    settled_pnl: f64,
    next_id: TradeId,
    opened_per_day: BTreeMap<NaiveDate, u32>,
    equity_curve: Vec<EquityPoint>,
}

impl PositionLedger {
    pub fn new(initial_capital: f64) -> Self {
        PositionLedger {
            initial_capital,
            current_capital: initial_capital,
            peak_capital: initial_capital,
            trades: Vec::new(),
            settled: 0,
            settled_pnl: 0.0,
            next_id: 1,
            opened_per_day: BTreeMap::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn current_capital(&self) -> f64 {
        self.current_capital
    }

    pub fn peak_capital(&self) -> f64 {
        self.peak_capital
    }

    /// All trades in open order, open and closed alike.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trade(&self, id: TradeId) -> Option<&Trade> {
        self.index_of(id).map(|i| &self.trades[i])
    }

    pub fn open_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_open())
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| !t.is_open())
    }

    pub fn open_trade_count(&self) -> usize {
        self.open_trades().count()
    }

    pub fn trades_opened_on(&self, day: NaiveDate) -> u32 {
        self.opened_per_day.get(&day).copied().unwrap_or(0)
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Sum of realized P&L over closed trades, in ledger order.
    ///
    /// Only the trades from the first still-open one onward are walked; the
    /// closed prefix is carried as a running total.
    pub fn realized_pnl(&self) -> f64 {
        self.trades[self.settled..]
            .iter()
            .filter_map(Trade::realized_pnl)
            .fold(self.settled_pnl, |total, pnl| total + pnl)
    }

    /// Id the next recorded trade will receive.
    pub fn next_trade_id(&self) -> TradeId {
        self.next_id
    }

    /// Append a freshly opened trade. The trade must carry [`Self::next_trade_id`].
    pub(crate) fn record_open(&mut self, trade: Trade) -> TradeId {
        debug_assert_eq!(trade.id, self.next_id);
        debug_assert!(trade.is_open());

        let id = trade.id;
        *self
            .opened_per_day
            .entry(trade.open_time.date())
            .or_insert(0) += 1;
        self.trades.push(trade);
        self.next_id += 1;
        id
    }

    /// Apply the Open -> Closed transition and resample capital.
    ///
    /// Returns `false` when the id is unknown or the trade is already closed.
    pub(crate) fn record_close(&mut self, id: TradeId, exit: TradeExit) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let trade = &mut self.trades[index];
        if !trade.is_open() {
            return false;
        }

        let timestamp = exit.close_time;
        trade.state = TradeState::Closed;
        trade.exit = Some(exit);

        while let Some(pnl) = self.trades.get(self.settled).and_then(Trade::realized_pnl) {
            self.settled_pnl += pnl;
            self.settled += 1;
        }

        // Summed in open order so capital never drifts from the sum of
        // realized P&L, whatever order trades close in.
        self.current_capital = self.initial_capital + self.realized_pnl();
        self.peak_capital = self.peak_capital.max(self.current_capital);
        self.equity_curve.push(EquityPoint {
            timestamp,
            capital: self.current_capital,
        });
        true
    }

    fn index_of(&self, id: TradeId) -> Option<usize> {
        // ids are assigned in push order, so the list is sorted by id
        self.trades.binary_search_by_key(&id, |t| t.id).ok()
    }
}
