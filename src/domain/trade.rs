//! Simulated trades and their lifecycle (Open -> Closed).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::pattern::{Direction, PatternKind};

pub type TradeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    EndOfSeries,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::StopLoss => "stop_loss",
            CloseReason::TakeProfit => "take_profit",
            CloseReason::EndOfSeries => "end_of_series",
        };
        f.write_str(s)
    }
}

/// Exit-side fields, present once a trade is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExit {
    pub close_reason: CloseReason,
    pub close_time: NaiveDateTime,
    pub exit_price: f64,
    pub realized_pnl: f64,
    pub realized_pnl_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub open_time: NaiveDateTime,
    pub symbol: String,
    pub pattern_kind: PatternKind,
    pub direction: Direction,
    pub entry_price: f64,
    pub quantity: f64,
    pub position_value: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub state: TradeState,
    pub exit: Option<TradeExit>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.state == TradeState::Open
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Buy
    }

    /// Signed P&L of closing the whole position at `price`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity * self.direction.sign()
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        if self.is_long() {
            price <= self.stop_loss_price
        } else {
            price >= self.stop_loss_price
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        if self.is_long() {
            price >= self.take_profit_price
        } else {
            price <= self.take_profit_price
        }
    }

    pub fn realized_pnl(&self) -> Option<f64> {
        self.exit.as_ref().map(|e| e.realized_pnl)
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.exit.as_ref().map(|e| e.close_reason)
    }

    pub fn exit_price(&self) -> Option<f64> {
        self.exit.as_ref().map(|e| e.exit_price)
    }
}
