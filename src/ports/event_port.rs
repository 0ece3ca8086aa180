//! Run event port: the structured log a backtest writes into.
//!
//! Each runner owns its sink for the length of one run. Nothing in the
//! engine touches a process-wide logger, so runs on different threads never
//! share logging state.

use chrono::NaiveDateTime;

use crate::domain::admission::RejectReason;
use crate::domain::error::DataError;
use crate::domain::pattern::{Direction, PatternKind, Signal};
use crate::domain::trade::{CloseReason, TradeId};

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    CandleRejected {
        index: usize,
        timestamp: NaiveDateTime,
        error: DataError,
    },
    SignalDetected {
        index: usize,
        signal: Signal,
    },
    SignalRejected {
        index: usize,
        pattern_kind: PatternKind,
        reason: RejectReason,
    },
    EntryRefused {
        index: usize,
        pattern_kind: PatternKind,
    },
    TradeOpened {
        id: TradeId,
        direction: Direction,
        entry_price: f64,
        quantity: f64,
    },
    TradeClosed {
        id: TradeId,
        reason: CloseReason,
        exit_price: f64,
        realized_pnl: f64,
    },
    RunFinished {
        trades: usize,
        candles_processed: usize,
        candles_skipped: usize,
    },
}

pub trait EventSink {
    fn record(&mut self, event: RunEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: RunEvent) {
        (**self).record(event);
    }
}
