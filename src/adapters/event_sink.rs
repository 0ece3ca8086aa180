//! Event sink adapters: forward to `tracing`, collect in memory, or discard.

use tracing::{debug, info, warn};

use crate::ports::event_port::{EventSink, RunEvent};

/// Emits every event through `tracing`, labelled with the run it belongs to.
#[derive(Debug, Clone)]
pub struct TracingSink {
    run: String,
}

impl TracingSink {
    pub fn new(run: impl Into<String>) -> Self {
        Self { run: run.into() }
    }

    pub fn run(&self) -> &str {
        &self.run
    }
}

impl EventSink for TracingSink {
    fn record(&mut self, event: RunEvent) {
        let run = self.run.as_str();
        match event {
            RunEvent::CandleRejected {
                index,
                timestamp,
                error,
            } => {
                warn!(run, index, %timestamp, %error, "skipping invalid candle");
            }
            RunEvent::SignalDetected { index, signal } => {
                debug!(
                    run,
                    index,
                    pattern = %signal.pattern_kind,
                    direction = %signal.direction,
                    confidence = signal.confidence,
                    price = signal.price,
                    "pattern detected"
                );
            }
            RunEvent::SignalRejected {
                index,
                pattern_kind,
                reason,
            } => {
                debug!(run, index, pattern = %pattern_kind, %reason, "signal rejected");
            }
            RunEvent::EntryRefused {
                index,
                pattern_kind,
            } => {
                warn!(run, index, pattern = %pattern_kind, "entry refused: no capital to size against");
            }
            RunEvent::TradeOpened {
                id,
                direction,
                entry_price,
                quantity,
            } => {
                info!(run, id, %direction, entry_price, quantity, "trade opened");
            }
            RunEvent::TradeClosed {
                id,
                reason,
                exit_price,
                realized_pnl,
            } => {
                info!(run, id, %reason, exit_price, realized_pnl, "trade closed");
            }
            RunEvent::RunFinished {
                trades,
                candles_processed,
                candles_skipped,
            } => {
                info!(run, trades, candles_processed, candles_skipped, "backtest finished");
            }
        }
    }
}

/// Keeps every event, in order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub events: Vec<RunEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejected_candles(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RunEvent::CandleRejected { .. }))
            .count()
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, event: RunEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: RunEvent) {}
}
