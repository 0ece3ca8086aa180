//! Backtest runner: drives one profile over one candle series.
//!
//! Per accepted candle, in order: validate, check exits on open trades,
//! extend the pattern window, then detect, admit and open. Exits are always
//! evaluated before a new entry so a trade cannot open and close on the same
//! candle.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::admission::{self, Admission};
use super::candle::Candle;
use super::error::{CandleTraderError, ConfigError};
use super::execution::{self, ClosedTrade, EntryResult};
use super::ledger::PositionLedger;
use super::metrics::PerformanceMetrics;
use super::pattern::{self, MAX_WINDOW, MIN_WINDOW};
use super::risk_profile::RiskProfile;
use super::trade::{Trade, TradeId};
use crate::ports::event_port::{EventSink, RunEvent};

pub const DEFAULT_SYMBOL: &str = "UNKNOWN";
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: String,
    pub initial_capital: f64,
}

impl BacktestConfig {
    pub fn new(symbol: impl Into<String>, initial_capital: f64) -> Self {
        Self {
            symbol: symbol.into(),
            initial_capital,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::invalid(
                "backtest",
                "symbol",
                "must not be empty",
            ));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::invalid(
                "backtest",
                "initial_capital",
                format!("must be a positive finite number, got {}", self.initial_capital),
            ));
        }
        Ok(())
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL, DEFAULT_INITIAL_CAPITAL)
    }
}

/// A candle that failed validation and was left out of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataWarning {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub reason: String,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub profile: RiskProfile,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
    pub warnings: Vec<DataWarning>,
    pub candles_processed: usize,
    pub candles_skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    NotStarted,
    Running,
    Finished,
}

/// What a single [`BacktestRunner::step`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub skipped: bool,
    pub closed: Vec<ClosedTrade>,
    pub opened: Option<TradeId>,
}

impl StepOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

pub struct BacktestRunner<S: EventSink> {
    config: BacktestConfig,
    profile: RiskProfile,
    ledger: PositionLedger,
    sink: S,
    state: RunnerState,
    window: VecDeque<Candle>,
    seen: usize,
    accepted: usize,
    warnings: Vec<DataWarning>,
}

impl<S: EventSink> BacktestRunner<S> {
    pub fn new(config: BacktestConfig, profile: RiskProfile, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let ledger = PositionLedger::new(config.initial_capital);
        Ok(Self {
            config,
            profile,
            ledger,
            sink,
            state: RunnerState::NotStarted,
            window: VecDeque::with_capacity(MAX_WINDOW),
            seen: 0,
            accepted: 0,
            warnings: Vec::new(),
        })
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Feed the next candle of the series.
    pub fn step(&mut self, candle: Candle) -> Result<StepOutcome, CandleTraderError> {
        if self.state == RunnerState::Finished {
            return Err(CandleTraderError::RunFinished);
        }
        self.state = RunnerState::Running;

        let index = self.seen;
        self.seen += 1;

        if let Err(error) = candle.validate() {
            self.warnings.push(DataWarning {
                index,
                timestamp: candle.timestamp,
                reason: error.to_string(),
            });
            self.sink.record(RunEvent::CandleRejected {
                index,
                timestamp: candle.timestamp,
                error,
            });
            return Ok(StepOutcome::skipped());
        }

        let closed = execution::check_open_trades(&mut self.ledger, &candle);
        self.record_closes(&closed);

        if self.window.len() == MAX_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(candle);
        self.accepted += 1;

        let opened = if self.accepted >= MIN_WINDOW {
            self.try_enter(index)
        } else {
            None
        };

        Ok(StepOutcome {
            skipped: false,
            closed,
            opened,
        })
    }

    /// Close whatever is still open at the last accepted candle and build the report.
    pub fn finish(&mut self) -> Result<BacktestReport, CandleTraderError> {
        if self.state == RunnerState::Finished {
            return Err(CandleTraderError::RunFinished);
        }

        let closed = match self.window.back() {
            Some(last) => execution::finalize_open_trades(&mut self.ledger, last),
            None => Vec::new(),
        };
        self.record_closes(&closed);
        self.state = RunnerState::Finished;

        let metrics = PerformanceMetrics::compute(&self.ledger);
        let candles_skipped = self.warnings.len();
        self.sink.record(RunEvent::RunFinished {
            trades: self.ledger.trades().len(),
            candles_processed: self.accepted,
            candles_skipped,
        });

        Ok(BacktestReport {
            symbol: self.config.symbol.clone(),
            profile: self.profile.clone(),
            trades: self.ledger.trades().to_vec(),
            metrics,
            warnings: std::mem::take(&mut self.warnings),
            candles_processed: self.accepted,
            candles_skipped,
        })
    }

    fn try_enter(&mut self, index: usize) -> Option<TradeId> {
        let signal = pattern::detect(self.window.make_contiguous())?;
        self.sink.record(RunEvent::SignalDetected { index, signal });

        let current = self.window.back()?;
        let opened_today = self.ledger.trades_opened_on(current.timestamp.date());
        if let Admission::Rejected(reason) =
            admission::evaluate(&signal, &self.profile, opened_today)
        {
            self.sink.record(RunEvent::SignalRejected {
                index,
                pattern_kind: signal.pattern_kind,
                reason,
            });
            return None;
        }

        match execution::open_trade(
            &mut self.ledger,
            &signal,
            &self.profile,
            current,
            &self.config.symbol,
        ) {
            EntryResult::Opened(id) => {
                if let Some(trade) = self.ledger.trade(id) {
                    self.sink.record(RunEvent::TradeOpened {
                        id,
                        direction: trade.direction,
                        entry_price: trade.entry_price,
                        quantity: trade.quantity,
                    });
                }
                Some(id)
            }
            EntryResult::InsufficientCapital => {
                self.sink.record(RunEvent::EntryRefused {
                    index,
                    pattern_kind: signal.pattern_kind,
                });
                None
            }
        }
    }

    fn record_closes(&mut self, closed: &[ClosedTrade]) {
        for c in closed {
            self.sink.record(RunEvent::TradeClosed {
                id: c.id,
                reason: c.reason,
                exit_price: c.exit_price,
                realized_pnl: c.realized_pnl,
            });
        }
    }
}

/// Run a whole series through a fresh runner.
pub fn run<S: EventSink>(
    config: BacktestConfig,
    profile: RiskProfile,
    candles: &[Candle],
    sink: S,
) -> Result<BacktestReport, CandleTraderError> {
    let mut runner = BacktestRunner::new(config, profile, sink)?;
    for candle in candles {
        runner.step(candle.clone())?;
    }
    runner.finish()
}
