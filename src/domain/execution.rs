//! Trade execution: sizing, protective levels, and exit triggers.
//!
//! Exits are evaluated against the candle close only. Intrabar crossings of
//! the stop or target through `high`/`low` are not simulated, so fills that
//! would have happened inside a bar are reported at the next close instead.

use chrono::NaiveDateTime;

use super::candle::Candle;
use super::ledger::PositionLedger;
use super::pattern::{Direction, Signal};
use super::risk_profile::RiskProfile;
use super::trade::{CloseReason, Trade, TradeExit, TradeId, TradeState};

/// Result of an entry attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryResult {
    Opened(TradeId),
    /// Sizing produced no tradable position (capital exhausted or bad price).
    InsufficientCapital,
}

/// Summary of a close, handed back to the caller for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedTrade {
    pub id: TradeId,
    pub reason: CloseReason,
    pub exit_price: f64,
    pub realized_pnl: f64,
}

/// Stop-loss and take-profit levels for an entry at `price`.
pub fn protective_levels(direction: Direction, price: f64, profile: &RiskProfile) -> (f64, f64) {
    let sl = profile.stop_loss_pct();
    let tp = profile.take_profit_pct();
    match direction {
        Direction::Buy => (price * (1.0 - sl), price * (1.0 + tp)),
        Direction::Sell => (price * (1.0 + sl), price * (1.0 - tp)),
    }
}

/// Open a trade for an admitted signal.
///
/// 1. position_value = current_capital * max_position_size_fraction
/// 2. quantity = position_value / signal.price (fractional units allowed)
/// 3. direction-aware stop-loss / take-profit from the profile
/// 4. append to the ledger in state Open; capital is not debited
pub fn open_trade(
    ledger: &mut PositionLedger,
    signal: &Signal,
    profile: &RiskProfile,
    candle: &Candle,
    symbol: &str,
) -> EntryResult {
    let position_value = ledger.current_capital() * profile.max_position_size_fraction();
    if !(position_value > 0.0 && position_value.is_finite()) || !(signal.price > 0.0) {
        return EntryResult::InsufficientCapital;
    }

    let quantity = position_value / signal.price;
    let (stop_loss_price, take_profit_price) =
        protective_levels(signal.direction, signal.price, profile);

    let trade = Trade {
        id: ledger.next_trade_id(),
        open_time: candle.timestamp,
        symbol: symbol.to_string(),
        pattern_kind: signal.pattern_kind,
        direction: signal.direction,
        entry_price: signal.price,
        quantity,
        position_value,
        stop_loss_price,
        take_profit_price,
        state: TradeState::Open,
        exit: None,
    };

    EntryResult::Opened(ledger.record_open(trade))
}

/// Which exit, if any, `price` triggers. Stop-loss is checked first and wins
/// when both levels are satisfied by the same price.
pub fn exit_trigger(trade: &Trade, price: f64) -> Option<CloseReason> {
    if trade.should_stop_loss(price) {
        Some(CloseReason::StopLoss)
    } else if trade.should_take_profit(price) {
        Some(CloseReason::TakeProfit)
    } else {
        None
    }
}

/// Close an open trade at `price`. This is the only Open -> Closed transition.
///
/// Returns `None` if the id is unknown or the trade is already closed.
pub fn close_trade(
    ledger: &mut PositionLedger,
    id: TradeId,
    price: f64,
    time: NaiveDateTime,
    reason: CloseReason,
) -> Option<TradeExit> {
    let trade = ledger.trade(id).filter(|t| t.is_open())?;

    let realized_pnl = trade.pnl_at(price);
    let exit = TradeExit {
        close_reason: reason,
        close_time: time,
        exit_price: price,
        realized_pnl,
        realized_pnl_pct: realized_pnl / trade.position_value * 100.0,
    };

    ledger.record_close(id, exit.clone()).then_some(exit)
}

/// Evaluate every open trade against `candle.close`.
///
/// Two passes: collect the triggered ids first, then close them, so the
/// ledger is not mutated while it is being scanned.
pub fn check_open_trades(ledger: &mut PositionLedger, candle: &Candle) -> Vec<ClosedTrade> {
    let price = candle.close;
    let triggered: Vec<(TradeId, CloseReason)> = ledger
        .open_trades()
        .filter_map(|t| exit_trigger(t, price).map(|reason| (t.id, reason)))
        .collect();

    close_all(ledger, triggered, price, candle.timestamp)
}

/// Force-close everything still open at the final candle's close.
pub fn finalize_open_trades(ledger: &mut PositionLedger, last: &Candle) -> Vec<ClosedTrade> {
    let open: Vec<(TradeId, CloseReason)> = ledger
        .open_trades()
        .map(|t| (t.id, CloseReason::EndOfSeries))
        .collect();

    close_all(ledger, open, last.close, last.timestamp)
}

fn close_all(
    ledger: &mut PositionLedger,
    targets: Vec<(TradeId, CloseReason)>,
    price: f64,
    time: NaiveDateTime,
) -> Vec<ClosedTrade> {
    targets
        .into_iter()
        .filter_map(|(id, reason)| {
            close_trade(ledger, id, price, time, reason).map(|exit| ClosedTrade {
                id,
                reason,
                exit_price: exit.exit_price,
                realized_pnl: exit.realized_pnl,
            })
        })
        .collect()
}
