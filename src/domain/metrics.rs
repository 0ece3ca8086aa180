//! Performance metrics over a ledger's closed trades.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ledger::{EquityPoint, PositionLedger};
use super::pattern::PatternKind;
use super::trade::Trade;

/// Gross profit over gross loss, with the zero-denominator cases spelled out.
///
/// JSON has no infinity, so the unbounded case is a variant rather than
/// `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfitFactor {
    /// No closed trades.
    Undefined,
    /// Profit with no losing trades.
    Infinite,
    Finite(f64),
}

impl ProfitFactor {
    fn from_totals(total_trades: usize, total_profit: f64, total_loss: f64) -> Self {
        if total_trades == 0 {
            ProfitFactor::Undefined
        } else if total_loss > 0.0 {
            ProfitFactor::Finite(total_profit / total_loss)
        } else if total_profit > 0.0 {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Finite(0.0)
        }
    }

    /// Numeric value: `+inf` for [`ProfitFactor::Infinite`], `None` when undefined.
    pub fn value(&self) -> Option<f64> {
        match self {
            ProfitFactor::Undefined => None,
            ProfitFactor::Infinite => Some(f64::INFINITY),
            ProfitFactor::Finite(v) => Some(*v),
        }
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Undefined => f.write_str("n/a"),
            ProfitFactor::Infinite => f.write_str("inf"),
            ProfitFactor::Finite(v) => write!(f, "{v:.2}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsStatus {
    NoTradesExecuted,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub pattern_kind: PatternKind,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub status: MetricsStatus,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    /// Percent, 0..=100.
    pub win_rate: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub net_profit: f64,
    pub profit_factor: ProfitFactor,
    pub avg_win: f64,
    /// Signed, so never positive.
    pub avg_loss: f64,
    pub largest_win: f64,
    /// Signed, so never positive.
    pub largest_loss: f64,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub peak_capital: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub roi_percentage: f64,
    pub by_pattern: Vec<PatternResult>,
}

impl PerformanceMetrics {
    pub fn compute(ledger: &PositionLedger) -> Self {
        let pnls: Vec<f64> = ledger
            .closed_trades()
            .filter_map(Trade::realized_pnl)
            .collect();

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut breakeven_trades = 0usize;
        let mut total_profit = 0.0_f64;
        let mut total_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for &pnl in &pnls {
            if pnl > 0.0 {
                winning_trades += 1;
                total_profit += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                losing_trades += 1;
                total_loss += pnl.abs();
                largest_loss = largest_loss.min(pnl);
            } else {
                breakeven_trades += 1;
            }
        }

        let total_trades = pnls.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            total_profit / winning_trades as f64
        } else {
            0.0
        };

        let avg_loss = if losing_trades > 0 {
            -(total_loss / losing_trades as f64)
        } else {
            0.0
        };

        let initial_capital = ledger.initial_capital();
        let final_capital = ledger.current_capital();
        let roi_percentage = if initial_capital > 0.0 {
            (final_capital - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_pct) =
            compute_drawdown(initial_capital, ledger.equity_curve());

        let status = if total_trades == 0 {
            MetricsStatus::NoTradesExecuted
        } else {
            MetricsStatus::Completed
        };

        PerformanceMetrics {
            status,
            total_trades,
            winning_trades,
            losing_trades,
            breakeven_trades,
            win_rate,
            total_profit,
            total_loss,
            net_profit: ledger.realized_pnl(),
            profit_factor: ProfitFactor::from_totals(total_trades, total_profit, total_loss),
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            initial_capital,
            final_capital,
            peak_capital: ledger.peak_capital(),
            max_drawdown,
            max_drawdown_pct,
            roi_percentage,
            by_pattern: PatternResult::compute_per_pattern(ledger.trades()),
        }
    }

    pub fn has_trades(&self) -> bool {
        self.status == MetricsStatus::Completed
    }
}

impl PatternResult {
    /// One entry per pattern with at least one closed trade, ordered by pattern.
    pub fn compute_per_pattern(trades: &[Trade]) -> Vec<PatternResult> {
        let mut grouped: BTreeMap<PatternKind, Vec<f64>> = BTreeMap::new();
        for trade in trades {
            if let Some(pnl) = trade.realized_pnl() {
                grouped.entry(trade.pattern_kind).or_default().push(pnl);
            }
        }

        grouped
            .into_iter()
            .map(|(pattern_kind, pnls)| {
                let total_trades = pnls.len();
                let winning_trades = pnls.iter().filter(|&&p| p > 0.0).count();
                PatternResult {
                    pattern_kind,
                    total_trades,
                    winning_trades,
                    win_rate: winning_trades as f64 / total_trades as f64 * 100.0,
                    total_pnl: pnls.iter().sum(),
                }
            })
            .collect()
    }
}

/// Largest peak-to-trough decline of the equity curve, as money and as a
/// percentage of the peak. The initial capital is the first peak.
fn compute_drawdown(initial_capital: f64, equity_curve: &[EquityPoint]) -> (f64, f64) {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;
    let mut max_dd_pct = 0.0_f64;

    for point in equity_curve {
        if point.capital > peak {
            peak = point.capital;
            continue;
        }
        let dd = peak - point.capital;
        if dd > max_dd {
            max_dd = dd;
        }
        if peak > 0.0 {
            max_dd_pct = max_dd_pct.max(dd / peak * 100.0);
        }
    }

    (max_dd, max_dd_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{close_trade, open_trade, EntryResult};
    use crate::domain::pattern::{Direction, Signal};
    use crate::domain::risk_profile::{RiskProfile, RiskProfileSpec};
    use crate::domain::trade::CloseReason;
    use crate::domain::candle::Candle;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn profile() -> RiskProfile {
        RiskProfile::new(RiskProfileSpec {
            name: "test".into(),
            confidence_threshold: 0.5,
            enabled_patterns: PatternKind::ALL.into_iter().collect(),
            max_trades_per_day: 10,
            max_position_size_fraction: 0.1,
            stop_loss_pct: 0.5,
            take_profit_pct: 0.5,
        })
        .unwrap()
    }

    /// Long trades entered at 100, each closed at the price that realizes the given pnl.
    fn ledger_with(pnls: &[(PatternKind, f64)]) -> PositionLedger {
        let mut ledger = PositionLedger::new(10_000.0);
        for (i, &(kind, pnl)) in pnls.iter().enumerate() {
            let hour = i as u32;
            let candle = Candle {
                timestamp: at(hour),
                open: 100.0,
                high: 100.0,
                low: 100.0,
                close: 100.0,
                volume: 1.0,
            };
            let signal = Signal {
                pattern_kind: kind,
                confidence: 0.75,
                direction: Direction::Buy,
                price: 100.0,
            };
            let id = match open_trade(&mut ledger, &signal, &profile(), &candle, "TEST") {
                EntryResult::Opened(id) => id,
                EntryResult::InsufficientCapital => panic!("expected entry"),
            };
            let quantity = ledger.trade(id).unwrap().quantity;
            let exit_price = 100.0 + pnl / quantity;
            close_trade(&mut ledger, id, exit_price, at(hour), CloseReason::TakeProfit).unwrap();
        }
        ledger
    }

    #[test]
    fn no_trades_marks_status_and_defaults() {
        let ledger = PositionLedger::new(100_000.0);
        let m = PerformanceMetrics::compute(&ledger);

        assert_eq!(m.status, MetricsStatus::NoTradesExecuted);
        assert!(!m.has_trades());
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.profit_factor, ProfitFactor::Undefined);
        assert_eq!(m.profit_factor.value(), None);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.avg_win, 0.0);
        assert_eq!(m.avg_loss, 0.0);
        assert_eq!(m.largest_win, 0.0);
        assert_eq!(m.largest_loss, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.roi_percentage, 0.0);
        assert!((m.final_capital - 100_000.0).abs() < f64::EPSILON);
        assert!(m.by_pattern.is_empty());
    }

    #[test]
    fn trade_stats_wins_losses_breakeven() {
        let ledger = ledger_with(&[
            (PatternKind::Hammer, 100.0),
            (PatternKind::Hammer, -50.0),
            (PatternKind::Hammer, 200.0),
            (PatternKind::Hammer, 0.0),
        ]);
        let m = PerformanceMetrics::compute(&ledger);

        assert_eq!(m.status, MetricsStatus::Completed);
        assert_eq!(m.total_trades, 4);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 1);
        assert_eq!(m.breakeven_trades, 1);
        assert!((m.win_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn profit_factor_finite() {
        let ledger = ledger_with(&[
            (PatternKind::Hammer, 100.0),
            (PatternKind::Hammer, -50.0),
            (PatternKind::Hammer, 200.0),
        ]);
        let m = PerformanceMetrics::compute(&ledger);
        match m.profit_factor {
            ProfitFactor::Finite(pf) => assert!((pf - 6.0).abs() < 1e-6),
            other => panic!("expected finite profit factor, got {other:?}"),
        }
    }

    #[test]
    fn profit_factor_infinite_without_losses() {
        let ledger = ledger_with(&[(PatternKind::Hammer, 100.0)]);
        let m = PerformanceMetrics::compute(&ledger);
        assert_eq!(m.profit_factor, ProfitFactor::Infinite);
        assert_eq!(m.profit_factor.value(), Some(f64::INFINITY));
    }

    #[test]
    fn profit_factor_zero_when_all_breakeven() {
        let ledger = ledger_with(&[(PatternKind::Hammer, 0.0), (PatternKind::Hammer, 0.0)]);
        let m = PerformanceMetrics::compute(&ledger);
        assert_eq!(m.profit_factor, ProfitFactor::Finite(0.0));
    }

    #[test]
    fn averages_and_extremes() {
        let ledger = ledger_with(&[
            (PatternKind::Hammer, 100.0),
            (PatternKind::Hammer, -60.0),
            (PatternKind::Hammer, 300.0),
            (PatternKind::Hammer, -150.0),
        ]);
        let m = PerformanceMetrics::compute(&ledger);

        assert!((m.avg_win - 200.0).abs() < 1e-6);
        assert!((m.avg_loss - (-105.0)).abs() < 1e-6);
        assert!((m.largest_win - 300.0).abs() < 1e-6);
        assert!((m.largest_loss - (-150.0)).abs() < 1e-6);
        assert!((m.total_profit - 400.0).abs() < 1e-6);
        assert!((m.total_loss - 210.0).abs() < 1e-6);
        assert!((m.net_profit - 190.0).abs() < 1e-6);
    }

    #[test]
    fn roi_and_capital() {
        let ledger = ledger_with(&[(PatternKind::Hammer, 500.0), (PatternKind::Hammer, 500.0)]);
        let m = PerformanceMetrics::compute(&ledger);

        assert!((m.final_capital - 11_000.0).abs() < 1e-6);
        assert!((m.roi_percentage - 10.0).abs() < 1e-6);
        assert!((m.peak_capital - 11_000.0).abs() < 1e-6);
    }

    #[test]
    fn drawdown_from_equity_curve() {
        // capital: 10000 -> 11000 -> 9000 -> 9500 -> 8800 -> 10000
        let ledger = ledger_with(&[
            (PatternKind::Hammer, 1_000.0),
            (PatternKind::Hammer, -2_000.0),
            (PatternKind::Hammer, 500.0),
            (PatternKind::Hammer, -700.0),
            (PatternKind::Hammer, 1_200.0),
        ]);
        let m = PerformanceMetrics::compute(&ledger);

        assert!((m.max_drawdown - 2_200.0).abs() < 1e-6);
        assert!((m.max_drawdown_pct - 20.0).abs() < 1e-6);
    }

    #[test]
    fn drawdown_below_initial_capital() {
        let ledger = ledger_with(&[(PatternKind::Hammer, -1_000.0)]);
        let m = PerformanceMetrics::compute(&ledger);
        assert!((m.max_drawdown - 1_000.0).abs() < 1e-6);
        assert!((m.max_drawdown_pct - 10.0).abs() < 1e-6);
    }

    #[test]
    fn per_pattern_breakdown() {
        let ledger = ledger_with(&[
            (PatternKind::ShootingStar, -40.0),
            (PatternKind::Hammer, 100.0),
            (PatternKind::Hammer, -20.0),
        ]);
        let m = PerformanceMetrics::compute(&ledger);

        assert_eq!(m.by_pattern.len(), 2);
        let hammer = &m.by_pattern[0];
        assert_eq!(hammer.pattern_kind, PatternKind::Hammer);
        assert_eq!(hammer.total_trades, 2);
        assert_eq!(hammer.winning_trades, 1);
        assert!((hammer.win_rate - 50.0).abs() < 1e-9);
        assert!((hammer.total_pnl - 80.0).abs() < 1e-6);

        let star = &m.by_pattern[1];
        assert_eq!(star.pattern_kind, PatternKind::ShootingStar);
        assert_eq!(star.winning_trades, 0);
        assert_eq!(star.win_rate, 0.0);
    }

    #[test]
    fn profit_factor_serializes_as_tagged_value() {
        let json = serde_json::to_string(&ProfitFactor::Finite(1.5)).unwrap();
        assert_eq!(json, r#"{"kind":"finite","value":1.5}"#);
        let json = serde_json::to_string(&ProfitFactor::Infinite).unwrap();
        assert_eq!(json, r#"{"kind":"infinite"}"#);
        let back: ProfitFactor = serde_json::from_str(r#"{"kind":"undefined"}"#).unwrap();
        assert_eq!(back, ProfitFactor::Undefined);
    }
}
