//! Report output port trait.

use std::path::Path;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::CandleTraderError;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), CandleTraderError>;

    /// Several runs over the same data, e.g. a profile comparison.
    fn write_all(
        &self,
        reports: &[BacktestReport],
        output_path: &Path,
    ) -> Result<(), CandleTraderError>;
}
