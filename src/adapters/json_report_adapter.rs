//! JSON report adapter implementing ReportPort.
//!
//! Floats are written with `float_roundtrip`, so a report read back compares
//! equal to the one written.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::CandleTraderError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter;

fn report_error(reason: impl Into<String>) -> CandleTraderError {
    CandleTraderError::Report {
        reason: reason.into(),
    }
}

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CandleTraderError> {
        serde_json::to_string_pretty(value)
            .map_err(|e| report_error(format!("failed to serialize report: {}", e)))
    }

    pub fn read(&self, path: &Path) -> Result<BacktestReport, CandleTraderError> {
        read_json(path)
    }

    pub fn read_all(&self, path: &Path) -> Result<Vec<BacktestReport>, CandleTraderError> {
        read_json(path)
    }

    fn write_value<T: Serialize + ?Sized>(
        &self,
        value: &T,
        output_path: &Path,
    ) -> Result<(), CandleTraderError> {
        let json = self.render(value)?;
        fs::write(output_path, json).map_err(|e| {
            report_error(format!("failed to write {}: {}", output_path.display(), e))
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CandleTraderError> {
    let content = fs::read_to_string(path)
        .map_err(|e| report_error(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| report_error(format!("invalid report {}: {}", path.display(), e)))
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), CandleTraderError> {
        self.write_value(report, output_path)
    }

    fn write_all(
        &self,
        reports: &[BacktestReport],
        output_path: &Path,
    ) -> Result<(), CandleTraderError> {
        self.write_value(reports, output_path)
    }
}
