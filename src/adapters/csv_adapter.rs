//! CSV file candle source.
//!
//! Expects a header row `timestamp,open,high,low,close,volume`.

use crate::domain::candle::Candle;
use crate::domain::error::CandleTraderError;
use crate::ports::data_port::CandleSource;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

enum Layout {
    /// `<base>/<SYMBOL>.csv`
    Directory(PathBuf),
    /// One file serving every symbol.
    File(PathBuf),
}

pub struct CsvAdapter {
    layout: Layout,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            layout: Layout::Directory(base_path),
        }
    }

    pub fn from_file(path: PathBuf) -> Self {
        Self {
            layout: Layout::File(path),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        match &self.layout {
            Layout::Directory(base) => base.join(format!("{}.csv", symbol)),
            Layout::File(path) => path.clone(),
        }
    }
}

fn data_error(reason: impl Into<String>) -> CandleTraderError {
    CandleTraderError::DataSource {
        reason: reason.into(),
    }
}

/// Parse `2024-01-15 09:30:00`, `2024-01-15T09:30:00`, or a bare date (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn price_field(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<f64, CandleTraderError> {
    let raw = record
        .get(index)
        .ok_or_else(|| data_error(format!("line {line}: missing {name} column")))?;
    raw.trim()
        .parse()
        .map_err(|e| data_error(format!("line {line}: invalid {name} value '{raw}': {e}")))
}

/// Read candles from any CSV source, keeping row order.
pub fn read_candles<R: Read>(reader: R) -> Result<Vec<Candle>, CandleTraderError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut candles = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_ts = record
            .get(0)
            .ok_or_else(|| data_error(format!("line {line}: missing timestamp column")))?;
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| data_error(format!("line {line}: invalid timestamp '{raw_ts}'")))?;

        candles.push(Candle {
            timestamp,
            open: price_field(&record, 1, "open", line)?,
            high: price_field(&record, 2, "high", line)?,
            low: price_field(&record, 3, "low", line)?,
            close: price_field(&record, 4, "close", line)?,
            volume: price_field(&record, 5, "volume", line)?,
        });
    }

    Ok(candles)
}

pub fn read_candles_from_path(path: &Path) -> Result<Vec<Candle>, CandleTraderError> {
    let content = fs::read_to_string(path)
        .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;
    read_candles(content.as_bytes())
}

impl CandleSource for CsvAdapter {
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, CandleTraderError> {
        read_candles_from_path(&self.csv_path(symbol))
    }

    fn list_symbols(&self) -> Result<Vec<String>, CandleTraderError> {
        let base = match &self.layout {
            Layout::Directory(base) => base,
            Layout::File(path) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .ok_or_else(|| data_error(format!("no file name in {}", path.display())))?;
                return Ok(vec![stem]);
            }
        };

        let entries = fs::read_dir(base).map_err(|e| {
            data_error(format!("failed to read directory {}: {}", base.display(), e))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
