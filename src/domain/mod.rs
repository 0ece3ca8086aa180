//! Core domain types and logic.

pub mod candle;
pub mod pattern;
pub mod risk_profile;
pub mod admission;
pub mod trade;
pub mod ledger;
pub mod execution;
pub mod metrics;
pub mod backtest;
pub mod batch;
pub mod config_validation;
pub mod error;
