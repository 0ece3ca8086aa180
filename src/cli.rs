//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::event_sink::TracingSink;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{self, BacktestConfig, BacktestReport};
use crate::domain::batch;
use crate::domain::candle::Candle;
use crate::domain::config_validation::{
    build_backtest_config, build_risk_profile, validate_backtest_config, validate_profile_config,
    PROFILE_SECTION,
};
use crate::domain::error::CandleTraderError;
use crate::domain::risk_profile::{ProfilePreset, RiskProfile};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::CandleSource;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "candletrader", about = "Candlestick pattern backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one profile over a candle series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// CSV file, or a directory holding <SYMBOL>.csv
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved profile
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run every preset, plus the configured profile, over the same series
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Run profiles one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },
    /// List the built-in risk profiles
    Presets,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            symbol,
            output,
        } => run_backtest(&config, &data, symbol.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Compare {
            config,
            data,
            symbol,
            output,
            sequential,
        } => run_compare(&config, &data, symbol.as_deref(), output.as_deref(), !sequential),
        Command::Presets => {
            run_presets();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, CandleTraderError> {
    eprintln!("Loading config from {}", path.display());
    Ok(FileConfigAdapter::from_file(path)?)
}

/// Backtest parameters from the file, with the command-line symbol taking precedence.
pub fn resolve_backtest_config(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<BacktestConfig, CandleTraderError> {
    let mut bt_config = build_backtest_config(config)?;
    if let Some(symbol) = symbol_override {
        bt_config.symbol = symbol.to_string();
        bt_config.validate()?;
    }
    Ok(bt_config)
}

/// A directory is searched for `<SYMBOL>.csv`; a file is used as is.
pub fn load_candles(data: &Path, symbol: &str) -> Result<Vec<Candle>, CandleTraderError> {
    let source = if data.is_dir() {
        CsvAdapter::new(data.to_path_buf())
    } else {
        CsvAdapter::from_file(data.to_path_buf())
    };
    eprintln!("Loading candles for {} from {}", symbol, data.display());
    let candles = source.fetch_candles(symbol)?;
    eprintln!("  {} candles", candles.len());
    Ok(candles)
}

fn run_label(symbol: &str, profile: &RiskProfile) -> String {
    format!("{}/{}", symbol, profile.name())
}

fn run_backtest(
    config_path: &Path,
    data: &Path,
    symbol: Option<&str>,
    output: Option<&Path>,
) -> Result<(), CandleTraderError> {
    // Stage 1: config
    let adapter = load_config(config_path)?;
    let bt_config = resolve_backtest_config(&adapter, symbol)?;
    let profile = build_risk_profile(&adapter)?;
    eprintln!("Profile: {}", profile.name());

    // Stage 2: data
    let candles = load_candles(data, &bt_config.symbol)?;

    // Stage 3: run
    let sink = TracingSink::new(run_label(&bt_config.symbol, &profile));
    let report = backtest::run(bt_config, profile, &candles, sink)?;
    print_summary(&report);

    // Stage 4: report
    let reporter = JsonReportAdapter::new();
    match output {
        Some(path) => {
            reporter.write(&report, path)?;
            eprintln!("\nReport written to: {}", path.display());
        }
        None => println!("{}", reporter.render(&report)?),
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), CandleTraderError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_profile_config(&adapter)?;

    let bt_config = build_backtest_config(&adapter)?;
    let profile = build_risk_profile(&adapter)?;

    println!("[backtest]");
    println!("symbol = {}", bt_config.symbol);
    println!("initial_capital = {}", bt_config.initial_capital);
    println!();
    print_profile(&profile);

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_compare(
    config_path: &Path,
    data: &Path,
    symbol: Option<&str>,
    output: Option<&Path>,
    parallel: bool,
) -> Result<(), CandleTraderError> {
    let adapter = load_config(config_path)?;
    let bt_config = resolve_backtest_config(&adapter, symbol)?;

    let mut profiles: Vec<RiskProfile> =
        ProfilePreset::ALL.into_iter().map(RiskProfile::preset).collect();
    if adapter.has_section(PROFILE_SECTION) {
        let configured = build_risk_profile(&adapter)?;
        if !profiles.contains(&configured) {
            profiles.push(configured);
        }
    }

    let candles = load_candles(data, &bt_config.symbol)?;
    eprintln!(
        "Comparing {} profiles ({})",
        profiles.len(),
        if parallel { "parallel" } else { "sequential" }
    );

    let symbol = bt_config.symbol.clone();
    let reports = batch::run_profiles(&bt_config, &profiles, &candles, parallel, |profile| {
        TracingSink::new(run_label(&symbol, profile))
    })?;

    print_comparison(&reports);

    if let Some(path) = output {
        JsonReportAdapter::new().write_all(&reports, path)?;
        eprintln!("\nReports written to: {}", path.display());
    }
    Ok(())
}

fn run_presets() {
    println!(
        "{:<14} {:>10} {:<22} {:>7} {:>6} {:>6} {:>6}",
        "preset", "confidence", "patterns", "max/day", "size", "SL", "TP"
    );
    for preset in ProfilePreset::ALL {
        let profile = RiskProfile::preset(preset);
        println!(
            "{:<14} {:>10.2} {:<22} {:>7} {:>6.2} {:>6.2} {:>6.2}",
            preset.as_str(),
            profile.confidence_threshold(),
            pattern_list(&profile),
            profile.max_trades_per_day(),
            profile.max_position_size_fraction(),
            profile.stop_loss_pct(),
            profile.take_profit_pct(),
        );
    }
}

fn pattern_list(profile: &RiskProfile) -> String {
    profile
        .enabled_patterns()
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn print_profile(profile: &RiskProfile) {
    println!("[profile]");
    println!("name = {}", profile.name());
    println!("confidence_threshold = {}", profile.confidence_threshold());
    println!("enabled_patterns = {}", pattern_list(profile));
    println!("max_trades_per_day = {}", profile.max_trades_per_day());
    println!(
        "max_position_size_fraction = {}",
        profile.max_position_size_fraction()
    );
    println!("stop_loss_pct = {}", profile.stop_loss_pct());
    println!("take_profit_pct = {}", profile.take_profit_pct());
}

fn print_summary(report: &BacktestReport) {
    let m = &report.metrics;
    eprintln!("\n=== Results: {} / {} ===", report.symbol, report.profile.name());
    eprintln!(
        "Candles:          {} processed, {} skipped",
        report.candles_processed, report.candles_skipped
    );
    if !m.has_trades() {
        eprintln!("No trades executed.");
        return;
    }
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!(
        "Win / Loss / BE:  {} / {} / {}",
        m.winning_trades, m.losing_trades, m.breakeven_trades
    );
    eprintln!("Win Rate:         {:.1}%", m.win_rate);
    eprintln!("Net Profit:       {:.2}", m.net_profit);
    eprintln!("Profit Factor:    {}", m.profit_factor);
    eprintln!("Final Capital:    {:.2}", m.final_capital);
    eprintln!("ROI:              {:.2}%", m.roi_percentage);
    eprintln!(
        "Max Drawdown:     {:.2} ({:.1}%)",
        m.max_drawdown, m.max_drawdown_pct
    );

    if !m.by_pattern.is_empty() {
        eprintln!("\n=== Per-Pattern Summary ===");
        for pr in &m.by_pattern {
            let pnl_sign = if pr.total_pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} trades, {:.1}% win rate, {}{:.2}",
                pr.pattern_kind, pr.total_trades, pr.win_rate, pnl_sign, pr.total_pnl,
            );
        }
    }
}

fn print_comparison(reports: &[BacktestReport]) {
    println!(
        "{:<14} {:>7} {:>8} {:>12} {:>8} {:>9} {:>9}",
        "profile", "trades", "win%", "net", "pf", "roi%", "maxdd%"
    );
    for report in reports {
        let m = &report.metrics;
        println!(
            "{:<14} {:>7} {:>8.1} {:>12.2} {:>8} {:>9.2} {:>9.2}",
            report.profile.name(),
            m.total_trades,
            m.win_rate,
            m.net_profit,
            m.profit_factor.to_string(),
            m.roi_percentage,
            m.max_drawdown_pct,
        );
    }
}
