//! Command-line interface: argument definitions and command execution.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::trace_adapter::{NullTraceAdapter, StderrTraceAdapter};
use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::{
    breakout_trigger, engine_kind, merge_mode, parse_float_list, parse_merge_list,
    parse_trigger_list, parse_usize_list, strategy_kind, validate_backtest_config,
    validate_data_config, validate_grid_config, validate_strategy_config,
};
use crate::domain::error::GaptraderError;
use crate::domain::evaluator::Evaluator;
use crate::domain::evaluator::grid::{GapParamGrid, RsiParamGrid};
use crate::domain::strategy::gap::{GapParams, GapStrategy};
use crate::domain::strategy::random::{DEFAULT_SEED, RandomStrategy};
use crate::domain::strategy::rsi::{RsiParams, RsiStrategy};
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::trace_port::TracePort;

#[derive(Parser, Debug)]
#[command(name = "gaptrader", about = "Gap-pattern strategy backtesting and tuning")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configured strategy over one price series
    Backtest {
        /// Path to the INI configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured broker directory
        #[arg(long)]
        broker: Option<String>,
        /// Override the configured instrument symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Override the configured period, e.g. 1D or 60
        #[arg(long)]
        period: Option<String>,
        /// Write the per-bar signal table to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print per-bar trace events to stderr
        #[arg(long)]
        trace: bool,
    },
    /// Search a parameter grid and rank the results by profit
    Evaluate {
        /// Path to the INI configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured broker directory
        #[arg(long)]
        broker: Option<String>,
        /// Override the configured instrument symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Override the configured period, e.g. 1D or 60
        #[arg(long)]
        period: Option<String>,
        /// Write the ranked results to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep this many results instead of the configured top_n
        #[arg(long)]
        top_n: Option<usize>,
        /// Print per-bar trace events to stderr
        #[arg(long)]
        trace: bool,
    },
    /// List the instrument series cached for a broker
    ListSymbols {
        /// Path to the INI configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Broker directory to scan instead of the configured one
        #[arg(long)]
        broker: Option<String>,
    },
    /// Check a configuration file without running anything
    Validate {
        /// Path to the INI configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            broker,
            symbol,
            period,
            output,
            trace,
        } => run_backtest(
            &config,
            broker.as_deref(),
            symbol.as_deref(),
            period.as_deref(),
            output.as_deref(),
            trace,
        ),
        Command::Evaluate {
            config,
            broker,
            symbol,
            period,
            output,
            top_n,
            trace,
        } => run_evaluate(
            &config,
            broker.as_deref(),
            symbol.as_deref(),
            period.as_deref(),
            output.as_deref(),
            top_n,
            trace,
        ),
        Command::ListSymbols { config, broker } => run_list_symbols(&config, broker.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn run_backtest(
    config_path: &Path,
    broker: Option<&str>,
    symbol: Option<&str>,
    period: Option<&str>,
    output: Option<&Path>,
    trace_enabled: bool,
) -> ExitCode {
    // Stage 1: Load and validate configuration
    eprintln!("Loading configuration from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(adapter) => adapter,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_strategy_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_backtest_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Load the price series
    let (broker, symbol, period) = resolve_series(&config, broker, symbol, period);
    let data = data_adapter(&config);
    let bars = match data.fetch_series(&broker, &symbol, &period) {
        Ok(bars) => bars,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if bars.is_empty() {
        let e = GaptraderError::NoData {
            broker,
            symbol,
            period,
        };
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Loaded {} bars for {}/{} ({})", bars.len(), broker, symbol, period);

    // Stage 3: Generate signals and simulate fills
    let strategy = match build_strategy(&config) {
        Ok(strategy) => strategy,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Running {} strategy", strategy.name());
    let trace: &dyn TracePort = if trace_enabled {
        &StderrTraceAdapter
    } else {
        &NullTraceAdapter
    };
    let signals = match strategy.generate_signals(&bars, trace) {
        Ok(signals) => signals,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let performance = match strategy.backtest().run(&signals, &bars, trace) {
        Ok(performance) => performance,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Report
    eprintln!();
    eprintln!("=== Performance ===");
    eprintln!("Total trades:  {}", performance.total_trades);
    eprintln!("Buy signals:   {}", performance.buy_signals);
    eprintln!("Sell signals:  {}", performance.sell_signals);
    eprintln!("Hold signals:  {}", performance.hold_signals);
    eprintln!("Final value:   {:.2}", performance.final_value);
    eprintln!("Total profit:  {:.2}", performance.total_profit);

    let signals_path = output
        .map(|path| path.display().to_string())
        .or_else(|| config.get_string("report", "signals_path"));
    if let Some(path) = signals_path {
        if let Err(e) = CsvReportAdapter.write_signals(&signals, &path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Signals written to {path}");
    }
    ExitCode::SUCCESS
}

fn run_evaluate(
    config_path: &Path,
    broker: Option<&str>,
    symbol: Option<&str>,
    period: Option<&str>,
    output: Option<&Path>,
    top_n_override: Option<usize>,
    trace_enabled: bool,
) -> ExitCode {
    // Stage 1: Load and validate configuration
    eprintln!("Loading configuration from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(adapter) => adapter,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_strategy_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_backtest_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_grid_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Load the price series once for every combination
    let (broker, symbol, period) = resolve_series(&config, broker, symbol, period);
    let data = data_adapter(&config);
    let evaluator = match Evaluator::new(&data, &broker, &symbol, &period) {
        Ok(evaluator) => evaluator,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Loaded {} bars for {}/{} ({})",
        evaluator.bars().len(),
        broker,
        symbol,
        period
    );

    // Stage 3: Expand the grid and score every combination
    let engine = match engine_kind(&config) {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let backtest_config = build_backtest_config(&config);
    let top_n = top_n_override.unwrap_or_else(|| config.get_int("grid", "top_n", 10) as usize);
    let trace: &dyn TracePort = if trace_enabled {
        &StderrTraceAdapter
    } else {
        &NullTraceAdapter
    };
    let kind = match strategy_kind(&config) {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let outcome = match kind {
        StrategyKind::Gap => {
            let grid = match build_gap_grid(&config) {
                Ok(grid) => grid,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            let combos = grid.combinations();
            eprintln!("Evaluating {} gap parameter combinations", combos.len());
            evaluator.grid_search(
                &combos,
                &|params: &GapParams| -> Result<Box<dyn Strategy>, GaptraderError> {
                    Ok(Box::new(GapStrategy::new(
                        params.clone(),
                        engine.build(backtest_config.clone()),
                    )?))
                },
                top_n,
                trace,
            )
        }
        StrategyKind::Rsi => {
            let grid = match build_rsi_grid(&config) {
                Ok(grid) => grid,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            let combos = grid.combinations();
            eprintln!("Evaluating {} RSI parameter combinations", combos.len());
            evaluator.grid_search(
                &combos,
                &|params: &RsiParams| -> Result<Box<dyn Strategy>, GaptraderError> {
                    Ok(Box::new(RsiStrategy::new(
                        params.clone(),
                        engine.build(backtest_config.clone()),
                    )?))
                },
                top_n,
                trace,
            )
        }
        StrategyKind::Random => {
            let e = GaptraderError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "kind".to_string(),
                reason: "the random strategy has no parameter grid to search".to_string(),
            };
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Report the survivors
    eprintln!(
        "Evaluated {} combinations, {} failed",
        outcome.evaluated, outcome.failed
    );
    if outcome.top.is_empty() {
        let e = GaptraderError::Report {
            reason: "no combination produced a usable result".to_string(),
        };
        eprintln!("error: {e}");
        return (&e).into();
    }
    for (rank, record) in outcome.top.iter().enumerate() {
        println!("{}. profit={:.4} {}", rank + 1, record.profit, record.parameters);
    }

    let results_path = output
        .map(|path| path.display().to_string())
        .or_else(|| config.get_string("report", "results_path"));
    match results_path {
        Some(path) => {
            if let Err(e) = CsvReportAdapter.write_evaluations(&outcome.top, &path) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            eprintln!("Results written to {path}");
        }
        None => eprintln!("No results path configured, skipping CSV output"),
    }
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path, broker: Option<&str>) -> ExitCode {
    // Stage 1: Load configuration
    eprintln!("Loading configuration from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(adapter) => adapter,
        Err(code) => return code,
    };

    // Stage 2: Scan the broker directory
    let broker = match broker
        .map(str::to_string)
        .or_else(|| config.get_string("data", "broker"))
    {
        Some(broker) => broker,
        None => {
            let e = GaptraderError::ConfigMissing {
                section: "data".to_string(),
                key: "broker".to_string(),
            };
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let data = data_adapter(&config);
    let series = match data.list_symbols(&broker) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Print one series per line
    for name in &series {
        println!("{name}");
    }
    eprintln!("{} series cached for {}", series.len(), broker);
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating configuration from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(adapter) => adapter,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_strategy_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_backtest_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_grid_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}

/// Loads the INI file at `path`, reporting any failure on stderr.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    match FileConfigAdapter::from_file(path) {
        Ok(adapter) => Ok(adapter),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

/// Builds the strategy the `[strategy]` section selects, wired to the
/// configured simulation engine.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, GaptraderError> {
    let engine = engine_kind(config)?.build(build_backtest_config(config));
    match strategy_kind(config)? {
        StrategyKind::Gap => Ok(Box::new(GapStrategy::new(build_gap_params(config)?, engine)?)),
        StrategyKind::Rsi => Ok(Box::new(RsiStrategy::new(build_rsi_params(config), engine)?)),
        StrategyKind::Random => {
            let seed = config.get_int("strategy", "seed", DEFAULT_SEED as i64) as u64;
            Ok(Box::new(RandomStrategy::new(seed, engine)))
        }
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> BacktestConfig {
    BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", 1_000.0),
        trade_percentage: config.get_double("backtest", "trade_percentage", 0.02),
        fee: config.get_double("backtest", "fee", 0.0),
    }
}

pub fn build_gap_params(config: &dyn ConfigPort) -> Result<GapParams, GaptraderError> {
    let base = GapParams::default();
    Ok(GapParams {
        merge: merge_mode(config)?,
        retention_period: config.get_int(
            "strategy",
            "retention_period",
            base.retention_period as i64,
        ) as usize,
        min_gap_pct: config.get_double("strategy", "min_gap_pct", base.min_gap_pct),
        min_rank: config.get_int("strategy", "min_rank", i64::from(base.min_rank)) as u32,
        breakout_trigger: breakout_trigger(config)?,
        stop_loss_pct: config.get_double("strategy", "stop_loss", base.stop_loss_pct),
        take_profit_pct: config.get_double("strategy", "take_profit", base.take_profit_pct),
    })
}

pub fn build_rsi_params(config: &dyn ConfigPort) -> RsiParams {
    let base = RsiParams::default();
    RsiParams {
        window: config.get_int("strategy", "rsi_window", base.window as i64) as usize,
        overbought: config.get_double("strategy", "rsi_overbought", base.overbought),
        oversold: config.get_double("strategy", "rsi_oversold", base.oversold),
        stop_loss_pct: config.get_double("strategy", "stop_loss", base.stop_loss_pct),
        take_profit_pct: config.get_double("strategy", "take_profit", base.take_profit_pct),
    }
}

/// Builds the gap grid from `[grid]`. Dimensions absent from that section
/// stay pinned to the `[strategy]` value.
pub fn build_gap_grid(config: &dyn ConfigPort) -> Result<GapParamGrid, GaptraderError> {
    let base = build_gap_params(config)?;
    let mut grid = GapParamGrid {
        stop_loss: vec![base.stop_loss_pct],
        take_profit: vec![base.take_profit_pct],
        retention_period: vec![base.retention_period],
        min_gap_pct: vec![base.min_gap_pct],
        merge: vec![base.merge],
        min_rank: vec![base.min_rank],
        breakout_trigger: vec![base.breakout_trigger],
    };
    if let Some(raw) = config.get_string("grid", "stop_loss") {
        grid.stop_loss = parse_float_list(&raw).ok_or_else(|| bad_grid_list("stop_loss", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "take_profit") {
        grid.take_profit =
            parse_float_list(&raw).ok_or_else(|| bad_grid_list("take_profit", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "retention_period") {
        grid.retention_period =
            parse_usize_list(&raw).ok_or_else(|| bad_grid_list("retention_period", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "min_gap_pct") {
        grid.min_gap_pct =
            parse_float_list(&raw).ok_or_else(|| bad_grid_list("min_gap_pct", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "merge") {
        grid.merge = parse_merge_list(&raw).ok_or_else(|| bad_grid_list("merge", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "min_rank") {
        grid.min_rank = parse_usize_list(&raw)
            .map(|list| list.into_iter().map(|rank| rank as u32).collect())
            .ok_or_else(|| bad_grid_list("min_rank", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "breakout_trigger") {
        grid.breakout_trigger =
            parse_trigger_list(&raw).ok_or_else(|| bad_grid_list("breakout_trigger", &raw))?;
    }
    Ok(grid)
}

/// Builds the RSI grid from `[grid]`. Dimensions absent from that section
/// stay pinned to the `[strategy]` value.
pub fn build_rsi_grid(config: &dyn ConfigPort) -> Result<RsiParamGrid, GaptraderError> {
    let base = build_rsi_params(config);
    let mut grid = RsiParamGrid {
        stop_loss: vec![base.stop_loss_pct],
        take_profit: vec![base.take_profit_pct],
        window: vec![base.window],
        overbought: vec![base.overbought],
        oversold: vec![base.oversold],
    };
    if let Some(raw) = config.get_string("grid", "stop_loss") {
        grid.stop_loss = parse_float_list(&raw).ok_or_else(|| bad_grid_list("stop_loss", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "take_profit") {
        grid.take_profit =
            parse_float_list(&raw).ok_or_else(|| bad_grid_list("take_profit", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "rsi_window") {
        grid.window = parse_usize_list(&raw).ok_or_else(|| bad_grid_list("rsi_window", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "rsi_overbought") {
        grid.overbought =
            parse_float_list(&raw).ok_or_else(|| bad_grid_list("rsi_overbought", &raw))?;
    }
    if let Some(raw) = config.get_string("grid", "rsi_oversold") {
        grid.oversold =
            parse_float_list(&raw).ok_or_else(|| bad_grid_list("rsi_oversold", &raw))?;
    }
    Ok(grid)
}

fn bad_grid_list(key: &str, raw: &str) -> GaptraderError {
    GaptraderError::ConfigInvalid {
        section: "grid".to_string(),
        key: key.to_string(),
        reason: format!("cannot parse list '{}'", raw),
    }
}

fn data_adapter(config: &dyn ConfigPort) -> CsvDataAdapter {
    let base_path = config
        .get_string("data", "base_path")
        .unwrap_or_else(|| "data".to_string());
    CsvDataAdapter::new(PathBuf::from(base_path))
}

fn resolve_series(
    config: &dyn ConfigPort,
    broker: Option<&str>,
    symbol: Option<&str>,
    period: Option<&str>,
) -> (String, String, String) {
    let broker = broker
        .map(str::to_string)
        .or_else(|| config.get_string("data", "broker"))
        .unwrap_or_default();
    let symbol = symbol
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .unwrap_or_default();
    let period = period
        .map(str::to_string)
        .or_else(|| config.get_string("data", "period"))
        .unwrap_or_default();
    (broker, symbol, period)
}
