//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    build_parameter_set, resolve_data_path, validate_backtest_config, validate_optimize_config,
};
use crate::domain::error::TrendscoreError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::ensure_chronological;
use crate::domain::optimize::{OptimizationReport, Optimizer};
use crate::domain::strategy::ParameterSet;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "trendscore",
    about = "EMA/RSI/ATR/volume trend strategy backtester and optimiser"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the [strategy] parameter set
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar CSV, overrides [backtest] data
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest every candidate parameter set and rank them
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        /// Candidate CSV, overrides [optimize] parameters
        #[arg(long)]
        parameters: Option<PathBuf>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Run candidates on the current thread only
        #[arg(long)]
        sequential: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // A second install (tests, embedding) is a no-op.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest(&config, data.as_deref(), output.as_deref()),
        Command::Optimize {
            config,
            data,
            parameters,
            top_k,
            sequential,
            output,
        } => run_optimize(
            &config,
            OptimizeOverrides {
                data,
                parameters,
                top_k,
                sequential,
                output,
            },
        ),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Command-line values that take precedence over the `[optimize]` section.
#[derive(Debug, Default)]
pub struct OptimizeOverrides {
    pub data: Option<PathBuf>,
    pub parameters: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub sequential: bool,
    pub output: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendscoreError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", defaults.risk_free_rate),
        periods_per_year: adapter.get_double(
            "backtest",
            "periods_per_year",
            defaults.periods_per_year,
        ),
    }
}

pub fn resolve_output_dir(override_dir: Option<&Path>, adapter: &dyn ConfigPort) -> PathBuf {
    override_dir.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("backtest", "output_dir")
                .unwrap_or_else(|| "result".to_string()),
        )
    })
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<&Path>,
    output_override: Option<&Path>,
) -> Result<(), TrendscoreError> {
    // Stage 1: Load and validate config
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;

    // Stage 2: Build parameters and run settings
    let params = build_parameter_set(&adapter)?;
    let bt_config = build_backtest_config(&adapter);
    let data_path = resolve_data_path(&adapter, data_override)?;
    let output_dir = resolve_output_dir(output_override, &adapter);

    // Stage 3: Run
    let data_port = CsvAdapter::new(data_path);
    let report_port = CsvReportAdapter::new();
    run_backtest_pipeline(&data_port, &report_port, &params, &bt_config, &output_dir)?;
    Ok(())
}

/// Load bars, simulate, print the summary and write the result tables.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    params: &ParameterSet,
    bt_config: &BacktestConfig,
    output_dir: &Path,
) -> Result<BacktestResult, TrendscoreError> {
    let bars = data_port.load_bars()?;
    ensure_chronological(&bars)?;
    if bars.is_empty() {
        return Err(TrendscoreError::InsufficientData {
            bars: 0,
            minimum: params.warmup_bars(),
        });
    }
    if bars.len() < params.warmup_bars() {
        tracing::warn!(
            bars = bars.len(),
            warmup = params.warmup_bars(),
            "history shorter than indicator warm-up, no trades possible"
        );
    }

    eprintln!(
        "Running backtest: {} bars, {} to {}",
        bars.len(),
        bars[0].timestamp,
        bars[bars.len() - 1].timestamp
    );
    let result = backtest_engine::run_backtest(&bars, params, bt_config)?;
    tracing::info!(
        trades = result.metrics.total_trades,
        score = result.metrics.score,
        "backtest finished"
    );

    print_summary(&result.metrics, result.final_balance);

    report_port.write_backtest(&result, output_dir)?;
    eprintln!("\nResults written to: {}", output_dir.display());
    Ok(result)
}

fn print_summary(metrics: &Metrics, final_balance: f64) {
    eprintln!("\n=== Results ===");
    eprintln!("Net Profit:       {:.2}", metrics.net_profit);
    eprintln!("Final Balance:    {:.2}", final_balance);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Max Drawdown:     {:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Score:            {:.3}", metrics.score);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!(
        "Exits:            {} max_loss, {} trend_reversal, {} trailing_stop, {} end_of_data",
        metrics.exits.max_loss,
        metrics.exits.trend_reversal,
        metrics.exits.trailing_stop,
        metrics.exits.end_of_data
    );
}

fn run_optimize(config_path: &Path, overrides: OptimizeOverrides) -> Result<(), TrendscoreError> {
    // Stage 1: Load and validate config
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_optimize_config(&adapter)?;

    // Stage 2: Resolve inputs
    let bt_config = build_backtest_config(&adapter);
    let data_path = resolve_data_path(&adapter, overrides.data.as_deref())?;
    let parameters_path = match overrides.parameters {
        Some(p) => p,
        None => adapter
            .get_string("optimize", "parameters")
            .map(PathBuf::from)
            .ok_or_else(|| TrendscoreError::ConfigMissing {
                section: "optimize".to_string(),
                key: "parameters".to_string(),
            })?,
    };
    let top_k = match overrides.top_k {
        Some(0) => {
            return Err(TrendscoreError::ConfigInvalid {
                section: "optimize".to_string(),
                key: "top_k".to_string(),
                reason: "top_k must be at least 1".to_string(),
            })
        }
        Some(k) => k,
        None => adapter.get_int("optimize", "top_k", 10).max(1) as usize,
    };
    let parallel = !overrides.sequential && adapter.get_bool("optimize", "parallel", true);
    let output_dir = resolve_output_dir(overrides.output.as_deref(), &adapter);

    // Stage 3: Run
    let data_port = CsvAdapter::new(data_path).with_parameters(parameters_path);
    let report_port = CsvReportAdapter::new();
    run_optimize_pipeline(
        &data_port,
        &report_port,
        &bt_config,
        parallel,
        top_k,
        &output_dir,
    )?;
    Ok(())
}

/// Load bars and candidates, rank every candidate and write the tables.
pub fn run_optimize_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    bt_config: &BacktestConfig,
    parallel: bool,
    top_k: usize,
    output_dir: &Path,
) -> Result<OptimizationReport, TrendscoreError> {
    let bars = data_port.load_bars()?;
    ensure_chronological(&bars)?;
    if bars.is_empty() {
        return Err(TrendscoreError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }
    let candidates = data_port.load_parameter_sets()?;
    if candidates.is_empty() {
        return Err(TrendscoreError::Data {
            reason: "no candidate parameter sets".to_string(),
        });
    }

    eprintln!(
        "Optimizing: {} candidates over {} bars ({})",
        candidates.len(),
        bars.len(),
        if parallel { "parallel" } else { "sequential" }
    );
    let report = Optimizer::new(bt_config.clone())
        .with_parallelism(parallel)
        .run_candidates(&bars, &candidates);

    eprintln!(
        "Evaluated {} of {} candidates, {} failed",
        report.evaluated(),
        candidates.len(),
        report.failures.len()
    );
    eprintln!("\n=== Top {} ===", top_k.min(report.rows.len()));
    eprintln!(
        "{:>4}  {:>5}  {:>8}  {:>8}  {:>10}  {:>8}  {:>6}",
        "rank", "index", "score", "sharpe", "net_profit", "mdd", "trades"
    );
    for (i, row) in report.top(top_k).iter().enumerate() {
        eprintln!(
            "{:>4}  {:>5}  {:>8.3}  {:>8.3}  {:>10.2}  {:>7.1}%  {:>6}",
            i + 1,
            row.index,
            row.score,
            row.sharpe_ratio,
            row.net_profit,
            row.max_drawdown * 100.0,
            row.total_trades
        );
    }
    if !report.failures.is_empty() {
        eprintln!("\n{} candidate(s) failed:", report.failures.len());
        for failure in &report.failures {
            eprintln!("  #{}: {}", failure.index, failure.reason);
        }
    }

    report_port.write_optimization(&report, output_dir)?;
    eprintln!("\nResults written to: {}", output_dir.display());
    Ok(report)
}

pub fn run_validate(config_path: &Path) -> Result<(), TrendscoreError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_optimize_config(&adapter)?;
    let data_path = resolve_data_path(&adapter, None)?;
    let params = build_parameter_set(&adapter)?;
    let bt_config = build_backtest_config(&adapter);

    eprintln!("\nBacktest:");
    eprintln!("  data:             {}", data_path.display());
    eprintln!("  initial_capital:  {}", bt_config.initial_capital);
    eprintln!("  risk_free_rate:   {}", bt_config.risk_free_rate);
    eprintln!("  periods_per_year: {}", bt_config.periods_per_year);

    eprintln!("\nStrategy:");
    eprintln!(
        "  EMA {}/{}, RSI {} [{}, {}] exit {}",
        params.ema_short_period,
        params.ema_long_period,
        params.rsi_period,
        params.rsi_lower,
        params.rsi_upper,
        params.rsi_exit
    );
    eprintln!(
        "  ATR {} x{}, min_profit {}, max_loss {}",
        params.atr_period, params.atr_multiplier, params.min_profit, params.max_loss
    );
    eprintln!(
        "  volume > {} x mean({})",
        params.volume_threshold, params.volume_window
    );
    eprintln!("  warm-up: {} bars", params.warmup_bars());

    eprintln!("\nConfiguration is valid.");
    Ok(())
}
