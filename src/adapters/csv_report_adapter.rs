//! Flat CSV result tables.
//!
//! Backtest: `trades.csv`, `equity.csv`, `summary.csv`.
//! Optimization: `optimization.csv` (every evaluated set, ranked) and
//! `optimization_failures.csv`.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendscoreError;
use crate::domain::optimize::{OptimizationReport, OptimizationRow};
use crate::ports::report_port::ReportPort;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Serialize)]
struct TradeRecord {
    side: String,
    entry_time: String,
    entry_price: f64,
    exit_time: String,
    exit_price: f64,
    pnl: f64,
    exit_reason: String,
}

#[derive(Serialize)]
struct EquityRecord {
    timestamp: String,
    balance: f64,
}

#[derive(Serialize)]
struct SummaryRecord {
    sharpe_ratio: f64,
    max_drawdown: f64,
    net_profit: f64,
    score: f64,
    total_return: f64,
    trades: usize,
    win_rate: f64,
    profit_factor: f64,
    final_balance: f64,
}

#[derive(Serialize)]
struct OptimizationRecord {
    rank: usize,
    ema_short_period: usize,
    ema_long_period: usize,
    rsi_period: usize,
    rsi_lower: f64,
    rsi_upper: f64,
    atr_period: usize,
    atr_multiplier: f64,
    min_profit: f64,
    max_loss: f64,
    volume_threshold: f64,
    volume_window: usize,
    rsi_exit: f64,
    sharpe_ratio: f64,
    max_drawdown: f64,
    net_profit: f64,
    score: f64,
    trades: usize,
}

impl OptimizationRecord {
    fn new(rank: usize, row: &OptimizationRow) -> Self {
        let p = &row.params;
        OptimizationRecord {
            rank,
            ema_short_period: p.ema_short_period,
            ema_long_period: p.ema_long_period,
            rsi_period: p.rsi_period,
            rsi_lower: p.rsi_lower,
            rsi_upper: p.rsi_upper,
            atr_period: p.atr_period,
            atr_multiplier: p.atr_multiplier,
            min_profit: p.min_profit,
            max_loss: p.max_loss,
            volume_threshold: p.volume_threshold,
            volume_window: p.volume_window,
            rsi_exit: p.rsi_exit,
            sharpe_ratio: row.sharpe_ratio,
            max_drawdown: row.max_drawdown,
            net_profit: row.net_profit,
            score: row.score,
            trades: row.total_trades,
        }
    }
}

#[derive(Serialize)]
struct FailureRecord<'a> {
    index: usize,
    reason: &'a str,
}

/// Writes result tables as CSV files into a directory.
#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_table<T: Serialize>(
        dir: &Path,
        name: &str,
        records: impl IntoIterator<Item = T>,
    ) -> Result<(), TrendscoreError> {
        let path = dir.join(name);
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| TrendscoreError::Report {
            reason: format!("failed to create {}: {}", path.display(), e),
        })?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        tracing::debug!(path = %path.display(), "wrote table");
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(&self, result: &BacktestResult, dir: &Path) -> Result<(), TrendscoreError> {
        fs::create_dir_all(dir)?;

        Self::write_table(
            dir,
            "trades.csv",
            result.trades.iter().map(|t| TradeRecord {
                side: t.side.to_string(),
                entry_time: format_ts(t.entry_time),
                entry_price: t.entry_price,
                exit_time: format_ts(t.exit_time),
                exit_price: t.exit_price,
                pnl: t.pnl,
                exit_reason: t.exit_reason.to_string(),
            }),
        )?;

        Self::write_table(
            dir,
            "equity.csv",
            result.equity_curve.iter().map(|p| EquityRecord {
                timestamp: format_ts(p.timestamp),
                balance: p.balance,
            }),
        )?;

        let m = &result.metrics;
        Self::write_table(
            dir,
            "summary.csv",
            [SummaryRecord {
                sharpe_ratio: m.sharpe_ratio,
                max_drawdown: m.max_drawdown,
                net_profit: m.net_profit,
                score: m.score,
                total_return: m.total_return,
                trades: m.total_trades,
                win_rate: m.win_rate,
                profit_factor: m.profit_factor,
                final_balance: result.final_balance,
            }],
        )
    }

    fn write_optimization(
        &self,
        report: &OptimizationReport,
        dir: &Path,
    ) -> Result<(), TrendscoreError> {
        fs::create_dir_all(dir)?;

        Self::write_table(
            dir,
            "optimization.csv",
            report
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| OptimizationRecord::new(i + 1, row)),
        )?;

        Self::write_table(
            dir,
            "optimization_failures.csv",
            report.failures.iter().map(|f| FailureRecord {
                index: f.index,
                reason: &f.reason,
            }),
        )
    }
}
