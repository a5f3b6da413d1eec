#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use trendscore::domain::backtest::BacktestResult;
use trendscore::domain::error::TrendscoreError;
pub use trendscore::domain::ohlcv::Bar;
use trendscore::domain::optimize::{Candidate, OptimizationReport};
use trendscore::domain::strategy::ParameterSet;
use trendscore::ports::data_port::DataPort;
use trendscore::ports::report_port::ReportPort;

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Hourly bar with a ±0.5 range around the close.
pub fn make_bar(i: usize, close: f64, volume: f64) -> Bar {
    Bar {
        timestamp: start_time() + Duration::hours(i as i64),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume,
    }
}

pub fn bars_from(points: &[(f64, f64)]) -> Vec<Bar> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(close, volume))| make_bar(i, close, volume))
        .collect()
}

/// Deterministic oscillating series with periodic volume spikes.
pub fn wave_bars(count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.3).sin() * 6.0 + (t * 0.05).cos() * 4.0;
            let volume = if i % 7 == 0 { 400.0 } else { 100.0 + (i % 3) as f64 * 10.0 };
            make_bar(i, close, volume)
        })
        .collect()
}

/// Small lookbacks so hand-built scenarios warm up after three bars.
pub fn fast_params() -> ParameterSet {
    ParameterSet {
        ema_short_period: 2,
        ema_long_period: 3,
        rsi_period: 2,
        rsi_lower: 45.0,
        rsi_upper: 55.0,
        atr_period: 2,
        atr_multiplier: 1.5,
        min_profit: 0.5,
        max_loss: 2.0,
        volume_threshold: 1.2,
        volume_window: 3,
        rsi_exit: 50.0,
    }
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn bars_csv(bars: &[Bar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    /// `Err` entries stand for unreadable rows.
    pub parameter_rows: Vec<Result<ParameterSet, String>>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            parameter_rows: Vec::new(),
            error: None,
        }
    }

    /// Appends readable rows after any already added.
    pub fn with_parameter_sets(mut self, sets: Vec<ParameterSet>) -> Self {
        self.parameter_rows.extend(sets.into_iter().map(Ok));
        self
    }

    pub fn with_unreadable_row(mut self, reason: &str) -> Self {
        self.parameter_rows.push(Err(reason.to_string()));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_bars(&self) -> Result<Vec<Bar>, TrendscoreError> {
        if let Some(reason) = &self.error {
            return Err(TrendscoreError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.bars.clone())
    }

    fn load_parameter_sets(&self) -> Result<Vec<Candidate>, TrendscoreError> {
        Ok(self
            .parameter_rows
            .iter()
            .map(|row| row.clone().map_err(|reason| TrendscoreError::Data { reason }))
            .collect())
    }
}

/// Records what would have been written.
#[derive(Default)]
pub struct RecordingReportPort {
    pub backtests: RefCell<Vec<(usize, PathBuf)>>,
    pub optimizations: RefCell<Vec<(usize, usize, PathBuf)>>,
}

impl ReportPort for RecordingReportPort {
    fn write_backtest(&self, result: &BacktestResult, dir: &Path) -> Result<(), TrendscoreError> {
        self.backtests
            .borrow_mut()
            .push((result.trades.len(), dir.to_path_buf()));
        Ok(())
    }

    fn write_optimization(
        &self,
        report: &OptimizationReport,
        dir: &Path,
    ) -> Result<(), TrendscoreError> {
        self.optimizations.borrow_mut().push((
            report.rows.len(),
            report.failures.len(),
            dir.to_path_buf(),
        ));
        Ok(())
    }
}
