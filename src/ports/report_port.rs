//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendscoreError;
use crate::domain::optimize::OptimizationReport;

/// Port for writing result tables into an output directory.
pub trait ReportPort {
    fn write_backtest(&self, result: &BacktestResult, dir: &Path) -> Result<(), TrendscoreError>;

    fn write_optimization(
        &self,
        report: &OptimizationReport,
        dir: &Path,
    ) -> Result<(), TrendscoreError>;
}
