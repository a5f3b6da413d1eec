//! Optimization driver: independent backtests per candidate parameter set,
//! ranked by composite score.
//!
//! Runs share no mutable state, so they fan out across the rayon pool when
//! parallelism is enabled. Ranking never depends on completion order.

use rayon::prelude::*;

use super::backtest::{run_backtest, BacktestConfig, BacktestResult};
use super::error::TrendscoreError;
use super::ohlcv::Bar;
use super::strategy::ParameterSet;

/// One evaluated candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRow {
    /// Position of the candidate in the input collection.
    pub index: usize,
    pub params: ParameterSet,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub net_profit: f64,
    pub score: f64,
    pub total_trades: usize,
}

impl OptimizationRow {
    fn from_result(index: usize, result: &BacktestResult) -> Self {
        OptimizationRow {
            index,
            params: result.params.clone(),
            sharpe_ratio: result.metrics.sharpe_ratio,
            max_drawdown: result.metrics.max_drawdown,
            net_profit: result.metrics.net_profit,
            score: result.metrics.score,
            total_trades: result.metrics.total_trades,
        }
    }
}

/// A candidate as read from input: the parameter set, or why its row could
/// not be used.
pub type Candidate = Result<ParameterSet, TrendscoreError>;

/// A candidate whose run failed; excluded from ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRun {
    pub index: usize,
    /// `None` when the input row itself was unreadable.
    pub params: Option<ParameterSet>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptimizationReport {
    /// Sorted by score descending, ties by candidate index.
    pub rows: Vec<OptimizationRow>,
    pub failures: Vec<FailedRun>,
}

impl OptimizationReport {
    pub fn top(&self, k: usize) -> &[OptimizationRow] {
        &self.rows[..k.min(self.rows.len())]
    }

    pub fn best(&self) -> Option<&OptimizationRow> {
        self.rows.first()
    }

    pub fn evaluated(&self) -> usize {
        self.rows.len() + self.failures.len()
    }
}

pub struct Optimizer {
    config: BacktestConfig,
    parallel: bool,
}

impl Optimizer {
    pub fn new(config: BacktestConfig) -> Self {
        Optimizer {
            config,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, bars: &[Bar], candidates: &[ParameterSet]) -> OptimizationReport {
        let candidates: Vec<Candidate> = candidates.iter().cloned().map(Ok).collect();
        self.run_candidates(bars, &candidates)
    }

    /// Like [`Optimizer::run`], but unreadable rows are recorded as failures
    /// at their input index instead of being evaluated.
    pub fn run_candidates(&self, bars: &[Bar], candidates: &[Candidate]) -> OptimizationReport {
        let evaluate = |(index, candidate): (usize, &Candidate)| {
            let outcome = match candidate {
                Ok(params) => run_backtest(bars, params, &self.config).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            (index, outcome)
        };

        let outcomes: Vec<(usize, Result<BacktestResult, String>)> = if self.parallel {
            candidates.par_iter().enumerate().map(evaluate).collect()
        } else {
            candidates.iter().enumerate().map(evaluate).collect()
        };

        let mut report = OptimizationReport::default();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(result) => report.rows.push(OptimizationRow::from_result(index, &result)),
                Err(reason) => {
                    tracing::warn!(candidate = index, error = %reason, "parameter set failed");
                    report.failures.push(FailedRun {
                        index,
                        params: candidates[index].as_ref().ok().cloned(),
                        reason,
                    });
                }
            }
        }

        rank(&mut report.rows);
        tracing::info!(
            candidates = candidates.len(),
            ranked = report.rows.len(),
            failed = report.failures.len(),
            best_score = report.best().map(|r| r.score),
            "optimization complete"
        );
        report
    }
}

/// Score descending; `total_cmp` keeps any NaN score at a fixed position.
pub fn rank(rows: &mut [OptimizationRow]) {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
}
