//! Backtest simulator: replays a bar sequence through a trading session and
//! derives performance metrics.
//!
//! BacktestConfig holds the run-level settings shared by every parameter set.

use super::error::TrendscoreError;
use super::metrics::Metrics;
use super::ohlcv::Bar;
use super::position::Trade;
use super::position_manager::EquityPoint;
use super::session::TradingSession;
use super::strategy::ParameterSet;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Annual rate; divided by `periods_per_year` per bar.
    pub risk_free_rate: f64,
    /// Bars per year used to annualise the Sharpe ratio.
    pub periods_per_year: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            risk_free_rate: 0.03,
            periods_per_year: 252.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub params: ParameterSet,
    pub initial_capital: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_balance: f64,
    pub metrics: Metrics,
}

/// Run one parameter set over the full bar history.
///
/// Deterministic: identical inputs always produce an identical result.
pub fn run_backtest(
    bars: &[Bar],
    params: &ParameterSet,
    config: &BacktestConfig,
) -> Result<BacktestResult, TrendscoreError> {
    let mut session = TradingSession::new(params.clone(), config.initial_capital)?;
    for bar in bars {
        session.on_bar(bar)?;
    }
    let ledger = session.finish()?;

    let metrics = Metrics::compute(
        &ledger.trades,
        &ledger.equity_curve,
        config.initial_capital,
        ledger.final_balance,
        config.risk_free_rate,
        config.periods_per_year,
    );

    tracing::debug!(
        bars = bars.len(),
        trades = metrics.total_trades,
        net_profit = metrics.net_profit,
        sharpe = metrics.sharpe_ratio,
        mdd = metrics.max_drawdown,
        score = metrics.score,
        "backtest complete"
    );

    Ok(BacktestResult {
        params: params.clone(),
        initial_capital: config.initial_capital,
        trades: ledger.trades,
        equity_curve: ledger.equity_curve,
        final_balance: ledger.final_balance,
        metrics,
    })
}
