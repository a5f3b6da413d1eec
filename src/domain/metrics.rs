//! Performance metrics: Sharpe ratio, maximum drawdown, net profit and the
//! composite ranking score, plus trade statistics.

use super::position::{ExitReason, Trade};
use super::position_manager::EquityPoint;

/// Weight of |MDD| subtracted from Sharpe in the composite score.
pub const DRAWDOWN_PENALTY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitCounts {
    pub max_loss: usize,
    pub trend_reversal: usize,
    pub trailing_stop: usize,
    pub end_of_data: usize,
}

impl ExitCounts {
    fn record(&mut self, reason: ExitReason) {
        match reason {
            ExitReason::MaxLoss => self.max_loss += 1,
            ExitReason::TrendReversal => self.trend_reversal += 1,
            ExitReason::TrailingStop => self.trailing_stop += 1,
            ExitReason::EndOfData => self.end_of_data += 1,
        }
    }

    /// Exits fired by the strategy's own triggers.
    pub fn strategy_exits(&self) -> usize {
        self.max_loss + self.trend_reversal + self.trailing_stop
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub net_profit: f64,
    pub score: f64,
    pub total_return: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_trade_pnl: f64,
    pub exits: ExitCounts,
}

impl Metrics {
    pub fn compute(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        final_balance: f64,
        risk_free_rate: f64,
        periods_per_year: f64,
    ) -> Self {
        let balances: Vec<f64> = equity_curve.iter().map(|p| p.balance).collect();

        let sharpe_ratio = sharpe_ratio(&balances, risk_free_rate, periods_per_year);
        let max_drawdown = max_drawdown(&balances);
        let net_profit = final_balance - initial_capital;
        let total_return = if initial_capital > 0.0 {
            net_profit / initial_capital
        } else {
            0.0
        };

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut exits = ExitCounts::default();

        for trade in trades {
            if trade.pnl > 0.0 {
                trades_won += 1;
                total_wins += trade.pnl;
            } else if trade.pnl < 0.0 {
                trades_lost += 1;
                total_losses += trade.pnl.abs();
            }
            exits.record(trade.exit_reason);
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_trade_pnl = if total_trades > 0 {
            trades.iter().map(|t| t.pnl).sum::<f64>() / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            sharpe_ratio,
            max_drawdown,
            net_profit,
            score: composite_score(sharpe_ratio, max_drawdown),
            total_return,
            total_trades,
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            avg_trade_pnl,
            exits,
        }
    }
}

/// Sharpe - DRAWDOWN_PENALTY * |MDD|.
pub fn composite_score(sharpe_ratio: f64, max_drawdown: f64) -> f64 {
    sharpe_ratio - DRAWDOWN_PENALTY * max_drawdown.abs()
}

/// Annualised Sharpe ratio of per-bar simple returns in excess of the
/// per-period risk-free rate, using the sample standard deviation.
///
/// Returns 0.0 for fewer than two points, non-finite balances, or a
/// zero-variance return series. A return from a non-positive balance counts
/// as 0.0.
pub fn sharpe_ratio(balances: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if balances.len() < 2 || balances.iter().any(|b| !b.is_finite()) {
        return 0.0;
    }

    let returns: Vec<f64> = balances
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    // A constant shift leaves the deviation unchanged, so measure it on the
    // raw returns: a flat curve then yields exactly zero.
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        let excess_mean = mean - risk_free_rate / periods_per_year;
        excess_mean / stddev * periods_per_year.sqrt()
    } else {
        0.0
    }
}

/// Most negative (equity - running peak) / running peak, as a fraction ≤ 0.
pub fn max_drawdown(balances: &[f64]) -> f64 {
    if balances.iter().any(|b| !b.is_finite()) {
        return 0.0;
    }

    let mut peak = f64::NEG_INFINITY;
    let mut mdd = 0.0_f64;
    for &balance in balances {
        peak = peak.max(balance);
        if peak > 0.0 {
            mdd = mdd.min((balance - peak) / peak);
        }
    }
    mdd
}
