//! Position manager: owns the single open position, the trade ledger and the
//! per-bar equity curve.

use chrono::NaiveDateTime;

use super::error::TrendscoreError;
use super::ohlcv::Bar;
use super::position::{ExitReason, Position, Side, Trade};
use super::signal::Action;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionManager {
    realized_balance: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl PositionManager {
    pub fn new(initial_capital: f64) -> Self {
        PositionManager {
            realized_balance: initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Initial capital plus realized P&L; changes only on close.
    pub fn realized_balance(&self) -> f64 {
        self.realized_balance
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Realized balance plus the open position's unrealized P&L at `price`.
    pub fn equity_at(&self, price: f64) -> f64 {
        let unrealized = self
            .position
            .as_ref()
            .map_or(0.0, |pos| pos.unrealized_pnl(price));
        self.realized_balance + unrealized
    }

    /// Apply one bar's action, then record that bar's equity point.
    pub fn apply(&mut self, action: Action, bar: &Bar) -> Result<Option<Trade>, TrendscoreError> {
        let closed = match action {
            Action::Hold => {
                if let Some(pos) = self.position.as_mut() {
                    pos.track(bar.close);
                }
                None
            }
            Action::OpenLong => {
                self.open(Side::Long, bar)?;
                None
            }
            Action::OpenShort => {
                self.open(Side::Short, bar)?;
                None
            }
            Action::Close(reason) => Some(self.close(bar, reason)?),
        };
        self.record_equity(bar);
        Ok(closed)
    }

    pub fn open(&mut self, side: Side, bar: &Bar) -> Result<(), TrendscoreError> {
        if let Some(existing) = &self.position {
            return Err(TrendscoreError::InvalidTransition {
                reason: format!(
                    "cannot open {} at {}: {} position from {} is still open",
                    side, bar.timestamp, existing.side, existing.entry_time
                ),
            });
        }
        tracing::debug!(%side, price = bar.close, at = %bar.timestamp, "opening position");
        self.position = Some(Position::open(side, bar.close, bar.timestamp));
        Ok(())
    }

    /// Close at the bar's close and append the trade to the ledger.
    pub fn close(&mut self, bar: &Bar, reason: ExitReason) -> Result<Trade, TrendscoreError> {
        let pos = self
            .position
            .take()
            .ok_or_else(|| TrendscoreError::InvalidTransition {
                reason: format!("cannot close at {}: no open position", bar.timestamp),
            })?;

        let pnl = pos.unrealized_pnl(bar.close);
        self.realized_balance += pnl;

        let trade = Trade {
            side: pos.side,
            entry_time: pos.entry_time,
            entry_price: pos.entry_price,
            exit_time: bar.timestamp,
            exit_price: bar.close,
            pnl,
            exit_reason: reason,
            best_price: pos.trailing_reference_price,
        };
        tracing::debug!(
            side = %trade.side,
            entry = trade.entry_price,
            exit = trade.exit_price,
            pnl = trade.pnl,
            reason = %trade.exit_reason,
            "closed position"
        );
        self.trades.push(trade.clone());
        Ok(trade)
    }

    fn record_equity(&mut self, bar: &Bar) {
        let balance = self.equity_at(bar.close);
        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            balance,
        });
    }

    pub fn into_parts(self) -> (Vec<Trade>, Vec<EquityPoint>, f64) {
        (self.trades, self.equity_curve, self.realized_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bar_at(i: i64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + Duration::days(i),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn new_manager_is_flat() {
        let pm = PositionManager::new(10_000.0);
        assert!(pm.position().is_none());
        assert!(pm.trades().is_empty());
        assert!(pm.equity_curve().is_empty());
        assert!((pm.realized_balance() - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hold_while_flat_records_flat_equity() {
        let mut pm = PositionManager::new(10_000.0);
        let closed = pm.apply(Action::Hold, &bar_at(0, 100.0)).unwrap();
        assert!(closed.is_none());
        assert_eq!(pm.equity_curve().len(), 1);
        assert!((pm.equity_curve()[0].balance - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn open_long_sets_entry_from_bar() {
        let mut pm = PositionManager::new(10_000.0);
        let bar = bar_at(0, 105.0);
        pm.apply(Action::OpenLong, &bar).unwrap();

        let pos = pm.position().unwrap();
        assert_eq!(pos.side, Side::Long);
        assert!((pos.entry_price - 105.0).abs() < f64::EPSILON);
        assert_eq!(pos.entry_time, bar.timestamp);
        assert!((pos.trailing_reference_price - 105.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_includes_unrealized_pnl() {
        let mut pm = PositionManager::new(10_000.0);
        pm.apply(Action::OpenShort, &bar_at(0, 100.0)).unwrap();
        pm.apply(Action::Hold, &bar_at(1, 97.0)).unwrap();

        let curve = pm.equity_curve();
        assert!((curve[0].balance - 10_000.0).abs() < f64::EPSILON);
        assert!((curve[1].balance - 10_003.0).abs() < f64::EPSILON);
        // realized balance only moves on close
        assert!((pm.realized_balance() - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn close_appends_trade_and_realizes() {
        let mut pm = PositionManager::new(10_000.0);
        pm.apply(Action::OpenLong, &bar_at(0, 100.0)).unwrap();
        pm.apply(Action::Hold, &bar_at(1, 104.0)).unwrap();
        let trade = pm
            .apply(Action::Close(ExitReason::TrailingStop), &bar_at(2, 102.0))
            .unwrap()
            .unwrap();

        assert!(pm.position().is_none());
        assert_eq!(pm.trades().len(), 1);
        assert!((trade.pnl - 2.0).abs() < f64::EPSILON);
        assert!((trade.best_price - 104.0).abs() < f64::EPSILON);
        assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
        assert!((pm.realized_balance() - 10_002.0).abs() < f64::EPSILON);
        assert!((pm.equity_curve()[2].balance - 10_002.0).abs() < f64::EPSILON);
    }

    #[test]
    fn open_while_positioned_is_rejected() {
        let mut pm = PositionManager::new(10_000.0);
        pm.apply(Action::OpenLong, &bar_at(0, 100.0)).unwrap();
        let err = pm.apply(Action::OpenShort, &bar_at(1, 101.0)).unwrap_err();
        assert!(matches!(err, TrendscoreError::InvalidTransition { .. }));
        // state untouched by the rejected open
        assert_eq!(pm.position().unwrap().side, Side::Long);
    }

    #[test]
    fn close_while_flat_is_rejected() {
        let mut pm = PositionManager::new(10_000.0);
        let err = pm
            .apply(Action::Close(ExitReason::MaxLoss), &bar_at(0, 100.0))
            .unwrap_err();
        assert!(err.to_string().contains("no open position"));
        assert!(pm.trades().is_empty());
    }
}
