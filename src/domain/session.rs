//! Per-bar trading step shared by the batch simulator and live feeds.
//!
//! A session is fed bars one at a time, in strictly increasing timestamp
//! order: indicators → decision → position manager → equity point.

use chrono::NaiveDateTime;

use super::error::TrendscoreError;
use super::indicator::{IndicatorPipeline, IndicatorSnapshot};
use super::ohlcv::Bar;
use super::position::{ExitReason, Position, Trade};
use super::position_manager::{EquityPoint, PositionManager};
use super::signal::{self, Action};
use super::strategy::ParameterSet;

/// What happened on one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarOutcome {
    pub snapshot: IndicatorSnapshot,
    pub action: Action,
    pub closed: Option<Trade>,
    pub equity: f64,
}

/// Ledger and equity curve left behind by a finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLedger {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_balance: f64,
}

#[derive(Debug, Clone)]
pub struct TradingSession {
    params: ParameterSet,
    pipeline: IndicatorPipeline,
    manager: PositionManager,
    last_bar: Option<Bar>,
}

impl TradingSession {
    pub fn new(params: ParameterSet, initial_capital: f64) -> Result<Self, TrendscoreError> {
        params.validate()?;
        if !(initial_capital.is_finite() && initial_capital > 0.0) {
            return Err(TrendscoreError::parameter(
                "initial_capital",
                format!("must be positive and finite, got {initial_capital}"),
            ));
        }
        Ok(TradingSession {
            pipeline: IndicatorPipeline::new(&params),
            manager: PositionManager::new(initial_capital),
            params,
            last_bar: None,
        })
    }

    pub fn position(&self) -> Option<&Position> {
        self.manager.position()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.last_bar.as_ref().map(|b| b.timestamp)
    }

    pub fn on_bar(&mut self, bar: &Bar) -> Result<BarOutcome, TrendscoreError> {
        bar.validate()?;
        if let Some(previous) = self.last_timestamp() {
            if bar.timestamp <= previous {
                return Err(TrendscoreError::OutOfOrderBar {
                    previous,
                    current: bar.timestamp,
                });
            }
        }

        let snapshot = self.pipeline.update(bar);
        let action = signal::decide(&snapshot, bar, self.manager.position(), &self.params);
        let closed = self.manager.apply(action, bar)?;
        self.last_bar = Some(bar.clone());

        Ok(BarOutcome {
            snapshot,
            action,
            closed,
            equity: self.manager.equity_at(bar.close),
        })
    }

    /// Force-close any open position at the last bar's close.
    pub fn finish(mut self) -> Result<SessionLedger, TrendscoreError> {
        if let (Some(_), Some(bar)) = (self.manager.position(), self.last_bar.as_ref()) {
            self.manager.close(bar, ExitReason::EndOfData)?;
        }
        let (trades, equity_curve, final_balance) = self.manager.into_parts();
        Ok(SessionLedger {
            trades,
            equity_curve,
            final_balance,
        })
    }
}
