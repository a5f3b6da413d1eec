//! Strategy parameter set.
//!
//! One `ParameterSet` is immutable for the duration of a backtest run and is
//! threaded explicitly through the pipeline, evaluator and optimiser.

use serde::{Deserialize, Serialize};

use super::error::TrendscoreError;

/// The twelve tunable parameters of the EMA/RSI/ATR/volume strategy.
///
/// `min_profit` and `max_loss` are expressed in price units, the same scale
/// as unrealized P&L (one contract).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub ema_short_period: usize,
    pub ema_long_period: usize,
    pub rsi_period: usize,
    pub rsi_lower: f64,
    pub rsi_upper: f64,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub min_profit: f64,
    pub max_loss: f64,
    pub volume_threshold: f64,
    pub volume_window: usize,
    pub rsi_exit: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        ParameterSet {
            ema_short_period: 12,
            ema_long_period: 26,
            rsi_period: 14,
            rsi_lower: 45.0,
            rsi_upper: 55.0,
            atr_period: 14,
            atr_multiplier: 1.5,
            min_profit: 0.5,
            max_loss: 2.0,
            volume_threshold: 1.2,
            volume_window: 20,
            rsi_exit: 50.0,
        }
    }
}

impl ParameterSet {
    /// Number of bars before every indicator in the snapshot is defined.
    ///
    /// RSI needs `rsi_period` close-to-close changes, hence one extra bar.
    pub fn warmup_bars(&self) -> usize {
        self.ema_short_period
            .max(self.ema_long_period)
            .max(self.rsi_period + 1)
            .max(self.atr_period)
            .max(self.volume_window)
    }

    pub fn validate(&self) -> Result<(), TrendscoreError> {
        let periods = [
            ("ema_short_period", self.ema_short_period),
            ("ema_long_period", self.ema_long_period),
            ("rsi_period", self.rsi_period),
            ("atr_period", self.atr_period),
            ("volume_window", self.volume_window),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(TrendscoreError::parameter(field, "must be at least 1"));
            }
        }

        let values = [
            ("rsi_lower", self.rsi_lower),
            ("rsi_upper", self.rsi_upper),
            ("atr_multiplier", self.atr_multiplier),
            ("min_profit", self.min_profit),
            ("max_loss", self.max_loss),
            ("volume_threshold", self.volume_threshold),
            ("rsi_exit", self.rsi_exit),
        ];
        for (field, value) in values {
            if !value.is_finite() {
                return Err(TrendscoreError::parameter(field, "must be finite"));
            }
        }

        for (field, value) in [
            ("rsi_lower", self.rsi_lower),
            ("rsi_upper", self.rsi_upper),
            ("rsi_exit", self.rsi_exit),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(TrendscoreError::parameter(
                    field,
                    "must be between 0 and 100",
                ));
            }
        }
        if self.rsi_lower > self.rsi_upper {
            return Err(TrendscoreError::parameter(
                "rsi_lower",
                "must not exceed rsi_upper",
            ));
        }

        for (field, value) in [
            ("atr_multiplier", self.atr_multiplier),
            ("min_profit", self.min_profit),
            ("max_loss", self.max_loss),
            ("volume_threshold", self.volume_threshold),
        ] {
            if value < 0.0 {
                return Err(TrendscoreError::parameter(field, "must be non-negative"));
            }
        }

        Ok(())
    }
}
