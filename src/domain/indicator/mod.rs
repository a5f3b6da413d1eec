//! Streaming indicator pipeline.
//!
//! - `IndicatorSnapshot`: indicator values after the current bar, each `None`
//!   until its lookback window is satisfied
//! - `IndicatorPipeline`: incremental state for EMA(short), EMA(long), RSI,
//!   ATR and the rolling volume average, updated once per bar

pub mod atr;
pub mod ema;
pub mod rolling;
pub mod rsi;

use crate::domain::ohlcv::Bar;
use crate::domain::strategy::ParameterSet;

use atr::Atr;
use ema::Ema;
use rolling::RollingMean;
use rsi::Rsi;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorSnapshot {
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub avg_volume: Option<f64>,
    /// Close of the bar before the current one (trailing-stop anchor).
    pub prev_close: Option<f64>,
}

/// All entry-relevant components, present only once history is sufficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmSnapshot {
    pub ema_short: f64,
    pub ema_long: f64,
    pub rsi: f64,
    pub atr: f64,
    pub avg_volume: f64,
}

impl IndicatorSnapshot {
    pub fn warm(&self) -> Option<WarmSnapshot> {
        Some(WarmSnapshot {
            ema_short: self.ema_short?,
            ema_long: self.ema_long?,
            rsi: self.rsi?,
            atr: self.atr?,
            avg_volume: self.avg_volume?,
        })
    }

    /// True while any component is still undefined.
    pub fn is_insufficient(&self) -> bool {
        self.warm().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    ema_short: Ema,
    ema_long: Ema,
    rsi: Rsi,
    atr: Atr,
    volume: RollingMean,
    prev_close: Option<f64>,
}

impl IndicatorPipeline {
    pub fn new(params: &ParameterSet) -> Self {
        IndicatorPipeline {
            ema_short: Ema::new(params.ema_short_period),
            ema_long: Ema::new(params.ema_long_period),
            rsi: Rsi::new(params.rsi_period),
            atr: Atr::new(params.atr_period),
            volume: RollingMean::new(params.volume_window),
            prev_close: None,
        }
    }

    /// Fold the next bar into every indicator and return the new snapshot.
    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        let snapshot = IndicatorSnapshot {
            ema_short: self.ema_short.update(bar.close),
            ema_long: self.ema_long.update(bar.close),
            rsi: self.rsi.update(bar.close),
            atr: self.atr.update(bar),
            avg_volume: self.volume.push(bar.volume),
            prev_close: self.prev_close,
        };
        self.prev_close = Some(bar.close);
        snapshot
    }
}

/// Snapshots for every bar of a history, as the pipeline would emit them.
pub fn compute_snapshots(bars: &[Bar], params: &ParameterSet) -> Vec<IndicatorSnapshot> {
    let mut pipeline = IndicatorPipeline::new(params);
    bars.iter().map(|bar| pipeline.update(bar)).collect()
}
