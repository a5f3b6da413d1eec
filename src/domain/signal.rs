//! Signal evaluation: indicator state + position context → action.
//!
//! Flat: only entry conditions are checked, and only once every indicator is
//! defined. Positioned: only exit conditions are checked, in fixed priority
//! order (max loss, trend reversal, trailing stop). Each exit check needs only
//! its own inputs; an undefined input means that check does not fire.

use super::indicator::{IndicatorSnapshot, WarmSnapshot};
use super::ohlcv::Bar;
use super::position::{ExitReason, Position, Side};
use super::strategy::ParameterSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OpenLong,
    OpenShort,
    Close(ExitReason),
    Hold,
}

pub fn decide(
    snapshot: &IndicatorSnapshot,
    bar: &Bar,
    position: Option<&Position>,
    params: &ParameterSet,
) -> Action {
    match position {
        None => evaluate_entry(snapshot, bar, params),
        Some(pos) => match evaluate_exit(snapshot, bar, pos, params) {
            Some(reason) => Action::Close(reason),
            None => Action::Hold,
        },
    }
}

fn evaluate_entry(snapshot: &IndicatorSnapshot, bar: &Bar, params: &ParameterSet) -> Action {
    let Some(warm) = snapshot.warm() else {
        return Action::Hold;
    };

    let long = long_entry(&warm, bar, params);
    let short = short_entry(&warm, bar, params);
    debug_assert!(
        !(long && short),
        "long and short entry both satisfied at {}",
        bar.timestamp
    );

    if long {
        Action::OpenLong
    } else if short {
        Action::OpenShort
    } else {
        Action::Hold
    }
}

fn volume_spike(warm: &WarmSnapshot, bar: &Bar, params: &ParameterSet) -> bool {
    bar.volume > params.volume_threshold * warm.avg_volume
}

pub fn long_entry(warm: &WarmSnapshot, bar: &Bar, params: &ParameterSet) -> bool {
    warm.ema_short > warm.ema_long
        && bar.close > warm.ema_short
        && warm.rsi > params.rsi_upper
        && volume_spike(warm, bar, params)
}

pub fn short_entry(warm: &WarmSnapshot, bar: &Bar, params: &ParameterSet) -> bool {
    warm.ema_short < warm.ema_long
        && bar.close < warm.ema_short
        && warm.rsi < params.rsi_lower
        && volume_spike(warm, bar, params)
}

pub fn evaluate_exit(
    snapshot: &IndicatorSnapshot,
    bar: &Bar,
    position: &Position,
    params: &ParameterSet,
) -> Option<ExitReason> {
    if position.unrealized_pnl(bar.close) <= -params.max_loss {
        return Some(ExitReason::MaxLoss);
    }
    if trend_reversed(snapshot, bar, position, params) {
        return Some(ExitReason::TrendReversal);
    }
    if trailing_stop_hit(snapshot, bar, position, params) {
        return Some(ExitReason::TrailingStop);
    }
    None
}

fn trend_reversed(
    snapshot: &IndicatorSnapshot,
    bar: &Bar,
    position: &Position,
    params: &ParameterSet,
) -> bool {
    let (Some(ema_long), Some(rsi)) = (snapshot.ema_long, snapshot.rsi) else {
        return false;
    };
    match position.side {
        Side::Long => bar.close < ema_long && rsi < params.rsi_exit,
        Side::Short => bar.close > ema_long && rsi > params.rsi_exit,
    }
}

/// LONG: max(entry + min_profit, prev_close - atr * k);
/// SHORT: min(entry - min_profit, prev_close + atr * k).
pub fn trailing_stop_level(
    snapshot: &IndicatorSnapshot,
    position: &Position,
    params: &ParameterSet,
) -> Option<f64> {
    let atr = snapshot.atr?;
    let prev_close = snapshot.prev_close?;
    let offset = atr * params.atr_multiplier;
    Some(match position.side {
        Side::Long => (position.entry_price + params.min_profit).max(prev_close - offset),
        Side::Short => (position.entry_price - params.min_profit).min(prev_close + offset),
    })
}

fn trailing_stop_hit(
    snapshot: &IndicatorSnapshot,
    bar: &Bar,
    position: &Position,
    params: &ParameterSet,
) -> bool {
    if position.unrealized_pnl(bar.close) <= params.min_profit {
        return false;
    }
    match trailing_stop_level(snapshot, position, params) {
        Some(level) => match position.side {
            Side::Long => bar.close < level,
            Side::Short => bar.close > level,
        },
        None => false,
    }
}
