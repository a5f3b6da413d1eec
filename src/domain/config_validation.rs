//! Configuration validation.
//!
//! Validates config fields before any bars are loaded. Each check reports the
//! first offending key.

use crate::domain::error::TrendscoreError;
use crate::domain::strategy::ParameterSet;
use crate::ports::config_port::ConfigPort;
use std::path::{Path, PathBuf};

const INTEGER_KEYS: [&str; 5] = [
    "ema_short_period",
    "ema_long_period",
    "rsi_period",
    "atr_period",
    "volume_window",
];

const FLOAT_KEYS: [&str; 7] = [
    "rsi_lower",
    "rsi_upper",
    "atr_multiplier",
    "min_profit",
    "max_loss",
    "volume_threshold",
    "rsi_exit",
];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TrendscoreError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_periods_per_year(config)?;
    validate_strategy_keys(config)?;
    Ok(())
}

pub fn validate_optimize_config(config: &dyn ConfigPort) -> Result<(), TrendscoreError> {
    require_numeric(config, "optimize", "top_k")?;
    let top_k = config.get_int("optimize", "top_k", 10);
    if top_k < 1 {
        return Err(invalid("optimize", "top_k", "top_k must be at least 1"));
    }
    if let Some(raw) = config.get_string("optimize", "parallel") {
        if !matches!(
            raw.to_lowercase().as_str(),
            "true" | "yes" | "on" | "1" | "false" | "no" | "off" | "0"
        ) {
            return Err(invalid("optimize", "parallel", "parallel must be a boolean"));
        }
    }
    Ok(())
}

/// Bar CSV path: a command-line override wins over `[backtest] data`.
pub fn resolve_data_path(
    config: &dyn ConfigPort,
    override_path: Option<&Path>,
) -> Result<PathBuf, TrendscoreError> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }
    match config.get_string("backtest", "data") {
        Some(s) if !s.trim().is_empty() => Ok(PathBuf::from(s.trim())),
        _ => Err(TrendscoreError::ConfigMissing {
            section: "backtest".to_string(),
            key: "data".to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TrendscoreError> {
    require_numeric(config, "backtest", "initial_capital")?;
    let value = config.get_double("backtest", "initial_capital", 10_000.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TrendscoreError> {
    require_numeric(config, "backtest", "risk_free_rate")?;
    let value = config.get_double("backtest", "risk_free_rate", 0.03);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), TrendscoreError> {
    require_numeric(config, "backtest", "periods_per_year")?;
    let value = config.get_double("backtest", "periods_per_year", 252.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

/// Present `[strategy]` keys must parse; range checks belong to
/// [`ParameterSet::validate`].
fn validate_strategy_keys(config: &dyn ConfigPort) -> Result<(), TrendscoreError> {
    for key in INTEGER_KEYS {
        if let Some(raw) = config.get_string("strategy", key) {
            if raw.trim().parse::<usize>().is_err() {
                return Err(invalid(
                    "strategy",
                    key,
                    &format!("{key} must be a non-negative integer"),
                ));
            }
        }
    }
    for key in FLOAT_KEYS {
        require_numeric(config, "strategy", key)?;
    }
    Ok(())
}

/// `ConfigPort` getters silently fall back on unparseable input; catch that here.
fn require_numeric(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), TrendscoreError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<f64>().is_err() => Err(invalid(
            section,
            key,
            &format!("{key} must be numeric, got '{raw}'"),
        )),
        _ => Ok(()),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TrendscoreError {
    TrendscoreError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Build the `[strategy]` parameter set; unset keys take the defaults.
pub fn build_parameter_set(config: &dyn ConfigPort) -> Result<ParameterSet, TrendscoreError> {
    let defaults = ParameterSet::default();
    let period = |key: &str, default: usize| -> Result<usize, TrendscoreError> {
        let value = config.get_int("strategy", key, default as i64);
        usize::try_from(value)
            .map_err(|_| invalid("strategy", key, &format!("{key} must be non-negative")))
    };
    let value = |key: &str, default: f64| config.get_double("strategy", key, default);

    let params = ParameterSet {
        ema_short_period: period("ema_short_period", defaults.ema_short_period)?,
        ema_long_period: period("ema_long_period", defaults.ema_long_period)?,
        rsi_period: period("rsi_period", defaults.rsi_period)?,
        rsi_lower: value("rsi_lower", defaults.rsi_lower),
        rsi_upper: value("rsi_upper", defaults.rsi_upper),
        atr_period: period("atr_period", defaults.atr_period)?,
        atr_multiplier: value("atr_multiplier", defaults.atr_multiplier),
        min_profit: value("min_profit", defaults.min_profit),
        max_loss: value("max_loss", defaults.max_loss),
        volume_threshold: value("volume_threshold", defaults.volume_threshold),
        volume_window: period("volume_window", defaults.volume_window)?,
        rsi_exit: value("rsi_exit", defaults.rsi_exit),
    };
    params.validate()?;
    Ok(params)
}
