//! Core domain types and logic.

pub mod ohlcv;
pub mod position;
pub mod position_manager;
pub mod indicator;
pub mod signal;
pub mod session;
pub mod backtest;
pub mod metrics;
pub mod optimize;
pub mod strategy;
pub mod config_validation;
pub mod error;
