//! Single-contract position and closed-trade records.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    MaxLoss,
    TrendReversal,
    TrailingStop,
    /// Forced close of a position still open after the last bar.
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::MaxLoss => write!(f, "max_loss"),
            ExitReason::TrendReversal => write!(f, "trend_reversal"),
            ExitReason::TrailingStop => write!(f, "trailing_stop"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    /// Most favourable close seen while open; starts at the entry price.
    pub trailing_reference_price: f64,
}

impl Position {
    pub fn open(side: Side, entry_price: f64, entry_time: NaiveDateTime) -> Self {
        Position {
            side,
            entry_price,
            entry_time,
            trailing_reference_price: entry_price,
        }
    }

    /// LONG: price - entry; SHORT: entry - price.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => price - self.entry_price,
            Side::Short => self.entry_price - price,
        }
    }

    /// Ratchet the reference toward the favourable extreme; never loosens.
    pub fn track(&mut self, close: f64) {
        self.trailing_reference_price = match self.side {
            Side::Long => self.trailing_reference_price.max(close),
            Side::Short => self.trailing_reference_price.min(close),
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub side: Side,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub pnl: f64,
    pub exit_reason: ExitReason,
    /// Trailing reference at close (best close while the position was open).
    pub best_price: f64,
}
