//! OHLCV bar representation.

use chrono::NaiveDateTime;

use super::error::TrendscoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Reject bars that would silently poison the indicator recurrences.
    pub fn validate(&self) -> Result<(), TrendscoreError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(self.malformed(format!("{name} is not finite")));
            }
        }
        if self.volume < 0.0 {
            return Err(self.malformed("volume is negative"));
        }
        if self.low > self.high {
            return Err(self.malformed(format!(
                "low {} above high {}",
                self.low, self.high
            )));
        }
        Ok(())
    }

    fn malformed(&self, reason: impl Into<String>) -> TrendscoreError {
        TrendscoreError::MalformedBar {
            timestamp: self.timestamp,
            reason: reason.into(),
        }
    }
}

/// Check the ingestion invariant: strictly increasing timestamps.
pub fn ensure_chronological(bars: &[Bar]) -> Result<(), TrendscoreError> {
    for pair in bars.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(TrendscoreError::OutOfOrderBar {
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    Ok(())
}
