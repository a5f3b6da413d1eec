//! Average True Range: simple mean of true range over the trailing n bars.
//!
//! The first bar has no previous close, so its true range is high - low.

use super::rolling::RollingMean;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    prev_close: Option<f64>,
    ranges: RollingMean,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Atr {
            prev_close: None,
            ranges: RollingMean::new(period),
        }
    }

    pub fn update(&mut self, bar: &Bar) -> Option<f64> {
        let tr = match self.prev_close {
            Some(prev) => bar.true_range(prev),
            None => bar.high - bar.low,
        };
        self.prev_close = Some(bar.close);
        self.ranges.push(tr)
    }
}
