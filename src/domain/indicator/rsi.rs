//! RSI (Relative Strength Index) over a trailing window of close-to-close
//! changes.
//!
//! avg_gain / avg_loss are simple means over the last n changes (no Wilder
//! smoothing). RSI = 100 - 100 / (1 + avg_gain / avg_loss); RSI = 100 when
//! avg_loss == 0. Undefined until n changes exist (n + 1 closes).

use super::rolling::RollingMean;

#[derive(Debug, Clone)]
pub struct Rsi {
    prev_close: Option<f64>,
    gains: RollingMean,
    losses: RollingMean,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi {
            prev_close: None,
            gains: RollingMean::new(period),
            losses: RollingMean::new(period),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let change = close - prev;
        let avg_gain = self.gains.push(change.max(0.0));
        let avg_loss = self.losses.push((-change).max(0.0));

        match (avg_gain, avg_loss) {
            (Some(gain), Some(loss)) => Some(rsi_from_averages(gain, loss)),
            _ => None,
        }
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
