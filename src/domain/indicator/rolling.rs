//! Fixed-window simple mean backed by a ring buffer.
//!
//! The mean is recomputed over the window on every push so that long runs do
//! not accumulate add/subtract drift.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    values: VecDeque<f64>,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        RollingMean {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    /// Push a value; returns the mean once the window is full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.mean()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.window == 0 || self.values.len() < self.window {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.window as f64)
    }
}
