//! Data access port trait.

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::Bar;
use crate::domain::optimize::Candidate;

pub trait DataPort {
    /// Bars in strictly increasing timestamp order.
    fn load_bars(&self) -> Result<Vec<Bar>, TrendscoreError>;

    /// Candidate parameter sets in input order. A row that cannot be read is
    /// returned as an `Err` in its slot; only a source-level failure fails
    /// the whole call.
    fn load_parameter_sets(&self) -> Result<Vec<Candidate>, TrendscoreError>;
}
