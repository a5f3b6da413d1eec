//! CSV file data adapter.

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::Bar;
use crate::domain::optimize::Candidate;
use crate::domain::strategy::ParameterSet;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    bars_path: PathBuf,
    parameters_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(bars_path: PathBuf) -> Self {
        Self {
            bars_path,
            parameters_path: None,
        }
    }

    pub fn with_parameters(mut self, parameters_path: PathBuf) -> Self {
        self.parameters_path = Some(parameters_path);
        self
    }

    fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, TrendscoreError> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| TrendscoreError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            })
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare date at
/// midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<f64, TrendscoreError> {
    record
        .get(index)
        .ok_or_else(|| TrendscoreError::Data {
            reason: format!("line {line}: missing {name} column"),
        })?
        .parse()
        .map_err(|e| TrendscoreError::Data {
            reason: format!("line {line}: invalid {name} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn load_bars(&self) -> Result<Vec<Bar>, TrendscoreError> {
        let mut rdr = Self::reader(&self.bars_path)?;
        let mut bars: Vec<Bar> = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TrendscoreError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let ts_str = record.get(0).ok_or_else(|| TrendscoreError::Data {
                reason: format!("line {line}: missing timestamp column"),
            })?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| TrendscoreError::Data {
                reason: format!("line {line}: invalid timestamp '{ts_str}'"),
            })?;

            let bar = Bar {
                timestamp,
                open: field(&record, 1, "open", line)?,
                high: field(&record, 2, "high", line)?,
                low: field(&record, 3, "low", line)?,
                close: field(&record, 4, "close", line)?,
                volume: field(&record, 5, "volume", line)?,
            };
            bar.validate()?;

            if let Some(previous) = bars.last() {
                if bar.timestamp <= previous.timestamp {
                    return Err(TrendscoreError::OutOfOrderBar {
                        previous: previous.timestamp,
                        current: bar.timestamp,
                    });
                }
            }
            bars.push(bar);
        }

        tracing::info!(path = %self.bars_path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }

    fn load_parameter_sets(&self) -> Result<Vec<Candidate>, TrendscoreError> {
        let path = self
            .parameters_path
            .as_ref()
            .ok_or_else(|| TrendscoreError::Data {
                reason: "no parameter file configured".into(),
            })?;
        let mut rdr = Self::reader(path)?;

        let candidates: Vec<Candidate> = rdr
            .deserialize::<ParameterSet>()
            .enumerate()
            .map(|(index, row)| {
                row.map_err(|e| {
                    tracing::warn!(
                        path = %path.display(),
                        candidate = index,
                        error = %e,
                        "unreadable parameter row"
                    );
                    TrendscoreError::Data {
                        reason: format!("{}: {}", path.display(), e),
                    }
                })
            })
            .collect();

        tracing::info!(
            path = %path.display(),
            candidates = candidates.len(),
            "loaded parameter sets"
        );
        Ok(candidates)
    }
}
