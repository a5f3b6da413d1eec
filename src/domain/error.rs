//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for trendscore.
#[derive(Debug, thiserror::Error)]
pub enum TrendscoreError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter {field}: {reason}")]
    ParameterInvalid { field: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("malformed bar at {timestamp}: {reason}")]
    MalformedBar {
        timestamp: NaiveDateTime,
        reason: String,
    },

    #[error("out-of-order bar: {current} does not follow {previous}")]
    OutOfOrderBar {
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("invalid position transition: {reason}")]
    InvalidTransition { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendscoreError {
    pub(crate) fn parameter(field: &str, reason: impl Into<String>) -> Self {
        TrendscoreError::ParameterInvalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TrendscoreError> for std::process::ExitCode {
    fn from(err: &TrendscoreError) -> Self {
        let code: u8 = match err {
            TrendscoreError::Io(_) | TrendscoreError::Report { .. } => 1,
            TrendscoreError::ConfigParse { .. }
            | TrendscoreError::ConfigMissing { .. }
            | TrendscoreError::ConfigInvalid { .. }
            | TrendscoreError::ParameterInvalid { .. } => 2,
            TrendscoreError::Data { .. }
            | TrendscoreError::Csv(_)
            | TrendscoreError::MalformedBar { .. }
            | TrendscoreError::OutOfOrderBar { .. } => 3,
            TrendscoreError::InvalidTransition { .. } => 4,
            TrendscoreError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
