//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
    #[error("invalid price {price} on {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("empty input: {reason}")]
    EmptyInput { reason: String },

    #[error("{metric} is undefined: {reason}")]
    UndefinedMetric {
        metric: &'static str,
        reason: String,
    },

    #[error("initial capital must be positive and finite, got {value}")]
    InvalidCapital { value: f64 },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmacrossError {
    pub(crate) fn undefined(metric: &'static str, reason: impl Into<String>) -> Self {
        SmacrossError::UndefinedMetric {
            metric,
            reason: reason.into(),
        }
    }

    pub(crate) fn data(reason: impl Into<String>) -> Self {
        SmacrossError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        let code: u8 = match err {
            SmacrossError::Io(_) => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. }
            | SmacrossError::InvalidCapital { .. } => 2,
            SmacrossError::Data { .. } => 3,
            SmacrossError::EmptyInput { .. } | SmacrossError::InvalidPrice { .. } => 4,
            SmacrossError::UndefinedMetric { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
