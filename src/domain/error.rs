//! Domain error types.

use chrono::NaiveDate;

use super::price::PriceField;

/// Top-level error type for alphawealth.
#[derive(Debug, thiserror::Error)]
pub enum WealthError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("invalid signal for {ticker} bought {buy_date}: {reason}")]
    InvalidSignal {
        ticker: String,
        buy_date: NaiveDate,
        reason: String,
    },

    #[error("sell date {sell_date} for {ticker} is not a trading day")]
    SellDateOffCalendar { ticker: String, sell_date: NaiveDate },

    #[error("no usable index {field} price on {date}")]
    MissingIndexPrice { date: NaiveDate, field: PriceField },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WealthError {
    pub fn data(reason: impl Into<String>) -> Self {
        WealthError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&WealthError> for std::process::ExitCode {
    fn from(err: &WealthError) -> Self {
        let code: u8 = match err {
            WealthError::Io(_) => 1,
            WealthError::ConfigParse { .. }
            | WealthError::ConfigMissing { .. }
            | WealthError::ConfigInvalid { .. } => 2,
            WealthError::Data { .. } => 3,
            WealthError::InvalidSignal { .. }
            | WealthError::SellDateOffCalendar { .. }
            | WealthError::MissingIndexPrice { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
