//! Error kinds surfaced by rate sources, the converter and the poller

use super::currency::CurrencyCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateError {
    #[error("Rate source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Currency not supported: {0}")]
    UnsupportedCurrency(CurrencyCode),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency code: '{0}'")]
    InvalidCurrencyCode(String),

    #[error("Malformed rate snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Invalid poll settings: {0}")]
    InvalidSettings(String),
}

impl RateError {
    /// Collapses snapshot validation failures into `SourceUnavailable`, which is
    /// what callers of a rate source are expected to handle.
    pub fn into_source_error(self) -> Self {
        match self {
            RateError::MalformedSnapshot(msg) => {
                RateError::SourceUnavailable(format!("malformed response: {msg}"))
            }
            other => other,
        }
    }
}
