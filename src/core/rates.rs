//! Rate source abstraction

use super::currency::{CurrencyCode, RateSnapshot};
use super::error::RateError;
use async_trait::async_trait;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches every rate quoted against `base`.
    ///
    /// Either a complete, non-empty snapshot is returned or
    /// [`RateError::SourceUnavailable`]. Implementations do not retry.
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot, RateError>;
}
