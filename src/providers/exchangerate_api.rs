use crate::core::{CurrencyCode, RateError, RateSnapshot, RateSource};
use async_trait::async_trait;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate-api.com";

/// Rate source backed by the `/v4/latest/{base}` endpoint of exchangerate-api.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .user_agent("fxlive/1.0")
            .timeout(request_timeout)
            .build()
            .map_err(|e| RateError::SourceUnavailable(format!("HTTP client error: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: RateEntries,
}

/// `rates` object in document order.
#[derive(Debug)]
struct RateEntries(Vec<(String, f64)>);

impl<'de> Deserialize<'de> for RateEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RateEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of currency codes to rates")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((code, rate)) = map.next_entry::<String, f64>()? {
                    entries.push((code, rate));
                }
                Ok(RateEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn parse_snapshot(base: &CurrencyCode, body: &str) -> Result<RateSnapshot, RateError> {
    let data: LatestRatesResponse = serde_json::from_str(body).map_err(|e| {
        RateError::SourceUnavailable(format!("Failed to parse JSON response for {base}: {e}"))
    })?;

    let entries = data
        .rates
        .0
        .into_iter()
        .map(|(code, rate)| Ok((code.parse::<CurrencyCode>()?, rate)))
        .collect::<Result<Vec<_>, RateError>>()
        .map_err(|e| RateError::SourceUnavailable(format!("malformed response: {e}")))?;

    RateSnapshot::new(base.clone(), entries).map_err(RateError::into_source_error)
}

#[async_trait]
impl RateSource for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot, RateError> {
        let url = format!("{}/v4/latest/{}", self.base_url, base);
        debug!("Requesting rates from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            RateError::SourceUnavailable(format!("Request error: {e} for base: {base}"))
        })?;

        if !response.status().is_success() {
            return Err(RateError::SourceUnavailable(format!(
                "HTTP error: {} for base: {}",
                response.status(),
                base
            )));
        }

        let text = response.text().await.map_err(|e| {
            RateError::SourceUnavailable(format!("Failed to read response for {base}: {e}"))
        })?;

        let snapshot = parse_snapshot(base, &text)?;
        debug!(rates = snapshot.len(), "Received rates");
        Ok(snapshot)
    }
}
