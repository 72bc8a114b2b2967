//! One-shot currency conversion, independent of the live poller

use super::currency::CurrencyCode;
use super::display::format_amount;
use super::error::RateError;
use super::rates::RateSource;
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: f64,
    pub converted: f64,
}

impl Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", format_amount(self.converted), self.to)
    }
}

/// Parses user input into a positive, finite amount.
pub fn parse_amount(input: &str) -> Result<f64, RateError> {
    let amount: f64 = input
        .trim()
        .parse()
        .map_err(|_| RateError::InvalidAmount(input.to_string()))?;
    validate_amount(amount)
}

fn validate_amount(amount: f64) -> Result<f64, RateError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(RateError::InvalidAmount(amount.to_string()))
    }
}

/// Converts `amount` of `from` into `to` using a freshly fetched snapshot.
pub async fn convert(
    source: &dyn RateSource,
    amount: f64,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<Conversion, RateError> {
    let amount = validate_amount(amount)?;

    let snapshot = source.fetch_rates(from).await?;
    let rate = snapshot
        .get(to.as_str())
        .ok_or_else(|| RateError::UnsupportedCurrency(to.clone()))?;

    let converted = amount * rate;
    debug!(%from, %to, rate, converted, "Converted amount");

    Ok(Conversion {
        amount,
        from: from.clone(),
        to: to.clone(),
        rate,
        converted,
    })
}

/// Lists every code the source quotes against `base`, in source order.
pub async fn list_currencies(
    source: &dyn RateSource,
    base: &CurrencyCode,
) -> Result<Vec<CurrencyCode>, RateError> {
    let snapshot = source.fetch_rates(base).await?;
    Ok(snapshot.codes().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateSnapshot;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        call_count: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateSource for MockSource {
        async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot, RateError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match base.as_str() {
                "USD" => RateSnapshot::from_pairs("USD", &[("USD", 1.0), ("INR", 83.5)]),
                _ => Err(RateError::SourceUnavailable("HTTP error: 404".to_string())),
            }
        }
    }

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_convert_formats_result() {
        let source = MockSource::new();
        let conversion = convert(&source, 1500.0, &code("USD"), &code("INR"))
            .await
            .unwrap();

        assert_eq!(conversion.rate, 83.5);
        assert_eq!(conversion.converted, 125250.0);
        assert_eq!(conversion.to_string(), "125,250.00 INR");
    }

    #[tokio::test]
    async fn test_convert_unsupported_target() {
        let source = MockSource::new();
        let result = convert(&source, 10.0, &code("USD"), &code("XYZ")).await;
        assert_eq!(result, Err(RateError::UnsupportedCurrency(code("XYZ"))));
    }

    #[tokio::test]
    async fn test_convert_source_failure() {
        let source = MockSource::new();
        let result = convert(&source, 10.0, &code("EUR"), &code("USD")).await;
        assert!(matches!(result, Err(RateError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_invalid_amount_skips_fetch() {
        let source = MockSource::new();
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = convert(&source, amount, &code("USD"), &code("INR")).await;
            assert!(matches!(result, Err(RateError::InvalidAmount(_))));
        }
        assert_eq!(source.call_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.5 "), Ok(12.5));
        assert_eq!(
            parse_amount("abc"),
            Err(RateError::InvalidAmount("abc".to_string()))
        );
        assert!(matches!(parse_amount("0"), Err(RateError::InvalidAmount(_))));
        assert!(matches!(parse_amount("-3"), Err(RateError::InvalidAmount(_))));
        assert!(matches!(parse_amount("inf"), Err(RateError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn test_list_currencies_in_source_order() {
        let source = MockSource::new();
        let codes = list_currencies(&source, &code("USD")).await.unwrap();
        assert_eq!(codes, vec![code("USD"), code("INR")]);
    }
}
