//! Currency codes and rate snapshots

use super::error::RateError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Codes offered when the rate source cannot list currencies.
pub const FALLBACK_CURRENCIES: [&str; 2] = ["USD", "INR"];

/// An upper-case currency code such as `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn usd() -> Self {
        CurrencyCode("USD".to_string())
    }

    pub fn inr() -> Self {
        CurrencyCode("INR".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RateError::InvalidCurrencyCode(s.to_string()));
        }
        Ok(CurrencyCode(trimmed.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = RateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CurrencyCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Rates quoted against one base currency at one point in time.
///
/// `1 base = rate units of code`. Entries keep the order the source returned
/// them in, which the display ordering relies on. A snapshot cannot be
/// modified once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    base: CurrencyCode,
    entries: Vec<(CurrencyCode, f64)>,
    index: HashMap<CurrencyCode, usize>,
}

impl RateSnapshot {
    pub fn new<I>(base: CurrencyCode, entries: I) -> Result<Self, RateError>
    where
        I: IntoIterator<Item = (CurrencyCode, f64)>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();

        for (code, rate) in entries {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(RateError::MalformedSnapshot(format!(
                    "rate for {code} is not a positive number: {rate}"
                )));
            }
            if index.contains_key(&code) {
                return Err(RateError::MalformedSnapshot(format!(
                    "duplicate currency code: {code}"
                )));
            }
            index.insert(code.clone(), ordered.len());
            ordered.push((code, rate));
        }

        if ordered.is_empty() {
            return Err(RateError::MalformedSnapshot(format!(
                "no rates for base {base}"
            )));
        }

        Ok(Self {
            base,
            entries: ordered,
            index,
        })
    }

    /// Builds a snapshot from raw `(code, rate)` string pairs.
    pub fn from_pairs(base: &str, pairs: &[(&str, f64)]) -> Result<Self, RateError> {
        let entries = pairs
            .iter()
            .map(|(code, rate)| Ok((code.parse::<CurrencyCode>()?, *rate)))
            .collect::<Result<Vec<_>, RateError>>()?;
        Self::new(base.parse()?, entries)
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.index.get(code).map(|&i| self.entries[i].1)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.entries.iter().map(|(code, rate)| (code, *rate))
    }

    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.entries.iter().map(|(code, _)| code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_normalizes_case_and_whitespace() {
        let code: CurrencyCode = " usd ".parse().unwrap();
        assert_eq!(code.as_str(), "USD");
        assert_eq!(code.to_string(), "USD");
    }

    #[test]
    fn test_currency_code_rejects_empty_and_symbols() {
        assert_eq!(
            "".parse::<CurrencyCode>(),
            Err(RateError::InvalidCurrencyCode("".to_string()))
        );
        assert!("US D".parse::<CurrencyCode>().is_err());
        assert!("€".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_snapshot_keeps_source_order() {
        let snapshot =
            RateSnapshot::from_pairs("USD", &[("GBP", 0.8), ("EUR", 0.9), ("USD", 1.0)]).unwrap();
        let codes: Vec<&str> = snapshot.codes().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["GBP", "EUR", "USD"]);
        assert_eq!(snapshot.get("EUR"), Some(0.9));
        assert_eq!(snapshot.get("JPY"), None);
        assert_eq!(snapshot.base().as_str(), "USD");
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_snapshot_rejects_invalid_rates() {
        assert!(matches!(
            RateSnapshot::from_pairs("USD", &[("EUR", 0.0)]),
            Err(RateError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            RateSnapshot::from_pairs("USD", &[("EUR", f64::NAN)]),
            Err(RateError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            RateSnapshot::from_pairs("USD", &[("EUR", -1.0)]),
            Err(RateError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_snapshot_rejects_empty_and_duplicates() {
        assert!(matches!(
            RateSnapshot::from_pairs("USD", &[]),
            Err(RateError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            RateSnapshot::from_pairs("USD", &[("EUR", 0.9), ("eur", 0.91)]),
            Err(RateError::MalformedSnapshot(_))
        ));
    }
}
