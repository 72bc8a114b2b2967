use super::ui;
use crate::core::convert::{Conversion, convert, parse_amount};
use crate::core::{CurrencyCode, RateError, RateSource};
use anyhow::Result;

/// Message shown for a failed conversion.
pub fn describe_error(error: &RateError) -> &'static str {
    match error {
        RateError::InvalidAmount(_) => "Enter a positive number",
        RateError::UnsupportedCurrency(_) => "Currency not supported",
        RateError::InvalidCurrencyCode(_) => "Invalid currency code",
        RateError::SourceUnavailable(_) | RateError::MalformedSnapshot(_) => "Conversion failed",
        RateError::InvalidSettings(_) => "Invalid settings",
    }
}

pub async fn run(
    source: &dyn RateSource,
    amount: &str,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<Conversion> {
    let amount = parse_amount(amount)
        .map_err(|e| anyhow::Error::new(e.clone()).context(describe_error(&e)))?;

    let pb = ui::new_spinner("Converting…");
    let result = convert(source, amount, from, to).await;
    pb.finish_and_clear();

    let conversion =
        result.map_err(|e| anyhow::Error::new(e.clone()).context(describe_error(&e)))?;

    println!(
        "{} {} = {}",
        amount,
        from,
        ui::style_text(&conversion.to_string(), ui::StyleType::Value)
    );
    Ok(conversion)
}
