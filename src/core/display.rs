//! Presentation helpers shared by every sink: row ordering, number formatting
//! and the visual marker attached to a moved rate.

use super::classify::{ChangeClassification, Classifications, Direction};
use super::currency::{CurrencyCode, RateSnapshot};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;
use std::time::Duration;

/// Codes listed first in the live table, in this order.
pub const DEFAULT_PRIORITY_CURRENCIES: [&str; 10] = [
    "USD", "EUR", "GBP", "INR", "JPY", "AUD", "CAD", "CHF", "CNY", "SGD",
];

pub const RATE_DECIMALS: u32 = 5;
pub const AMOUNT_DECIMALS: u32 = 2;
pub const DEFAULT_FLASH: Duration = Duration::from_millis(900);

/// Priority codes first (skipping the ones the snapshot lacks), then the rest
/// of the snapshot in source order. Each code appears once.
pub fn display_order<'a>(
    snapshot: &'a RateSnapshot,
    priority: &[CurrencyCode],
) -> Vec<&'a CurrencyCode> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::with_capacity(snapshot.len());

    let prioritized = priority
        .iter()
        .filter_map(|code| snapshot.codes().find(|c| *c == code));
    for code in prioritized.chain(snapshot.codes()) {
        if seen.insert(code.as_str()) {
            ordered.push(code);
        }
    }
    ordered
}

fn round_decimal(value: f64, decimals: u32) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero))
}

/// Formats a rate with exactly five decimals.
///
/// Rounding is half away from zero on the shortest decimal form of the float,
/// so `1.234565` renders as `1.23457` even though its binary value sits just
/// below the midpoint.
pub fn format_rate(rate: f64) -> String {
    match round_decimal(rate, RATE_DECIMALS) {
        Some(d) => format!("{:.prec$}", d, prec = RATE_DECIMALS as usize),
        None => format!("{:.prec$}", rate, prec = RATE_DECIMALS as usize),
    }
}

/// Formats a converted amount with two decimals and thousands separators,
/// e.g. `1,234.57`.
pub fn format_amount(amount: f64) -> String {
    let text = match round_decimal(amount, AMOUNT_DECIMALS) {
        Some(d) => format!("{:.prec$}", d, prec = AMOUNT_DECIMALS as usize),
        None => format!("{:.prec$}", amount, prec = AMOUNT_DECIMALS as usize),
    };

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

/// Visual state of a moved rate.
///
/// The direction is persistent: arrow and colour stay until the next render.
/// The flash is transient and should be cleared by the sink after `flash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub direction: Direction,
    pub flash: Duration,
}

impl Marker {
    pub fn arrow(&self) -> &'static str {
        match self.direction {
            Direction::Up => "▲",
            Direction::Down => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub code: CurrencyCode,
    pub rate: f64,
    pub display: String,
    pub change: ChangeClassification,
    pub marker: Option<Marker>,
}

/// Builds the table rows for one render, in display order.
pub fn build_rows(
    snapshot: &RateSnapshot,
    classifications: &Classifications,
    priority: &[CurrencyCode],
    flash: Duration,
) -> Vec<RateRow> {
    display_order(snapshot, priority)
        .into_iter()
        .filter_map(|code| {
            let rate = snapshot.get(code.as_str())?;
            let change = classifications
                .get(code.as_str())
                .copied()
                .unwrap_or(ChangeClassification::New);
            Some(RateRow {
                code: code.clone(),
                rate,
                display: format_rate(rate),
                change,
                marker: change
                    .direction()
                    .map(|direction| Marker { direction, flash }),
            })
        })
        .collect()
}

pub fn default_priority() -> Vec<CurrencyCode> {
    DEFAULT_PRIORITY_CURRENCIES
        .iter()
        .filter_map(|code| code.parse().ok())
        .collect()
}
