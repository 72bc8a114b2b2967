use super::ui;
use crate::core::convert::list_currencies;
use crate::core::currency::FALLBACK_CURRENCIES;
use crate::core::{CurrencyCode, RateSource};
use tracing::error;

pub const FALLBACK_NOTICE: &str = "Could not load currencies – defaults shown";

pub struct CurrencyList {
    pub codes: Vec<CurrencyCode>,
    /// Set when the source failed and the fallback list is shown.
    pub notice: Option<&'static str>,
}

pub async fn load(source: &dyn RateSource) -> CurrencyList {
    match list_currencies(source, &CurrencyCode::usd()).await {
        Ok(codes) => CurrencyList {
            codes,
            notice: None,
        },
        Err(e) => {
            error!(error = %e, "Failed to load currencies");
            CurrencyList {
                codes: FALLBACK_CURRENCIES
                    .iter()
                    .filter_map(|code| code.parse().ok())
                    .collect(),
                notice: Some(FALLBACK_NOTICE),
            }
        }
    }
}

pub async fn run(source: &dyn RateSource) -> CurrencyList {
    let pb = ui::new_spinner("Loading currencies…");
    let list = load(source).await;
    pb.finish_and_clear();

    let codes: Vec<&str> = list.codes.iter().map(CurrencyCode::as_str).collect();
    println!("{}", codes.join(" "));
    if let Some(notice) = list.notice {
        println!("{}", ui::style_text(notice, ui::StyleType::Error));
    }
    list
}
