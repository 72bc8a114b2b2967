pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{CurrencyCode, RateSource};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Live {
        base: Option<String>,
        duration_secs: Option<u64>,
    },
    Convert {
        amount: String,
        from: Option<String>,
        to: Option<String>,
        swap: bool,
    },
    Currencies,
}

fn parse_code(value: Option<&str>, default: &CurrencyCode) -> Result<CurrencyCode> {
    match value {
        Some(text) => text
            .parse()
            .with_context(|| format!("Invalid currency code: '{text}'")),
        None => Ok(default.clone()),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxlive starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    config.validate()?;
    debug!("Loaded config: {config:#?}");

    let provider = providers::ExchangeRateApiProvider::new(
        config.rate_api_base_url(),
        config.live.request_timeout(),
    )?;
    let source: Arc<dyn RateSource> = Arc::new(provider);

    match command {
        AppCommand::Live {
            base,
            duration_secs,
        } => {
            let base = parse_code(base.as_deref(), &config.live.base_currency)?;
            cli::live::run(
                source,
                base,
                config.live.poll_settings(),
                config.live.priority_currencies.clone(),
                config.live.flash(),
                duration_secs.map(Duration::from_secs),
            )
            .await
        }
        AppCommand::Convert {
            amount,
            from,
            to,
            swap,
        } => {
            let mut from = parse_code(from.as_deref(), &config.converter.from)?;
            let mut to = parse_code(to.as_deref(), &config.converter.to)?;
            if swap {
                std::mem::swap(&mut from, &mut to);
            }
            cli::convert::run(source.as_ref(), &amount, &from, &to).await?;
            Ok(())
        }
        AppCommand::Currencies => {
            cli::currencies::run(source.as_ref()).await;
            Ok(())
        }
    }
}
