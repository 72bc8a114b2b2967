use chrono::{DateTime, Local};
use fxlive::core::{
    ChangeClassification, Classifications, CurrencyCode, LivePoller, PollSettings,
    PresentationSink, RateSnapshot, RateSource,
};
use fxlive::providers::ExchangeRateApiProvider;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rates_mock_server(base: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/v4/latest/{base}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(base_url: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
providers:
  exchangerate_api:
    base_url: "{base_url}"
live:
  poll_interval_ms: 2000
  request_timeout_ms: 1000
converter:
  from: "USD"
  to: "INR"
"#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config");
        config_file
    }
}

const USD_RATES: &str = r#"{
    "base": "USD",
    "rates": {"USD": 1, "EUR": 0.92, "GBP": 0.79, "INR": 83.5}
}"#;

#[derive(Default)]
struct RecordingSink {
    renders: Mutex<Vec<Classifications>>,
    statuses: Mutex<Vec<String>>,
}

impl PresentationSink for RecordingSink {
    fn render_rates(&self, _snapshot: &RateSnapshot, classifications: &Classifications) {
        self.renders.lock().unwrap().push(classifications.clone());
    }

    fn set_status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn set_updated_timestamp(&self, _time: DateTime<Local>) {}
}

#[test_log::test(tokio::test)]
async fn test_convert_command_with_mock_source() {
    let mock_server = test_utils::create_rates_mock_server("USD", 200, USD_RATES).await;
    let config_file = test_utils::write_config(&mock_server.uri());
    let config_path = config_file.path().to_str().unwrap();

    let result = fxlive::run_command(
        fxlive::AppCommand::Convert {
            amount: "12".to_string(),
            from: None,
            to: None,
            swap: false,
        },
        Some(config_path),
    )
    .await;

    assert!(result.is_ok(), "Conversion failed: {result:?}");
}

#[test_log::test(tokio::test)]
async fn test_convert_command_reports_unsupported_currency() {
    let mock_server = test_utils::create_rates_mock_server("USD", 200, USD_RATES).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fxlive::run_command(
        fxlive::AppCommand::Convert {
            amount: "12".to_string(),
            from: Some("usd".to_string()),
            to: Some("XYZ".to_string()),
            swap: false,
        },
        config_file.path().to_str(),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Currency not supported");
}

#[test_log::test(tokio::test)]
async fn test_convert_command_swaps_pair() {
    // Only the INR endpoint exists, so the request must be based on INR.
    let body = r#"{"base": "INR", "rates": {"INR": 1, "USD": 0.012}}"#;
    let mock_server = test_utils::create_rates_mock_server("INR", 200, body).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fxlive::run_command(
        fxlive::AppCommand::Convert {
            amount: "1000".to_string(),
            from: None,
            to: None,
            swap: true,
        },
        config_file.path().to_str(),
    )
    .await;

    assert!(result.is_ok(), "Conversion failed: {result:?}");
}

#[test_log::test(tokio::test)]
async fn test_convert_command_rejects_invalid_amount() {
    let mock_server = test_utils::create_rates_mock_server("USD", 200, USD_RATES).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fxlive::run_command(
        fxlive::AppCommand::Convert {
            amount: "-3".to_string(),
            from: None,
            to: None,
            swap: false,
        },
        config_file.path().to_str(),
    )
    .await;

    assert_eq!(result.unwrap_err().to_string(), "Enter a positive number");
}

#[test_log::test(tokio::test)]
async fn test_convert_command_reports_source_failure() {
    let mock_server = test_utils::create_rates_mock_server("USD", 503, "").await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fxlive::run_command(
        fxlive::AppCommand::Convert {
            amount: "5".to_string(),
            from: None,
            to: None,
            swap: false,
        },
        config_file.path().to_str(),
    )
    .await;

    assert_eq!(result.unwrap_err().to_string(), "Conversion failed");
}

#[test_log::test(tokio::test)]
async fn test_currencies_fall_back_when_source_fails() {
    let mock_server = test_utils::create_rates_mock_server("USD", 500, "").await;
    let provider = ExchangeRateApiProvider::new(&mock_server.uri(), Duration::from_secs(1)).unwrap();

    let list = fxlive::cli::currencies::load(&provider).await;

    let codes: Vec<&str> = list.codes.iter().map(CurrencyCode::as_str).collect();
    assert_eq!(codes, vec!["USD", "INR"]);
    assert!(list.notice.is_some());
}

#[test_log::test(tokio::test)]
async fn test_currencies_listed_in_source_order() {
    let mock_server = test_utils::create_rates_mock_server("USD", 200, USD_RATES).await;
    let provider = ExchangeRateApiProvider::new(&mock_server.uri(), Duration::from_secs(1)).unwrap();

    let list = fxlive::cli::currencies::load(&provider).await;

    let codes: Vec<&str> = list.codes.iter().map(CurrencyCode::as_str).collect();
    assert_eq!(codes, vec!["USD", "EUR", "GBP", "INR"]);
    assert!(list.notice.is_none());
}

#[test_log::test(tokio::test)]
async fn test_live_poller_with_http_source() {
    let mock_server = test_utils::create_rates_mock_server("USD", 200, USD_RATES).await;
    let settings = PollSettings {
        interval: Duration::from_millis(200),
        request_timeout: Duration::from_millis(150),
        ..PollSettings::default()
    };
    let provider =
        ExchangeRateApiProvider::new(&mock_server.uri(), settings.request_timeout).unwrap();
    let source: Arc<dyn RateSource> = Arc::new(provider);
    let sink = Arc::new(RecordingSink::default());

    let poller =
        LivePoller::new(source, sink.clone(), "USD".parse().unwrap(), settings).unwrap();
    poller.start().await;
    tokio::time::sleep(Duration::from_millis(700)).await;
    poller.stop().await;

    let renders = sink.renders.lock().unwrap().clone();
    info!(renders = renders.len(), "Live poller finished");
    assert!(renders.len() >= 2, "expected several renders, got {}", renders.len());
    assert!(
        renders[0]
            .values()
            .all(|c| *c == ChangeClassification::New)
    );
    assert!(
        renders[1..]
            .iter()
            .flat_map(|r| r.values())
            .all(|c| *c == ChangeClassification::Unchanged)
    );
    assert!(!sink.statuses.lock().unwrap().is_empty());
    assert!(!poller.is_running().await);
}
