//! Core business logic: snapshots, change detection and live polling

pub mod classify;
pub mod config;
pub mod convert;
pub mod currency;
pub mod display;
pub mod error;
pub mod log;
pub mod poller;
pub mod rates;
pub mod sink;

// Re-export main types for cleaner imports
pub use classify::{ChangeClassification, Classifications, Direction, classify};
pub use currency::{CurrencyCode, RateSnapshot};
pub use error::RateError;
pub use poller::{LivePoller, PollSettings, PollerState};
pub use rates::RateSource;
pub use sink::PresentationSink;
