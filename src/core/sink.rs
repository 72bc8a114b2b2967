//! Where the live poller sends its output

use super::classify::Classifications;
use super::currency::RateSnapshot;
use chrono::{DateTime, Local};

pub const STATUS_REFRESHING: &str = "Refreshing…";
pub const STATUS_FAILED: &str = "Failed to load live rates";

/// Receives rendered state from the live poller.
///
/// Calls are made while the poller holds its state lock, so implementations
/// must not block or call back into the poller.
pub trait PresentationSink: Send + Sync {
    /// Replaces the displayed table. The sink diffs against whatever it drew
    /// before; the classifications say which rows moved.
    fn render_rates(&self, snapshot: &RateSnapshot, classifications: &Classifications);

    /// Transient status line. An empty message clears it.
    fn set_status(&self, message: &str);

    fn set_updated_timestamp(&self, time: DateTime<Local>);
}
