//! Live rate polling.
//!
//! [`LivePoller`] refreshes a [`RateSnapshot`] for one base currency on a fixed
//! interval, classifies every rate against the previous snapshot and hands the
//! result to a [`PresentationSink`].
//!
//! Fetches run in their own tasks so a slow source never delays the timer.
//! Each cycle takes a sequence token when it starts; a result is applied only
//! if no newer result has been applied yet and no base change or restart
//! happened since the token was issued.

use super::classify::{DEFAULT_CHANGE_EPSILON, classify};
use super::currency::{CurrencyCode, RateSnapshot};
use super::error::RateError;
use super::rates::RateSource;
use super::sink::{PresentationSink, STATUS_FAILED, STATUS_REFRESHING};
use chrono::Local;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub change_epsilon: f64,
    /// Upper bound for a single fetch; expiry counts as a failed cycle.
    pub request_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            change_epsilon: DEFAULT_CHANGE_EPSILON,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl PollSettings {
    /// The interval must be non-zero, the epsilon positive and finite, and the
    /// request timeout non-zero and shorter than the interval.
    pub fn validate(&self) -> Result<(), RateError> {
        if self.interval.is_zero() {
            return Err(RateError::InvalidSettings(
                "interval must be positive".to_string(),
            ));
        }
        if !(self.change_epsilon.is_finite() && self.change_epsilon > 0.0) {
            return Err(RateError::InvalidSettings(format!(
                "change epsilon must be a positive number, got {}",
                self.change_epsilon
            )));
        }
        if self.request_timeout.is_zero() || self.request_timeout >= self.interval {
            return Err(RateError::InvalidSettings(format!(
                "request timeout ({}ms) must be positive and below the interval ({}ms)",
                self.request_timeout.as_millis(),
                self.interval.as_millis()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

struct PollState {
    phase: PollerState,
    base: CurrencyCode,
    previous: Option<RateSnapshot>,
    /// Last token handed out.
    issued: u64,
    /// Token of the last snapshot rendered.
    applied: u64,
    /// Tokens below this belong to a previous base or run.
    floor: u64,
    /// Bumped on every start so a timer from an earlier run cannot issue cycles.
    run: u64,
    timer: Option<JoinHandle<()>>,
}

impl PollState {
    fn issue(&mut self) -> (u64, CurrencyCode) {
        self.issued += 1;
        (self.issued, self.base.clone())
    }

    fn invalidate_in_flight(&mut self) {
        self.floor = self.issued + 1;
    }

    fn accepts(&self, token: u64) -> bool {
        self.phase == PollerState::Running && token >= self.floor && token > self.applied
    }
}

struct Shared {
    source: Arc<dyn RateSource>,
    sink: Arc<dyn PresentationSink>,
    settings: PollSettings,
    state: Mutex<PollState>,
}

pub struct LivePoller {
    shared: Arc<Shared>,
}

impl LivePoller {
    pub fn new(
        source: Arc<dyn RateSource>,
        sink: Arc<dyn PresentationSink>,
        base: CurrencyCode,
        settings: PollSettings,
    ) -> Result<Self, RateError> {
        settings.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                source,
                sink,
                settings,
                state: Mutex::new(PollState {
                    phase: PollerState::Stopped,
                    base,
                    previous: None,
                    issued: 0,
                    applied: 0,
                    floor: 0,
                    run: 0,
                    timer: None,
                }),
            }),
        })
    }

    pub fn settings(&self) -> PollSettings {
        self.shared.settings
    }

    /// Starts polling: one cycle right away, then one per interval.
    /// Does nothing if already running.
    pub async fn start(&self) {
        let mut state = self.shared.state.lock().await;
        if state.phase == PollerState::Running {
            debug!("Live poller already running");
            return;
        }

        state.phase = PollerState::Running;
        state.previous = None;
        state.invalidate_in_flight();
        state.run += 1;

        let timer = tokio::spawn(run_timer(Arc::downgrade(&self.shared), state.run));
        state.timer = Some(timer);

        info!(
            base = %state.base,
            interval_ms = self.shared.settings.interval.as_millis() as u64,
            "Live polling started"
        );
    }

    /// Cancels the timer. Fetches already in flight complete but their results
    /// are dropped.
    pub async fn stop(&self) {
        let mut state = self.shared.state.lock().await;
        if state.phase == PollerState::Stopped {
            return;
        }

        state.phase = PollerState::Stopped;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.invalidate_in_flight();
        info!(base = %state.base, "Live polling stopped");
    }

    /// Switches the base currency.
    ///
    /// The previous snapshot is discarded so the next render carries no change
    /// markers. While running, a cycle for the new base is started immediately;
    /// the timer keeps its schedule.
    pub async fn change_base(&self, base: CurrencyCode) {
        let mut state = self.shared.state.lock().await;
        debug!(from = %state.base, to = %base, "Changing live base currency");

        state.previous = None;
        state.base = base;
        state.invalidate_in_flight();

        if state.phase == PollerState::Running {
            let (token, base) = state.issue();
            self.shared.sink.set_status(STATUS_REFRESHING);
            tokio::spawn(run_cycle(Arc::clone(&self.shared), token, base));
        }
    }

    /// Runs one extra cycle for the current base, keeping the previous
    /// snapshot for comparison. Ignored while stopped.
    pub async fn refresh(&self) {
        let mut state = self.shared.state.lock().await;
        if state.phase != PollerState::Running {
            return;
        }
        let (token, base) = state.issue();
        self.shared.sink.set_status(STATUS_REFRESHING);
        tokio::spawn(run_cycle(Arc::clone(&self.shared), token, base));
    }

    /// Stops polling and releases the poller.
    pub async fn dispose(self) {
        self.stop().await;
    }

    pub async fn state(&self) -> PollerState {
        self.shared.state.lock().await.phase
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == PollerState::Running
    }

    pub async fn base(&self) -> CurrencyCode {
        self.shared.state.lock().await.base.clone()
    }

    /// The snapshot the next cycle will be compared against.
    pub async fn previous(&self) -> Option<RateSnapshot> {
        self.shared.state.lock().await.previous.clone()
    }
}

impl Drop for LivePoller {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.try_lock() {
            state.phase = PollerState::Stopped;
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.invalidate_in_flight();
        }
    }
}

async fn run_timer(shared: Weak<Shared>, run: u64) {
    let interval = match shared.upgrade() {
        Some(shared) => shared.settings.interval,
        None => return,
    };
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately.
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            debug!("Live poller dropped, timer exiting");
            return;
        };

        let mut state = shared.state.lock().await;
        if state.phase != PollerState::Running || state.run != run {
            return;
        }
        let (token, base) = state.issue();
        shared.sink.set_status(STATUS_REFRESHING);
        drop(state);

        tokio::spawn(run_cycle(Arc::clone(&shared), token, base));
    }
}

async fn run_cycle(shared: Arc<Shared>, token: u64, base: CurrencyCode) {
    let limit = shared.settings.request_timeout;
    debug!(token, base = %base, "Fetching live rates");

    let outcome = match timeout(limit, shared.source.fetch_rates(&base)).await {
        Ok(result) => result,
        Err(_) => Err(RateError::SourceUnavailable(format!(
            "request for {base} timed out after {}ms",
            limit.as_millis()
        ))),
    };

    let mut state = shared.state.lock().await;
    if !state.accepts(token) {
        debug!(token, base = %base, "Discarding stale live rate result");
        return;
    }

    match outcome {
        Ok(snapshot) => {
            let classifications = classify(
                state.previous.as_ref(),
                &snapshot,
                shared.settings.change_epsilon,
            );
            shared.sink.render_rates(&snapshot, &classifications);
            shared.sink.set_updated_timestamp(Local::now());
            shared.sink.set_status("");

            debug!(token, rates = snapshot.len(), "Applied live rates");
            state.applied = token;
            state.previous = Some(snapshot);
        }
        Err(e) => {
            warn!(token, base = %base, error = %e, "Live rate refresh failed");
            shared.sink.set_status(STATUS_FAILED);
        }
    }
}
