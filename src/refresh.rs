//! Manual and scheduled refreshing of a single sheet.
//!
//! [`RefreshController`] is owned by one event loop. It never blocks: fetches
//! and the interval timer run as spawned tasks that report back through a
//! [`RefreshEvent`] channel, and the owner feeds those events to
//! [`RefreshController::handle_event`]. All state changes therefore happen on
//! the owner's thread of control, in the order events are handled.

use crate::feed::{FeedRecord, FeedSource, FetchError, FetchedFeed, SheetsClient, SourceKey};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Message shown to the user for any failed fetch. Details only go to the log.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to load feed data. Please try again later.";

/// Refresh intervals offered by the dashboard, in seconds.
pub const REFRESH_INTERVAL_CHOICES: &[u64] = &[10, 30, 60, 300, 600, 1800, 3600];

/// Human-readable label for a refresh interval ("Every 5 minutes").
pub fn interval_label(secs: u64) -> String {
    fn unit(n: u64, singular: &str) -> String {
        if n == 1 {
            format!("Every {singular}")
        } else {
            format!("Every {n} {singular}s")
        }
    }

    if secs >= 3600 && secs % 3600 == 0 {
        unit(secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        unit(secs / 60, "minute")
    } else {
        unit(secs, "second")
    }
}

/// The next larger entry of [`REFRESH_INTERVAL_CHOICES`], wrapping around.
pub fn next_interval(current: u64) -> u64 {
    REFRESH_INTERVAL_CHOICES
        .iter()
        .copied()
        .find(|&choice| choice > current)
        .unwrap_or(REFRESH_INTERVAL_CHOICES[0])
}

/// Lifecycle of the controller's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Nothing fetched yet for the current source.
    Idle,
    /// A foreground fetch is in flight.
    Loading,
    /// The last completed fetch succeeded.
    Ready,
    /// The last completed fetch failed.
    Error,
}

/// Auto-refresh settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Schedule {
    /// True when a timer should be running.
    pub fn is_active(&self) -> bool {
        self.enabled && self.interval_secs > 0
    }
}

/// Messages from the controller's background tasks.
#[derive(Debug)]
pub enum RefreshEvent {
    /// The interval timer fired. `timer` identifies which timer, so ticks
    /// already queued by a canceled timer can be ignored.
    Tick { timer: u64 },
    /// A fetch finished.
    Completed {
        source: SourceKey,
        manual: bool,
        result: Result<FetchedFeed, FetchError>,
    },
}

/// Owns the fetched records for one source and the timer that refreshes them.
///
/// Manual and scheduled fetches are not coalesced: a manual refresh issued
/// while a background refresh is in flight starts a second request, and
/// whichever completes last wins. Canceling the timer never aborts a fetch
/// already in flight.
///
/// Dropping the controller cancels its timer.
pub struct RefreshController<S: FeedSource = SheetsClient> {
    feed_source: S,
    source: SourceKey,
    event_tx: mpsc::Sender<RefreshEvent>,
    state: RefreshState,
    items: Arc<Vec<FeedRecord>>,
    error: Option<&'static str>,
    last_updated_at: Option<DateTime<Utc>>,
    auto_refreshing: bool,
    keep_items_on_error: bool,
    schedule: Schedule,
    timer: Option<JoinHandle<()>>,
    timer_id: u64,
}

impl<S: FeedSource> RefreshController<S> {
    /// Create an idle controller. Nothing is fetched until [`start`](Self::start)
    /// or [`refresh_now`](Self::refresh_now).
    ///
    /// With `keep_items_on_error`, records from the last good fetch stay
    /// visible alongside the error message; otherwise an error hides them.
    pub fn new(
        feed_source: S,
        source: SourceKey,
        event_tx: mpsc::Sender<RefreshEvent>,
        keep_items_on_error: bool,
    ) -> Self {
        Self {
            feed_source,
            source,
            event_tx,
            state: RefreshState::Idle,
            items: Arc::new(Vec::new()),
            error: None,
            last_updated_at: None,
            auto_refreshing: false,
            keep_items_on_error,
            schedule: Schedule {
                enabled: false,
                interval_secs: 0,
            },
            timer: None,
            timer_id: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------------

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn source(&self) -> &SourceKey {
        &self.source
    }

    /// Records from the last successful fetch, regardless of error state.
    pub fn items(&self) -> &Arc<Vec<FeedRecord>> {
        &self.items
    }

    /// Records the dashboard should display, honoring the error policy.
    pub fn visible_items(&self) -> &[FeedRecord] {
        if self.error.is_some() && !self.keep_items_on_error {
            &[]
        } else {
            self.items.as_slice()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == RefreshState::Loading
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refreshing
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated_at
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// True while an interval timer is running.
    pub fn is_scheduled(&self) -> bool {
        self.timer.is_some()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Install `schedule` and run the initial foreground fetch.
    pub fn start(&mut self, schedule: Schedule) {
        self.set_schedule(schedule.enabled, schedule.interval_secs);
        self.trigger_fetch(true);
    }

    /// Cancel the timer. In-flight fetches still deliver their results.
    pub fn stop(&mut self) {
        self.cancel_timer();
    }

    /// Switch to another sheet.
    ///
    /// Drops the old source's records and error, restarts the timer so the
    /// first tick is a full interval away, and fetches the new source.
    /// Results still in flight for the old source are discarded on arrival.
    pub fn set_source(&mut self, source: SourceKey) {
        tracing::info!(from = %self.source, to = %source, "Switching feed source");
        self.source = source;
        self.state = RefreshState::Idle;
        self.items = Arc::new(Vec::new());
        self.error = None;
        self.last_updated_at = None;
        self.auto_refreshing = false;

        let Schedule {
            enabled,
            interval_secs,
        } = self.schedule;
        self.set_schedule(enabled, interval_secs);
        self.trigger_fetch(true);
    }

    /// Replace the auto-refresh schedule.
    ///
    /// Any running timer is canceled first. A new timer is started only when
    /// `enabled` and `interval_secs > 0`; its first tick comes one full
    /// interval from now.
    pub fn set_schedule(&mut self, enabled: bool, interval_secs: u64) {
        self.cancel_timer();
        self.schedule = Schedule {
            enabled,
            interval_secs,
        };

        if self.schedule.is_active() {
            self.spawn_timer();
        }
    }

    /// Alias of [`set_schedule`](Self::set_schedule) matching the dashboard's
    /// "auto-refresh" and "interval" controls.
    pub fn configure(&mut self, auto_refresh: bool, interval_secs: u64) {
        self.set_schedule(auto_refresh, interval_secs);
    }

    /// User-initiated refresh.
    pub fn refresh_now(&mut self) -> bool {
        self.trigger_fetch(true)
    }

    /// Start a fetch unless one is already loading.
    ///
    /// A background (`manual == false`) fetch over existing data only raises
    /// the auto-refreshing flag so the current list stays on screen; a second
    /// background fetch is not started while one is in flight. Returns whether
    /// a fetch was started.
    pub fn trigger_fetch(&mut self, manual: bool) -> bool {
        if self.state == RefreshState::Loading {
            tracing::debug!(manual, "Fetch already loading, skipping");
            return false;
        }

        let has_result = matches!(self.state, RefreshState::Ready | RefreshState::Error);
        if !manual && has_result {
            if self.auto_refreshing {
                tracing::debug!("Background refresh already in flight, skipping");
                return false;
            }
            self.auto_refreshing = true;
        } else {
            self.state = RefreshState::Loading;
        }
        self.error = None;

        self.spawn_fetch(manual);
        true
    }

    /// Apply a background task's event. Returns true if visible state changed.
    pub fn handle_event(&mut self, event: RefreshEvent) -> bool {
        match event {
            RefreshEvent::Tick { timer } => {
                if self.timer.is_none() || timer != self.timer_id {
                    tracing::debug!(timer, current = self.timer_id, "Ignoring stale timer tick");
                    return false;
                }
                self.trigger_fetch(false)
            }
            RefreshEvent::Completed {
                source,
                manual,
                result,
            } => {
                if source != self.source {
                    tracing::debug!(source = %source, "Discarding result for previous source");
                    return false;
                }
                self.apply_result(manual, result);
                true
            }
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn apply_result(&mut self, manual: bool, result: Result<FetchedFeed, FetchError>) {
        match result {
            Ok(feed) => {
                tracing::debug!(
                    source = %self.source,
                    manual,
                    records = feed.records.len(),
                    "Refresh complete"
                );
                self.items = Arc::new(feed.records);
                self.last_updated_at = Some(feed.fetched_at);
                self.error = None;
                self.state = RefreshState::Ready;
            }
            Err(e) => {
                tracing::warn!(source = %self.source, manual, error = %e, "Refresh failed");
                self.error = Some(FETCH_ERROR_MESSAGE);
                self.state = RefreshState::Error;
            }
        }
        self.auto_refreshing = false;
    }

    fn spawn_fetch(&self, manual: bool) {
        let feed_source = self.feed_source.clone();
        let source = self.source.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = match AssertUnwindSafe(feed_source.load(&source))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => Err(FetchError::TaskPanicked(panic_message(panic.as_ref()))),
            };

            let event = RefreshEvent::Completed {
                source,
                manual,
                result,
            };
            if let Err(e) = tx.send(event).await {
                tracing::debug!(error = %e, "Refresh result dropped (receiver gone)");
            }
        });
    }

    fn spawn_timer(&mut self) {
        self.timer_id = self.timer_id.wrapping_add(1);
        let timer = self.timer_id;
        let period = Duration::from_secs(self.schedule.interval_secs);
        let tx = self.event_tx.clone();

        tracing::debug!(
            timer,
            interval_secs = self.schedule.interval_secs,
            "Starting refresh timer"
        );

        self.timer = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(RefreshEvent::Tick { timer }).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
            tracing::debug!(timer = self.timer_id, "Canceled refresh timer");
        }
    }
}

impl<S: FeedSource> Drop for RefreshController<S> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
