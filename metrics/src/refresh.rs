//! Per-workspace cache of metrics snapshots and the refresh policy in front of the collectors.

use crate::{
    collectors::Collector,
    metrics::ContentMetrics,
    FetchError,
    RateLimitError,
};
use chrono::{
    DateTime,
    TimeDelta,
    Utc,
};
use content_pipeline_config::Config;
use eyre::{
    Context,
    Result,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Mutex,
        PoisonError,
    },
};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Cached snapshots younger than this are served without a fetch.
    pub refresh_interval: TimeDelta,
    /// Added to the cache timestamp when the tracker throttles us.
    pub rate_limit_cooldown: TimeDelta,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            refresh_interval: TimeDelta::hours(1),
            rate_limit_cooldown: TimeDelta::hours(1),
        }
    }
}

impl RefreshSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            refresh_interval: TimeDelta::from_std(config.refresh_interval).wrap_err("refresh_interval out of range")?,
            rate_limit_cooldown: TimeDelta::from_std(config.rate_limit_cooldown)
                .wrap_err("rate_limit_cooldown out of range")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub metrics: ContentMetrics,
    pub fetched_at: DateTime<Utc>,
}

/// Lifecycle of one workspace on the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RefreshState {
    #[default]
    Empty,
    Loading {
        retained: Option<Snapshot>,
    },
    Ready {
        snapshot: Snapshot,
    },
    RateLimited {
        retained: Option<Snapshot>,
        message: String,
        until: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    Started,
    Succeeded(Snapshot),
    RateLimited { message: String, until: DateTime<Utc> },
    /// A failure that is not surfaced, the previous data stays.
    Failed,
    ErrorDismissed,
    CooldownElapsed,
}

impl RefreshState {
    fn settle(retained: Option<Snapshot>) -> Self {
        match retained {
            Some(snapshot) => RefreshState::Ready { snapshot },
            None => RefreshState::Empty,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            RefreshState::Empty => None,
            RefreshState::Loading { retained } | RefreshState::RateLimited { retained, .. } => retained.as_ref(),
            RefreshState::Ready { snapshot } => Some(snapshot),
        }
    }

    fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            RefreshState::Empty => None,
            RefreshState::Loading { retained } | RefreshState::RateLimited { retained, .. } => retained,
            RefreshState::Ready { snapshot } => Some(snapshot),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RefreshState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RefreshState::RateLimited { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Transition table. Completions are accepted from any state, so the last one to finish wins.
    pub fn apply(self, event: RefreshEvent) -> Self {
        use RefreshEvent as E;
        use RefreshState as S;

        match (self, event) {
            (state, E::Started) => S::Loading {
                retained: state.into_snapshot(),
            },
            (_, E::Succeeded(snapshot)) => S::Ready { snapshot },
            (state, E::RateLimited { message, until }) => S::RateLimited {
                retained: state.into_snapshot(),
                message,
                until,
            },
            (S::Loading { retained }, E::Failed) => S::settle(retained),
            (S::RateLimited { retained, .. }, E::ErrorDismissed | E::CooldownElapsed) => S::settle(retained),
            (state, event) => {
                trace!(?state, ?event, "ignoring refresh event");
                state
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    state: RefreshState,
    /// Effective cache timestamp, pushed into the future while rate limited.
    cached_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn transition(&mut self, event: RefreshEvent) {
        self.state = std::mem::take(&mut self.state).apply(event);
    }

    fn expire_cooldown(&mut self, now: DateTime<Utc>) {
        if let RefreshState::RateLimited { until, .. } = &self.state {
            if now >= *until {
                self.transition(RefreshEvent::CooldownElapsed);
            }
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>, refresh_interval: TimeDelta) -> bool {
        self.cached_at.is_some_and(|cached_at| now - cached_at < refresh_interval)
    }

    fn view(&self, workspace: &str) -> DashboardView {
        let snapshot = self.state.snapshot();
        DashboardView {
            workspace: workspace.to_string(),
            metrics: snapshot.map(|snapshot| snapshot.metrics.clone()),
            loading: self.state.is_loading(),
            error: self.state.error().map(str::to_string),
            last_updated: snapshot.map(|snapshot| snapshot.fetched_at),
        }
    }
}

/// Everything the presentation layer gets to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub workspace: String,
    pub metrics: Option<ContentMetrics>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Serves cached snapshots while fresh and asks the collector for new ones otherwise.
///
/// Concurrent refreshes of the same workspace are not serialised: each one fetches and the last to complete
/// overwrites the cache.
pub struct RefreshController<C, K = SystemClock> {
    collector: C,
    clock: K,
    settings: RefreshSettings,
    entries: Mutex<HashMap<String, CacheEntry>>,
    fetches: AtomicUsize,
}

impl<C: Collector, K: Clock> RefreshController<C, K> {
    pub fn new(collector: C, clock: K, settings: RefreshSettings) -> Self {
        Self {
            collector,
            clock,
            settings,
            entries: Default::default(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn with_entry<T>(&self, workspace: &str, f: impl FnOnce(&mut CacheEntry) -> T) -> T {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f(entries.entry(workspace.to_string()).or_default())
    }

    pub fn view(&self, workspace: &str) -> DashboardView {
        let now = self.clock.now();
        self.with_entry(workspace, |entry| {
            entry.expire_cooldown(now);
            entry.view(workspace)
        })
    }

    /// Hide the rate limit banner. The throttled cache timestamp stays in place.
    pub fn dismiss_error(&self, workspace: &str) {
        self.with_entry(workspace, |entry| entry.transition(RefreshEvent::ErrorDismissed));
    }

    /// Bring the snapshot of `workspace` up to date.
    ///
    /// Only throttling is reported as an error. Any other failure is logged and leaves the previous data in place.
    pub async fn refresh(&self, workspace: &str, force: bool) -> Result<DashboardView, RateLimitError> {
        let now = self.clock.now();
        let cached = self.with_entry(workspace, |entry| {
            entry.expire_cooldown(now);
            if !force && entry.is_fresh(now, self.settings.refresh_interval) {
                return Some(entry.view(workspace));
            }
            entry.transition(RefreshEvent::Started);
            None
        });
        if let Some(view) = cached {
            debug!(workspace, "serving cached metrics");
            return Ok(view);
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!(workspace, force, collector = self.collector.name(), "fetching metrics");
        let result = self.collector.collect(workspace, now).await;
        let finished = self.clock.now();

        self.with_entry(workspace, |entry| match result {
            Ok(metrics) => {
                entry.transition(RefreshEvent::Succeeded(Snapshot {
                    metrics,
                    fetched_at: finished,
                }));
                entry.cached_at = Some(finished);
                Ok(entry.view(workspace))
            }
            Err(FetchError::RateLimit(err)) => {
                let until = finished
                    .checked_add_signed(self.settings.rate_limit_cooldown)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                warn!(workspace, detail = %err.detail, %until, "rate limited, backing off");
                entry.transition(RefreshEvent::RateLimited {
                    message: err.message.clone(),
                    until,
                });
                entry.cached_at = Some(until);
                Err(err)
            }
            Err(err) => {
                error!(workspace, error = %err, "refreshing metrics failed, keeping previous data");
                entry.transition(RefreshEvent::Failed);
                Ok(entry.view(workspace))
            }
        })
    }
}
