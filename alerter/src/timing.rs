//! Time sources and time-based alert throttling
//!
//! Everything that depends on "now" takes it as an explicit argument so the
//! rules can be driven by a `ManualClock` in tests.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current time
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

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Allows a task to be repeated only once per interval
#[derive(Debug, Clone)]
pub struct TimedTaskLimiter {
    interval: Duration,
    last_time_that_did_task: Option<DateTime<Utc>>,
}

impl TimedTaskLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_time_that_did_task: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_time_that_did_task(&self) -> Option<DateTime<Utc>> {
        self.last_time_that_did_task
    }

    pub fn can_do_task(&self, now: DateTime<Utc>) -> bool {
        match self.last_time_that_did_task {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    pub fn did_task(&mut self, now: DateTime<Utc>) {
        self.last_time_that_did_task = Some(now);
    }

    pub fn set_last_time_that_did_task(&mut self, at: DateTime<Utc>) {
        self.last_time_that_did_task = Some(at);
    }

    pub fn reset(&mut self) {
        self.last_time_that_did_task = None;
    }
}

/// Counts occurrences inside a rolling window that ends at the supplied time
#[derive(Debug, Clone)]
pub struct TimedOccurrenceTracker {
    max_occurrences: usize,
    interval: Duration,
    occurrences: Vec<DateTime<Utc>>,
}

impl TimedOccurrenceTracker {
    pub fn new(max_occurrences: usize, interval: Duration) -> Self {
        Self {
            max_occurrences,
            interval,
            occurrences: Vec::new(),
        }
    }

    pub fn max_occurrences(&self) -> usize {
        self.max_occurrences
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Human readable form of the window, e.g. `1h, 2m, 3s`
    pub fn interval_pretty(&self) -> String {
        pretty_duration(self.interval)
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn action_happened(&mut self, at: DateTime<Utc>) {
        self.occurrences.push(at);
        self.occurrences.sort();
        self.prune(at);
    }

    pub fn too_many_occurrences(&mut self, at: DateTime<Utc>) -> bool {
        self.prune(at);
        self.occurrences.len() > self.max_occurrences
    }

    pub fn reset(&mut self) {
        self.occurrences.clear();
    }

    // The window's lower bound is open: `at - interval` itself is evicted.
    fn prune(&mut self, at: DateTime<Utc>) {
        let lower = at - self.interval;
        self.occurrences.retain(|t| *t > lower);
    }
}

/// Formats a duration as `{hours}h, {minutes}m, {seconds}s`
pub fn pretty_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}h, {}m, {}s", hours, minutes, seconds)
}
