//! Interface to the metrics core, plus an in-memory implementation.
//!
//! ## Key Components
//!
//! - [`Monitor`]: hands out named timers and starts/stops measurements.
//! - [`NamedTimer`]: one named timer; aggregates whatever its implementation
//!   chooses from start/stop events.
//! - [`TimerHandle`]: one running measurement. Stopping is idempotent: only
//!   the first [`stop`](TimerHandle::stop) reaches the timer.
//! - [`StopwatchRegistry`]: thread-safe registry of [`Stopwatch`]es tracking
//!   active count, call count, total and max duration.
//!
//! The monitor is passed to the orchestrator explicitly; there is no global
//! registry.
//!
//! ## Example Usage
//!
//! ```
//! use probekit::monitor::{Monitor, StopwatchRegistry};
//!
//! let registry = StopwatchRegistry::new();
//! let handle = registry.start_timer("svc.conn");
//! assert_eq!(registry.sample("svc.conn").unwrap().active, 1);
//! registry.stop_timer(&handle);
//! registry.stop_timer(&handle); // no effect
//! let sample = registry.sample("svc.conn").unwrap();
//! assert_eq!((sample.active, sample.counter), (0, 1));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::trace;

/// A named timer of the metrics core.
pub trait NamedTimer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Free-form metadata attached to the timer.
    fn note(&self) -> Option<String>;

    /// Sets the note unless one is already present.
    fn set_note_if_unset(&self, note: &str);

    /// A measurement started.
    fn on_start(&self);

    /// A measurement started earlier finished after `elapsed`.
    fn on_stop(&self, elapsed: Duration);
}

/// Source of named timers.
pub trait Monitor: Send + Sync + fmt::Debug {
    /// Returns the timer called `name`, creating it on first use.
    fn named_timer(&self, name: &str) -> Arc<dyn NamedTimer>;

    /// Starts a measurement on the timer called `name`.
    fn start_timer(&self, name: &str) -> TimerHandle {
        TimerHandle::start(self.named_timer(name))
    }

    /// Stops a measurement. Stopping twice has no effect.
    fn stop_timer(&self, handle: &TimerHandle) {
        handle.stop();
    }
}

// ---------------------------------------------------------------------------
// TimerHandle
// ---------------------------------------------------------------------------

/// One running measurement.
pub struct TimerHandle {
    timer: Arc<dyn NamedTimer>,
    started: Instant,
    stopped: AtomicBool,
}

impl TimerHandle {
    /// Starts measuring on `timer`.
    pub fn start(timer: Arc<dyn NamedTimer>) -> Self {
        timer.on_start();
        Self {
            timer,
            started: Instant::now(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Stops the measurement. Returns `false` when it was already stopped.
    pub fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.timer.on_stop(self.started.elapsed());
        true
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    #[inline]
    pub fn timer(&self) -> &Arc<dyn NamedTimer> {
        &self.timer
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.timer.name()
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("timer", &self.timer.name())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Stopwatch
// ---------------------------------------------------------------------------

/// Point-in-time copy of a [`Stopwatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopwatchSample {
    pub name: String,
    pub note: Option<String>,
    /// Measurements started and not yet stopped.
    pub active: u64,
    pub max_active: u64,
    /// Completed measurements.
    pub counter: u64,
    pub total: Duration,
    pub max: Duration,
}

/// In-memory [`NamedTimer`].
#[derive(Debug)]
pub struct Stopwatch {
    name: String,
    note: Mutex<Option<String>>,
    active: AtomicU64,
    max_active: AtomicU64,
    counter: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl Stopwatch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            note: Mutex::new(None),
            active: AtomicU64::new(0),
            max_active: AtomicU64::new(0),
            counter: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            max_nanos: AtomicU64::new(0),
        }
    }

    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    pub fn max_active(&self) -> u64 {
        self.max_active.load(Ordering::Relaxed)
    }

    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed))
    }

    pub fn sample(&self) -> StopwatchSample {
        StopwatchSample {
            name: self.name.clone(),
            note: self.note(),
            active: self.active(),
            max_active: self.max_active(),
            counter: self.counter(),
            total: self.total(),
            max: self.max(),
        }
    }
}

impl NamedTimer for Stopwatch {
    fn name(&self) -> &str {
        &self.name
    }

    fn note(&self) -> Option<String> {
        self.note.lock().clone()
    }

    fn set_note_if_unset(&self, note: &str) {
        let mut current = self.note.lock();
        if current.is_none() {
            *current = Some(note.to_owned());
        }
    }

    fn on_start(&self) {
        let active = self.active.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_active.fetch_max(active, Ordering::Relaxed);
    }

    fn on_stop(&self, elapsed: Duration) {
        // Never below zero, even for a stop without a matching start.
        let _ = self
            .active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.counter.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// StopwatchRegistry
// ---------------------------------------------------------------------------

/// Thread-safe [`Monitor`] backed by a map of [`Stopwatch`]es.
#[derive(Debug, Default)]
pub struct StopwatchRegistry {
    stopwatches: RwLock<FxHashMap<String, Arc<Stopwatch>>>,
}

impl StopwatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stopwatch called `name`, creating it on first use.
    pub fn stopwatch(&self, name: &str) -> Arc<Stopwatch> {
        if let Some(stopwatch) = self.stopwatches.read().get(name) {
            return Arc::clone(stopwatch);
        }
        let mut stopwatches = self.stopwatches.write();
        Arc::clone(stopwatches.entry(name.to_owned()).or_insert_with(|| {
            trace!(name, "created stopwatch");
            Arc::new(Stopwatch::new(name))
        }))
    }

    /// Returns the stopwatch called `name` if it exists.
    pub fn get(&self, name: &str) -> Option<Arc<Stopwatch>> {
        self.stopwatches.read().get(name).cloned()
    }

    pub fn sample(&self, name: &str) -> Option<StopwatchSample> {
        self.get(name).map(|stopwatch| stopwatch.sample())
    }

    /// Names of all stopwatches, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stopwatches.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.stopwatches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stopwatches.read().is_empty()
    }
}

impl Monitor for StopwatchRegistry {
    fn named_timer(&self, name: &str) -> Arc<dyn NamedTimer> {
        self.stopwatch(name)
    }
}
