// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Background scheduler loop
//!
//! One tick takes the store lock once, transitions every junction, and
//! writes the document back at most once. A failing junction is logged and
//! skipped; a failing tick is logged and the loop carries on.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use signalgrid_state_manager::{StateResult, StateStore};
use tracing::{debug, error, info, warn};

use crate::transition::{advance_junction, TransitionOutcome};
use crate::SchedulerError;

/// Default interval between ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Longest single sleep, so `stop()` is noticed quickly
const STOP_CHECK_SLICE: Duration = Duration::from_millis(50);

/// Summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Well-formed junctions looked at
    pub evaluated: usize,
    /// Auto junctions moved to their next lane
    pub advanced: usize,
    /// Emergency holds that reverted to Auto
    pub emergencies_expired: usize,
    /// Malformed or unprocessable junctions left as they were
    pub skipped: usize,
    /// Whether the document was written
    pub persisted: bool,
}

/// Run one scheduler pass over every junction in the store
pub fn run_tick(store: &StateStore) -> StateResult<TickReport> {
    let timing = *store.timing();

    store.apply_all(|document, now| {
        let mut report = TickReport::default();

        for (name, entry) in document.entries_mut() {
            let Some(state) = entry.as_valid_mut() else {
                debug!(target: "signalgrid-scheduler", junction = name, "Skipping malformed junction");
                report.skipped += 1;
                continue;
            };
            report.evaluated += 1;

            // Work on a copy so a failed transition leaves the record untouched
            let mut next = state.clone();
            let outcome = match advance_junction(&mut next, now, &timing) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(target: "signalgrid-scheduler", junction = name, error = %e, "Junction skipped this tick");
                    report.skipped += 1;
                    continue;
                }
            };
            if let Err(e) = next.validate(name) {
                warn!(target: "signalgrid-scheduler", junction = name, error = %e, "Transition produced invalid state, skipped");
                report.skipped += 1;
                continue;
            }

            match outcome {
                TransitionOutcome::Unchanged => continue,
                TransitionOutcome::Advanced { from, to, green_secs } => {
                    debug!(target: "signalgrid-scheduler", junction = name, %from, %to, green_secs, "Advanced green lane");
                    report.advanced += 1;
                }
                TransitionOutcome::EmergencyExpired { lane } => {
                    info!(target: "signalgrid-scheduler", junction = name, %lane, "Emergency hold expired, resuming Auto");
                    report.emergencies_expired += 1;
                }
            }
            *state = next;
        }

        let changed = report.advanced + report.emergencies_expired > 0;
        report.persisted = changed;
        (report, changed)
    })
}

/// Owns the background scheduler thread
pub struct SchedulerRunner {
    store: Arc<StateStore>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl SchedulerRunner {
    pub fn new(store: Arc<StateStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            tick_count: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Start ticking in a background thread
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.poll_interval.is_zero() {
            return Err(SchedulerError::InvalidPollInterval);
        }
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            target: "signalgrid-scheduler",
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            state_file = %self.store.path().display(),
            "Starting signal scheduler"
        );

        let store = self.store.clone();
        let running = self.running.clone();
        let tick_count = self.tick_count.clone();
        let poll_interval = self.poll_interval;

        let handle = thread::Builder::new()
            .name("signalgrid-scheduler".to_string())
            .spawn(move || scheduler_loop(store, poll_interval, running, tick_count))
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                SchedulerError::Spawn(e.to_string())
            })?;
        self.thread_handle = Some(handle);

        Ok(())
    }

    /// Stop the loop and wait (bounded) for the thread to finish
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        info!(target: "signalgrid-scheduler", "Stopping signal scheduler");

        let Some(handle) = self.thread_handle.take() else {
            return;
        };

        // A tick holds the store lock for one read and one write, so this is generous
        let stop_timeout = Duration::from_secs(2);
        let (tx, rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(handle.join());
        });

        match rx.recv_timeout(stop_timeout) {
            Ok(Ok(())) => info!(target: "signalgrid-scheduler", "Signal scheduler stopped"),
            Ok(Err(_)) => warn!(target: "signalgrid-scheduler", "Scheduler thread panicked during shutdown"),
            Err(_) => warn!(
                target: "signalgrid-scheduler",
                timeout_ms = stop_timeout.as_millis() as u64,
                "Scheduler thread did not stop in time, detaching"
            ),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ticks completed by the background loop since creation
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    /// Run one tick on the calling thread
    pub fn tick_now(&self) -> StateResult<TickReport> {
        run_tick(&self.store)
    }
}

impl Drop for SchedulerRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn scheduler_loop(
    store: Arc<StateStore>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
) {
    while running.load(Ordering::Acquire) {
        match panic::catch_unwind(AssertUnwindSafe(|| run_tick(&store))) {
            Ok(Ok(report)) => {
                if report.persisted {
                    debug!(
                        target: "signalgrid-scheduler",
                        advanced = report.advanced,
                        emergencies_expired = report.emergencies_expired,
                        skipped = report.skipped,
                        "Tick applied"
                    );
                }
            }
            Ok(Err(e)) => {
                error!(target: "signalgrid-scheduler", error = %e, "Scheduler tick failed");
            }
            Err(_) => {
                error!(target: "signalgrid-scheduler", "Scheduler tick panicked");
            }
        }
        tick_count.fetch_add(1, Ordering::Relaxed);

        let tick_deadline = Instant::now() + poll_interval;
        while running.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= tick_deadline {
                break;
            }
            thread::sleep((tick_deadline - now).min(STOP_CHECK_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalgrid_state_manager::{
        Deadline, JunctionState, Lane, ManualClock, SignalMode, SignalTiming,
    };
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path, now: f64) -> (Arc<StateStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(StateStore::new(
            dir.join("state.json"),
            SignalTiming::default(),
            clock.clone(),
        ));
        (store, clock)
    }

    #[test]
    fn test_tick_advances_expired_junctions_only() {
        let dir = tempdir().unwrap();
        let (store, clock) = setup(dir.path(), 1_000.0);
        store.get_or_create("a").unwrap();
        clock.advance(30.0);
        store.get_or_create("b").unwrap();

        clock.advance(31.0); // a expired at 1060, b runs until 1090
        let report = run_tick(&store).unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.advanced, 1);
        assert!(report.persisted);
        assert_eq!(store.read("a").unwrap().current_green, Some(Lane::East));
        assert_eq!(store.read("b").unwrap().current_green, Some(Lane::North));
    }

    #[test]
    fn test_idle_tick_does_not_write() {
        let dir = tempdir().unwrap();
        let (store, _clock) = setup(dir.path(), 1_000.0);
        store.get_or_create("a").unwrap();
        let modified = std::fs::metadata(store.path()).unwrap().modified().unwrap();

        let report = run_tick(&store).unwrap();
        assert!(!report.persisted);
        assert_eq!(
            std::fs::metadata(store.path()).unwrap().modified().unwrap(),
            modified
        );
    }

    #[test]
    fn test_malformed_junction_does_not_block_others() {
        let dir = tempdir().unwrap();
        let (store, _clock) = setup(dir.path(), 5_000.0);

        let mut expired = JunctionState::new(&SignalTiming::default(), 0.0);
        expired.timer_end = Deadline::At(10.0);
        let bad = serde_json::json!({"mode": "Auto", "current_green": "sideways"});
        let document = serde_json::json!({
            "bad": bad,
            "good": serde_json::to_value(&expired).unwrap(),
        });
        std::fs::write(store.path(), document.to_string()).unwrap();

        let report = run_tick(&store).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.advanced, 1);
        assert_eq!(store.read("good").unwrap().current_green, Some(Lane::East));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["bad"], bad);
    }

    #[test]
    fn test_unreadable_document_tick_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let clock = Arc::new(ManualClock::new(0.0));
        let store = StateStore::new(&path, SignalTiming::default(), clock);
        std::fs::create_dir(&path).unwrap();

        // Unreadable document is empty, so nothing changes and nothing is written
        assert_eq!(run_tick(&store).unwrap(), TickReport::default());
    }

    #[test]
    fn test_runner_lifecycle() {
        let dir = tempdir().unwrap();
        let (store, clock) = setup(dir.path(), 1_000.0);
        store.get_or_create("a").unwrap();
        clock.advance(61.0);

        let mut runner = SchedulerRunner::new(store.clone(), Duration::from_millis(10));
        runner.start().unwrap();
        assert!(runner.is_running());
        assert!(matches!(runner.start(), Err(SchedulerError::AlreadyRunning)));

        let deadline = Instant::now() + Duration::from_secs(5);
        while runner.tick_count() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        runner.stop();
        assert!(!runner.is_running());
        assert!(runner.tick_count() >= 1);

        let state = store.read("a").unwrap();
        assert_eq!(state.mode, SignalMode::Auto);
        assert_eq!(state.current_green, Some(Lane::East));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let dir = tempdir().unwrap();
        let (store, _clock) = setup(dir.path(), 0.0);
        let mut runner = SchedulerRunner::new(store, Duration::ZERO);
        assert!(matches!(runner.start(), Err(SchedulerError::InvalidPollInterval)));
        assert!(!runner.is_running());
    }
}
