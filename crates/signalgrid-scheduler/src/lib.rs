// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Signalgrid Scheduler
//!
//! Periodic signal scheduler for every junction in a [`StateStore`].
//!
//! Each tick:
//! - `Auto` junctions whose green interval has ended move to the next lane in
//!   `north → east → south → west → north` order, with green times
//!   recomputed from the latest vehicle counts
//!   ([`allocate_green_times`]).
//! - `Emergency` holds that have run out revert to `Auto` on the same lane.
//! - `Manual` and `Stop` junctions are left alone.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use signalgrid_scheduler::{SchedulerRunner, DEFAULT_POLL_INTERVAL};
//! use signalgrid_state_manager::{SignalTiming, StateStore, SystemClock};
//!
//! let store = Arc::new(StateStore::new("state.json", SignalTiming::default(), Arc::new(SystemClock)));
//! let mut runner = SchedulerRunner::new(store, DEFAULT_POLL_INTERVAL);
//! runner.start()?;
//! // ...
//! runner.stop();
//! # Ok::<(), signalgrid_scheduler::SchedulerError>(())
//! ```
//!
//! [`StateStore`]: signalgrid_state_manager::StateStore

pub mod allocation;
pub mod runner;
pub mod transition;

pub use allocation::allocate_green_times;
pub use runner::{run_tick, SchedulerRunner, TickReport, DEFAULT_POLL_INTERVAL};
pub use transition::{advance_junction, TransitionError, TransitionOutcome};

/// Scheduler lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    #[error("Failed to spawn scheduler thread: {0}")]
    Spawn(String),
}
