// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Signalgrid State Manager
//!
//! Junction signal state and its durable store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   ModeControl / CountIngest /       │  ← independent callers
//! │   Scheduler tick                    │
//! └─────────────────────────────────────┘
//!           ↓  apply / apply_all
//! ┌─────────────────────────────────────┐
//! │   StateStore                        │  ← one process-wide lock,
//! │   (load → mutate → atomic save)     │    full read-modify-write
//! └─────────────────────────────────────┘
//!           ↓
//! ┌─────────────────────────────────────┐
//! │   state.json                        │  ← temp file + rename
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use signalgrid_state_manager::{Lane, SignalTiming, StateStore, SystemClock};
//!
//! let store = StateStore::new("state.json", SignalTiming::default(), Arc::new(SystemClock));
//!
//! // Record a vehicle count without touching the signal schedule
//! store.apply("Fun Mall", |state| state.lane_counts.set(Lane::East, 12))?;
//!
//! let state = store.get_or_create("Fun Mall")?;
//! println!("{:?} green in {} mode", state.current_green, state.mode);
//! # Ok::<(), signalgrid_state_manager::StateError>(())
//! ```

pub mod clock;
pub mod junction;
pub mod lanes;
pub mod persistence;
pub mod store;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use junction::{
    Deadline, JunctionState, SignalMode, SignalTiming, DEFAULT_BASE_TIME,
    DEFAULT_EMERGENCY_DURATION, DEFAULT_EXTRA_TIME_POOL, INDEFINITE_TIMER_END,
};
pub use lanes::{Lane, LaneMap};
pub use persistence::{load_document, save_document, JunctionDocument, JunctionEntry};
pub use store::StateStore;

/// State manager error types
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Durable write failed; the previous document is intact
    #[error("Failed to persist {path}: {detail}")]
    Persistence { path: String, detail: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Lane identifier outside north/east/south/west
    #[error("Invalid lane: '{0}' (expected north, east, south or west)")]
    InvalidLane(String),

    /// Empty or blank junction name
    #[error("Invalid junction name: '{0}'")]
    InvalidJunctionName(String),

    /// Record breaks a state invariant
    #[error("Invariant violation for junction '{junction}': {detail}")]
    InvariantViolation { junction: String, detail: String },
}

pub type StateResult<T> = std::result::Result<T, StateError>;
