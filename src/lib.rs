// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # signalgrid - Adaptive Traffic Signal Controller
//!
//! Four-way junction controller: green time is split across lanes in
//! proportion to observed vehicle counts, operators can force a lane, hold
//! an emergency lane or halt a junction, and every junction's state is kept
//! in a single durable JSON document.
//!
//! ## Crates
//!
//! - [`config`]: `signalgrid.toml` loading with environment/CLI overrides
//! - [`observability`]: logging setup and per-crate debug flags
//! - [`state_manager`]: junction records and the lock-serialised store
//! - [`scheduler`]: green-time allocation and the periodic tick
//! - [`services`]: transport-agnostic mode control, count ingest and queries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use signalgrid::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_or_default(None, None)?;
//! let mut runtime = SignalRuntime::from_config(config)?;
//! runtime.start()?;
//!
//! runtime.counts().update_counts("Fun Mall", Lane::East, 14).await?;
//! runtime.mode_control().set_emergency("Fun Mall", Lane::South).await?;
//!
//! runtime.stop();
//! # Ok(())
//! # }
//! ```

pub mod feed;
pub mod runtime;

pub use feed::{FeedMessage, FeedReply};
pub use runtime::{RuntimeError, RuntimeResult, SignalRuntime};

pub use signalgrid_config as config;
pub use signalgrid_observability as observability;
pub use signalgrid_scheduler as scheduler;
pub use signalgrid_services as services;
pub use signalgrid_state_manager as state_manager;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::feed::{FeedMessage, FeedReply};
    pub use crate::runtime::{RuntimeError, SignalRuntime};
    pub use signalgrid_config::{load_config, load_config_or_default, SignalgridConfig};
    pub use signalgrid_services::{
        ControlRequest, CountIngestService, CountObservation, JunctionQueryService, JunctionView,
        ModeControlService, ServiceError, ServiceResult,
    };
    pub use signalgrid_state_manager::{
        Deadline, JunctionState, Lane, LaneMap, SignalMode, SignalTiming, StateStore,
    };
}
