// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide signal runtime
//!
//! `SignalRuntime` is built once from configuration and owns everything a
//! running controller needs: the shared store, the three services and the
//! scheduler thread.

use std::sync::Arc;
use std::time::Duration;

use signalgrid_config::{validate_config, ConfigError, SignalgridConfig, TimingConfig};
use signalgrid_scheduler::{SchedulerError, SchedulerRunner};
use signalgrid_services::{
    CountIngestService, CountIngestServiceImpl, JunctionQueryService, JunctionQueryServiceImpl,
    ModeControlService, ModeControlServiceImpl,
};
use signalgrid_state_manager::{Clock, SignalTiming, StateError, StateStore, SystemClock};
use tracing::{info, warn};

/// Runtime construction and lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Map the `[timing]` section onto the scheduler constants
pub fn timing_from_config(timing: &TimingConfig) -> SignalTiming {
    SignalTiming {
        base_time: timing.base_time_secs,
        extra_time_pool: timing.extra_time_pool_secs,
        emergency_duration: timing.emergency_duration_secs,
    }
}

pub struct SignalRuntime {
    config: SignalgridConfig,
    store: Arc<StateStore>,
    mode_control: Arc<dyn ModeControlService>,
    counts: Arc<dyn CountIngestService>,
    queries: Arc<dyn JunctionQueryService>,
    scheduler: SchedulerRunner,
}

impl SignalRuntime {
    /// Build the runtime on the system clock
    pub fn from_config(config: SignalgridConfig) -> RuntimeResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build the runtime on an explicit clock
    ///
    /// Validates the configuration, creates the state file's directory and
    /// makes sure every preset junction exists. The scheduler is not started.
    pub fn with_clock(config: SignalgridConfig, clock: Arc<dyn Clock>) -> RuntimeResult<Self> {
        validate_config(&config)?;

        let path = config.state_file_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StateError::from)?;
            }
        }

        let timing = timing_from_config(&config.timing);
        let store = Arc::new(StateStore::new(path, timing, clock));

        for name in &config.junctions.preset {
            store.get_or_create(name)?;
        }

        let scheduler = SchedulerRunner::new(
            Arc::clone(&store),
            Duration::from_millis(config.scheduler.poll_interval_ms),
        );

        info!(
            target: "signalgrid",
            state_file = %store.path().display(),
            presets = config.junctions.preset.len(),
            "Signal runtime initialised"
        );

        Ok(Self {
            mode_control: Arc::new(ModeControlServiceImpl::new(Arc::clone(&store))),
            counts: Arc::new(CountIngestServiceImpl::new(Arc::clone(&store))),
            queries: Arc::new(JunctionQueryServiceImpl::new(Arc::clone(&store))),
            config,
            store,
            scheduler,
        })
    }

    /// Start the scheduler, unless disabled in `[scheduler]`
    pub fn start(&mut self) -> RuntimeResult<()> {
        if !self.config.scheduler.enabled {
            warn!(target: "signalgrid", "Scheduler disabled by configuration; junctions will not advance");
            return Ok(());
        }
        self.scheduler.start()?;
        Ok(())
    }

    /// Stop the scheduler; returns once the loop has exited or the stop
    /// timeout has passed
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn config(&self) -> &SignalgridConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &SchedulerRunner {
        &self.scheduler
    }

    pub fn mode_control(&self) -> &Arc<dyn ModeControlService> {
        &self.mode_control
    }

    pub fn counts(&self) -> &Arc<dyn CountIngestService> {
        &self.counts
    }

    pub fn queries(&self) -> &Arc<dyn JunctionQueryService> {
        &self.queries
    }
}

impl Drop for SignalRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}
