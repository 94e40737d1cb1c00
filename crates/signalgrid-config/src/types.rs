// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `signalgrid.toml`. Every section is `serde(default)`, so a partial file
//! (or no file at all) yields working values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalgridConfig {
    pub system: SystemConfig,
    pub store: StoreConfig,
    pub timing: TimingConfig,
    pub scheduler: SchedulerConfig,
    pub junctions: JunctionsConfig,
    pub logging: LoggingConfig,
}

impl SignalgridConfig {
    /// Location of the persisted junction document
    ///
    /// A relative `store.state_file` is resolved against `system.data_dir`.
    pub fn state_file_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.store.state_file);
        if file.is_absolute() {
            file
        } else {
            self.system.data_dir.join(file)
        }
    }
}

/// System-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            log_level: "info".to_string(),
        }
    }
}

/// Durable junction store
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub state_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_file: "state.json".to_string(),
        }
    }
}

/// Green-time allocation constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Guaranteed green per lane per cycle
    pub base_time_secs: u32,
    /// Seconds shared across lanes by vehicle share
    pub extra_time_pool_secs: u32,
    /// Length of an emergency hold
    pub emergency_duration_secs: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_time_secs: 60,
            extra_time_pool_secs: 60,
            emergency_duration_secs: 120,
        }
    }
}

/// Periodic scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub poll_interval_ms: u64,
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            enabled: true,
        }
    }
}

/// Junctions created with defaults at startup
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JunctionsConfig {
    pub preset: Vec<String>,
}

/// Log output
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub file_logging: bool,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            file_logging: false,
            retention_days: 7,
            retention_runs: 10,
        }
    }
}
