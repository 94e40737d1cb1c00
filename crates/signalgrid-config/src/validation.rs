// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are within valid ranges before the runtime
//! is built. Every problem is collected and reported together.

use std::collections::HashSet;

use crate::{ConfigError, ConfigResult, SignalgridConfig};

/// Accepted `system.log_level` values (case-insensitive)
pub const KNOWN_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &SignalgridConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);
    validate_presets(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &SignalgridConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.store.state_file.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "store.state_file".to_string(),
        });
    }
}

fn validate_value_ranges(config: &SignalgridConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.timing.base_time_secs == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "timing.base_time_secs".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.timing.emergency_duration_secs == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "timing.emergency_duration_secs".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let poll = config.scheduler.poll_interval_ms;
    if !(10..=60_000).contains(&poll) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "scheduler.poll_interval_ms".to_string(),
            reason: format!("{} is outside 10-60000", poll),
        });
    }

    let level = config.system.log_level.to_lowercase();
    if !KNOWN_LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "system.log_level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.system.log_level,
                KNOWN_LOG_LEVELS.join(", ")
            ),
        });
    }
}

fn validate_presets(config: &SignalgridConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut seen = HashSet::new();
    for name in &config.junctions.preset {
        if name.trim().is_empty() {
            errors.push(ConfigValidationError::InvalidValue {
                field: "junctions.preset".to_string(),
                reason: "junction names must not be blank".to_string(),
            });
        } else if !seen.insert(name.as_str()) {
            errors.push(ConfigValidationError::InvalidValue {
                field: "junctions.preset".to_string(),
                reason: format!("duplicate junction '{}'", name),
            });
        }
    }
}
