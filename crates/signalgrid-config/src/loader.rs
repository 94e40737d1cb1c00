// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SignalgridConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "signalgrid.toml";

/// Find the signalgrid configuration file
///
/// Search order:
/// 1. `SIGNALGRID_CONFIG_PATH` environment variable
/// 2. Current working directory: `./signalgrid.toml`
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SIGNALGRID_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by SIGNALGRID_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet SIGNALGRID_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SignalgridConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SignalgridConfig = toml::from_str(&content)?;

    apply_overrides(&mut config, cli_args);
    Ok(config)
}

/// Like [`load_config`], but falls back to built-in defaults when no file is found
///
/// An explicit `config_path` must exist; only discovery may come up empty.
pub fn load_config_or_default(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SignalgridConfig> {
    match load_config(config_path, cli_args) {
        Err(ConfigError::FileNotFound(_)) if config_path.is_none() => {
            let mut config = SignalgridConfig::default();
            apply_overrides(&mut config, cli_args);
            Ok(config)
        }
        other => other,
    }
}

fn apply_overrides(config: &mut SignalgridConfig, cli_args: Option<&HashMap<String, String>>) {
    apply_environment_overrides(config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(config, cli);
    }
}

fn parse_into<T: FromStr>(value: &str, target: &mut T) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *target = parsed;
    }
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SIGNALGRID_DATA_DIR` -> `system.data_dir`
/// - `SIGNALGRID_LOG_LEVEL` -> `system.log_level`
/// - `SIGNALGRID_STATE_FILE` -> `store.state_file`
/// - `SIGNALGRID_BASE_TIME` -> `timing.base_time_secs`
/// - `SIGNALGRID_EXTRA_TIME_POOL` -> `timing.extra_time_pool_secs`
/// - `SIGNALGRID_EMERGENCY_DURATION` -> `timing.emergency_duration_secs`
/// - `SIGNALGRID_POLL_INTERVAL_MS` -> `scheduler.poll_interval_ms`
///
/// Unparsable numbers are ignored.
pub fn apply_environment_overrides(config: &mut SignalgridConfig) {
    if let Ok(value) = env::var("SIGNALGRID_DATA_DIR") {
        config.system.data_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("SIGNALGRID_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("SIGNALGRID_STATE_FILE") {
        config.store.state_file = value;
    }
    if let Ok(value) = env::var("SIGNALGRID_BASE_TIME") {
        parse_into(&value, &mut config.timing.base_time_secs);
    }
    if let Ok(value) = env::var("SIGNALGRID_EXTRA_TIME_POOL") {
        parse_into(&value, &mut config.timing.extra_time_pool_secs);
    }
    if let Ok(value) = env::var("SIGNALGRID_EMERGENCY_DURATION") {
        parse_into(&value, &mut config.timing.emergency_duration_secs);
    }
    if let Ok(value) = env::var("SIGNALGRID_POLL_INTERVAL_MS") {
        parse_into(&value, &mut config.scheduler.poll_interval_ms);
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - e.g. `{"state_file": "/tmp/state.json", "poll_interval_ms": "100"}`
pub fn apply_cli_overrides(config: &mut SignalgridConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("data_dir") {
        config.system.data_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("state_file") {
        config.store.state_file = value.clone();
    }
    if let Some(value) = cli_args.get("poll_interval_ms") {
        parse_into(value, &mut config.scheduler.poll_interval_ms);
    }
    if let Some(value) = cli_args.get("base_time") {
        parse_into(value, &mut config.timing.base_time_secs);
    }
}
