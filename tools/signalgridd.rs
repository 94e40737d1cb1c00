// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signal controller daemon.
//!
//! Loads `signalgrid.toml`, starts the scheduler and consumes a JSON-lines
//! feed of vehicle counts and operator commands on stdin. One JSON reply is
//! written to stdout per line. EOF or Ctrl-C stops the scheduler and exits.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use signalgrid::config::load_config_or_default;
use signalgrid::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingOptions};
use signalgrid::SignalRuntime;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

const FEED_HELP: &str = "Feed (stdin, one JSON object per line):
  {\"junction\": \"Fun Mall\", \"lane\": \"north\", \"count\": 4}
  {\"junction\": \"Fun Mall\", \"command\": {\"force_lane\": \"east\"}}";

/// Adaptive traffic signal controller
#[derive(Parser, Debug)]
#[command(name = "signalgridd", version, author, long_about = None)]
struct Args {
    /// Path to signalgrid.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Junction state document
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Directory holding the state document and run logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Base log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Scheduler poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Default green time in seconds
    #[arg(long)]
    base_time: Option<u32>,
}

impl Args {
    /// Parse the process arguments; `--debug-*` flags are read separately
    fn parse_process() -> Self {
        Self::parse_filtered(env::args())
    }

    fn parse_filtered<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let args = args.into_iter().filter(|arg| !arg.starts_with("--debug-"));
        let matches = Self::command()
            .after_help(format!("{}\n\n{}", FEED_HELP, debug_flags_help()))
            .get_matches_from(args);
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// Config overrides keyed the way the loader expects
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(path) = &self.state_file {
            overrides.insert("state_file".to_string(), path.display().to_string());
        }
        if let Some(path) = &self.data_dir {
            overrides.insert("data_dir".to_string(), path.display().to_string());
        }
        if let Some(level) = &self.log_level {
            overrides.insert("log_level".to_string(), level.clone());
        }
        if let Some(ms) = self.poll_interval_ms {
            overrides.insert("poll_interval_ms".to_string(), ms.to_string());
        }
        if let Some(secs) = self.base_time {
            overrides.insert("base_time".to_string(), secs.to_string());
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_process();
    let overrides = args.overrides();

    let config = load_config_or_default(args.config.as_deref(), Some(&overrides))
        .context("Failed to load configuration")?;

    let debug_flags = parse_debug_flags();
    let _logging = init_logging(
        &debug_flags,
        &LoggingOptions {
            level: config.system.log_level.clone(),
            log_dir: config.logging.log_dir.clone(),
            file_logging: config.logging.file_logging,
            retention_days: config.logging.retention_days,
            retention_runs: config.logging.retention_runs,
        },
    )?;

    info!(target: "signalgridd", version = signalgrid::VERSION, "Starting signal controller");

    let mut runtime = SignalRuntime::from_config(config).context("Failed to build runtime")?;
    runtime.start().context("Failed to start scheduler")?;

    let result = run_feed(&runtime).await;

    runtime.stop();
    info!(target: "signalgridd", "Signal controller stopped");
    result
}

async fn run_feed(runtime: &SignalRuntime) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(target: "signalgridd", "Interrupt received, shutting down");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read feed")? else {
                    info!(target: "signalgridd", "Feed closed, shutting down");
                    return Ok(());
                };
                let Some(reply) = runtime.handle_feed_line(&line).await else {
                    continue;
                };
                match serde_json::to_string(&reply) {
                    Ok(mut text) => {
                        text.push('\n');
                        stdout.write_all(text.as_bytes()).await?;
                        stdout.flush().await?;
                    }
                    Err(e) => error!(target: "signalgridd", error = %e, "Failed to encode reply"),
                }
            }
        }
    }
}
