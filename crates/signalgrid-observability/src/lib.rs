// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # signalgrid-observability
//!
//! Logging setup shared by the signalgrid crates and the daemon, with
//! per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON run logs in timestamped directories (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use init::*;

/// Known signalgrid crate names for debug flags
///
/// These double as the `target:` of every log event the crates emit.
pub const KNOWN_CRATES: &[&str] = &[
    "signalgrid",
    "signalgrid-config",
    "signalgrid-state-manager",
    "signalgrid-scheduler",
    "signalgrid-services",
    "signalgridd",
];
