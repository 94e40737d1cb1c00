// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Mode control service trait.

Operator commands that change how a junction is signalled. Each command is
one atomic read-modify-write of the stored junction record and returns the
record as written.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use async_trait::async_trait;
use signalgrid_state_manager::{JunctionState, Lane};

use crate::types::*;

/// Mode control service (transport-agnostic)
#[async_trait]
pub trait ModeControlService: Send + Sync {
    /// Hold `lane` green until another command arrives
    ///
    /// Sets `Manual` mode with a deadline that never expires.
    ///
    /// # Errors
    /// * `ServiceError::InvalidInput` - Blank junction name
    /// * `ServiceError::Storage` - State could not be persisted
    ///
    async fn force_lane(&self, junction: &str, lane: Lane) -> ServiceResult<JunctionState>;

    /// Return the junction to round-robin cycling
    ///
    /// Keeps the current green lane and gives it its allocated green time,
    /// so the cycle continues where the operator left it.
    ///
    async fn switch_auto(&self, junction: &str) -> ServiceResult<JunctionState>;

    /// Pre-empt the junction with `lane` green for the emergency duration
    ///
    /// The scheduler reverts the junction to `Auto` when the hold expires.
    ///
    async fn set_emergency(&self, junction: &str, lane: Lane) -> ServiceResult<JunctionState>;

    /// Halt all lanes
    async fn stop(&self, junction: &str) -> ServiceResult<JunctionState>;

    /// Restart cycling from north with the base green time
    async fn start(&self, junction: &str) -> ServiceResult<JunctionState>;

    /// Execute a caller-supplied request carrying at most one command
    ///
    /// A request with no command returns the (lazily created) record.
    ///
    /// # Errors
    /// * `ServiceError::ConflictingCommands` - More than one command set
    /// * `ServiceError::InvalidInput` - Unknown lane id
    ///
    async fn execute(&self, junction: &str, request: ControlRequest) -> ServiceResult<JunctionState>;
}
