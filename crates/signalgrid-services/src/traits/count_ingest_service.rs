// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Count ingest service trait.

Consumes vehicle counts reported by the detection pipeline. Only the
reported lane's count changes; the signal schedule is never touched.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use async_trait::async_trait;
use signalgrid_state_manager::Lane;

use crate::types::*;

/// Count ingest service (transport-agnostic)
#[async_trait]
pub trait CountIngestService: Send + Sync {
    /// Record the latest vehicle count for one lane
    ///
    /// # Errors
    /// * `ServiceError::InvalidInput` - Blank junction name
    /// * `ServiceError::Storage` - State could not be persisted
    ///
    async fn update_counts(&self, junction: &str, lane: Lane, count: u32) -> ServiceResult<()>;

    /// Record an observation with an untyped lane id
    ///
    /// # Errors
    /// * `ServiceError::InvalidInput` - Unknown lane id
    ///
    async fn ingest(&self, observation: CountObservation) -> ServiceResult<()>;
}
