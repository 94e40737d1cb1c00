// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Junction query service trait.

Read access for dashboards and adapters. Apart from `get_or_create`, these
calls never create junctions and degrade to empty results when the store is
unreadable.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use async_trait::async_trait;
use signalgrid_state_manager::JunctionState;

use crate::types::*;

/// Junction query service (transport-agnostic)
#[async_trait]
pub trait JunctionQueryService: Send + Sync {
    /// Return the junction, creating it with defaults on first reference
    async fn get_or_create(&self, junction: &str) -> ServiceResult<JunctionState>;

    /// Names of all stored junctions, sorted
    async fn list_junctions(&self) -> ServiceResult<Vec<String>>;

    /// Stored record, or `None` if the junction is unknown
    async fn get_junction(&self, junction: &str) -> ServiceResult<Option<JunctionState>>;

    /// Dashboard view with the remaining green time, or `None` if unknown
    async fn describe_junction(&self, junction: &str) -> ServiceResult<Option<JunctionView>>;
}
