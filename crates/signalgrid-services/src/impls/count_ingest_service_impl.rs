// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Count ingest service implementation.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::sync::Arc;

use async_trait::async_trait;
use signalgrid_state_manager::{Lane, StateStore};
use tracing::debug;

use super::with_store;
use crate::traits::CountIngestService;
use crate::types::dtos::parse_lane;
use crate::types::*;

/// Default implementation of CountIngestService
pub struct CountIngestServiceImpl {
    store: Arc<StateStore>,
}

impl CountIngestServiceImpl {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CountIngestService for CountIngestServiceImpl {
    async fn update_counts(&self, junction: &str, lane: Lane, count: u32) -> ServiceResult<()> {
        debug!(target: "signalgrid-services", junction, %lane, count, "Recording vehicle count");

        let name = junction.to_string();
        with_store(&self.store, move |store| {
            store.apply(&name, |state| state.lane_counts.set(lane, count))
        })
        .await
    }

    async fn ingest(&self, observation: CountObservation) -> ServiceResult<()> {
        let lane = parse_lane(&observation.lane)?;
        self.update_counts(&observation.junction, lane, observation.count)
            .await
    }
}
