// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Junction query service implementation.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::sync::Arc;

use async_trait::async_trait;
use signalgrid_state_manager::{JunctionState, StateStore};

use super::with_store;
use crate::traits::JunctionQueryService;
use crate::types::*;

/// Default implementation of JunctionQueryService
pub struct JunctionQueryServiceImpl {
    store: Arc<StateStore>,
}

impl JunctionQueryServiceImpl {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JunctionQueryService for JunctionQueryServiceImpl {
    async fn get_or_create(&self, junction: &str) -> ServiceResult<JunctionState> {
        let name = junction.to_string();
        with_store(&self.store, move |store| store.get_or_create(&name)).await
    }

    async fn list_junctions(&self) -> ServiceResult<Vec<String>> {
        with_store(&self.store, |store| Ok(store.junction_names())).await
    }

    async fn get_junction(&self, junction: &str) -> ServiceResult<Option<JunctionState>> {
        let name = junction.to_string();
        with_store(&self.store, move |store| Ok(store.read(&name))).await
    }

    async fn describe_junction(&self, junction: &str) -> ServiceResult<Option<JunctionView>> {
        let name = junction.to_string();
        with_store(&self.store, move |store| {
            let now = store.now();
            Ok(store
                .read(&name)
                .map(|state| JunctionView::from_state(&name, &state, now)))
        })
        .await
    }
}
