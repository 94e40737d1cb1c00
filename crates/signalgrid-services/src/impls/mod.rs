// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Service implementations.

Default implementations of the service traits backed by a shared
`StateStore`. Store calls do blocking file I/O under the store lock, so
they run on tokio's blocking pool.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod count_ingest_service_impl;
pub mod junction_query_service_impl;
pub mod mode_control_service_impl;

// Re-export for convenience
pub use count_ingest_service_impl::CountIngestServiceImpl;
pub use junction_query_service_impl::JunctionQueryServiceImpl;
pub use mode_control_service_impl::{apply_command, ModeControlServiceImpl};

use std::sync::Arc;

use signalgrid_state_manager::{StateResult, StateStore};

use crate::types::{ServiceError, ServiceResult};

/// Run a store operation on the blocking pool
pub(crate) async fn with_store<T, F>(store: &Arc<StateStore>, op: F) -> ServiceResult<T>
where
    T: Send + 'static,
    F: FnOnce(&StateStore) -> StateResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| ServiceError::Internal(format!("store task failed: {}", e)))?
        .map_err(ServiceError::from)
}
