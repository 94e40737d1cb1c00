// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Service trait definitions.

These traits define the stable application boundary between transport
adapters (HTTP handlers, the daemon feed) and the junction state store.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod count_ingest_service;
pub mod junction_query_service;
pub mod mode_control_service;

// Re-export for convenience
pub use count_ingest_service::CountIngestService;
pub use junction_query_service::JunctionQueryService;
pub use mode_control_service::ModeControlService;
