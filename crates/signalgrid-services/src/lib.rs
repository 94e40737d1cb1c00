// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Signalgrid Service Layer

The stable application boundary for signalgrid - transport-agnostic service
interfaces used by any adapter (HTTP handlers, the daemon's stdin feed,
tests).

## Architecture

```text
┌─────────────────────────────────────────────────────────────────┐
│                    TRANSPORT ADAPTERS                            │
│  Operator form, detection feed, signalgridd stdin               │
└────────────────────────────┬────────────────────────────────────┘
                             ↓
┌─────────────────────────────────────────────────────────────────┐
│              SERVICE LAYER (This Crate)                          │
│  • ModeControlService   - force / auto / emergency / stop / start│
│  • CountIngestService   - per-lane vehicle counts                │
│  • JunctionQueryService - junction records and dashboard views   │
└────────────────────────────┬────────────────────────────────────┘
                             ↓
┌─────────────────────────────────────────────────────────────────┐
│                   DOMAIN LAYER                                   │
│  signalgrid-state-manager (StateStore)                           │
└─────────────────────────────────────────────────────────────────┘
```

## Design Principles

1. **Transport-Agnostic**: Services know nothing about HTTP or the feed format
2. **One command per request**: a `ControlRequest` naming two commands is rejected
3. **Async by Default**: blocking store I/O runs on tokio's blocking pool
4. **Error Translation**: `StateError` is translated to `ServiceError`

## Usage

```rust,no_run
use std::sync::Arc;
use signalgrid_services::{ModeControlService, ModeControlServiceImpl};
use signalgrid_state_manager::{Lane, SignalTiming, StateStore, SystemClock};

# async fn demo() -> signalgrid_services::ServiceResult<()> {
let store = Arc::new(StateStore::new("state.json", SignalTiming::default(), Arc::new(SystemClock)));
let control = ModeControlServiceImpl::new(store);
let state = control.force_lane("Fun Mall", Lane::West).await?;
assert_eq!(state.current_green, Some(Lane::West));
# Ok(())
# }
```

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod impls;
pub mod traits;
pub mod types;

// Re-export main types for convenience
pub use impls::{apply_command, CountIngestServiceImpl, JunctionQueryServiceImpl, ModeControlServiceImpl};
pub use traits::{CountIngestService, JunctionQueryService, ModeControlService};
pub use types::*;
