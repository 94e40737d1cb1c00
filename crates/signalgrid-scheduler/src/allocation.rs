// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Proportional green-time allocation
//!
//! Every lane gets `base_time`; the `extra_time_pool` is split by each lane's
//! share of the vehicles currently counted at the junction. Integer
//! arithmetic gives the exact floor of `count / total * pool`.

use signalgrid_state_manager::{LaneMap, SignalTiming};

/// Green time per lane (seconds) for the given counts
pub fn allocate_green_times(counts: &LaneMap<u32>, timing: &SignalTiming) -> LaneMap<u32> {
    let total: u64 = counts.iter().map(|(_, count)| u64::from(*count)).sum();
    if total == 0 {
        return LaneMap::uniform(timing.base_time);
    }

    let pool = u64::from(timing.extra_time_pool);
    LaneMap::from_fn(|lane| {
        // share <= pool, so this always fits back into u32
        let share = u64::from(*counts.get(lane)) * pool / total;
        timing.base_time.saturating_add(share as u32)
    })
}
