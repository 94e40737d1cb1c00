// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-junction scheduler transition
//!
//! Only `Auto` and `Emergency` junctions move on their own. `Manual` and
//! `Stop` change only through operator commands.

use signalgrid_state_manager::{Deadline, JunctionState, Lane, SignalMode, SignalTiming};

use crate::allocation::allocate_green_times;

/// What a tick did to one junction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionOutcome {
    /// Nothing to do (timer running, emergency still held, manual or stopped)
    Unchanged,
    /// Emergency hold ran out; back to Auto on the same lane
    EmergencyExpired { lane: Lane },
    /// Auto green interval ended; next lane is green
    Advanced { from: Lane, to: Lane, green_secs: u32 },
}

impl TransitionOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, TransitionOutcome::Unchanged)
    }
}

/// Junction record the scheduler cannot act on
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("{mode} junction has no green lane")]
    MissingGreenLane { mode: SignalMode },
}

/// Advance one junction to `now`
pub fn advance_junction(
    state: &mut JunctionState,
    now: f64,
    timing: &SignalTiming,
) -> Result<TransitionOutcome, TransitionError> {
    match state.mode {
        SignalMode::Manual | SignalMode::Stop => Ok(TransitionOutcome::Unchanged),
        SignalMode::Emergency => {
            if !state.timer_end.is_expired(now) {
                return Ok(TransitionOutcome::Unchanged);
            }
            let lane = green_lane(state)?;
            state.mode = SignalMode::Auto;
            state.timer_end = Deadline::after(now, *state.lane_times.get(lane));
            Ok(TransitionOutcome::EmergencyExpired { lane })
        }
        SignalMode::Auto => {
            if !state.timer_end.is_expired(now) {
                return Ok(TransitionOutcome::Unchanged);
            }
            let from = green_lane(state)?;
            let to = from.next();
            state.lane_times = allocate_green_times(&state.lane_counts, timing);
            let green_secs = *state.lane_times.get(to);
            state.current_green = Some(to);
            state.timer_end = Deadline::after(now, green_secs);
            Ok(TransitionOutcome::Advanced {
                from,
                to,
                green_secs,
            })
        }
    }
}

fn green_lane(state: &JunctionState) -> Result<Lane, TransitionError> {
    state
        .current_green
        .ok_or(TransitionError::MissingGreenLane { mode: state.mode })
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalgrid_state_manager::LaneMap;

    const NOW: f64 = 1_000_000.0;

    fn auto_state(green: Lane, timer_end: f64) -> JunctionState {
        let mut state = JunctionState::new(&SignalTiming::default(), 0.0);
        state.current_green = Some(green);
        state.timer_end = Deadline::At(timer_end);
        state
    }

    #[test]
    fn test_auto_advances_when_expired() {
        let mut state = auto_state(Lane::North, NOW - 1.0);
        let outcome = advance_junction(&mut state, NOW, &SignalTiming::default()).unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Advanced {
                from: Lane::North,
                to: Lane::East,
                green_secs: 60
            }
        );
        assert_eq!(state.current_green, Some(Lane::East));
        assert_eq!(state.timer_end, Deadline::At(NOW + 60.0));
    }

    #[test]
    fn test_auto_wraps_west_to_north() {
        let mut state = auto_state(Lane::West, NOW);
        advance_junction(&mut state, NOW, &SignalTiming::default()).unwrap();
        assert_eq!(state.current_green, Some(Lane::North));
    }

    #[test]
    fn test_auto_waits_for_timer() {
        let mut state = auto_state(Lane::South, NOW + 5.0);
        let before = state.clone();
        let outcome = advance_junction(&mut state, NOW, &SignalTiming::default()).unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged);
        assert_eq!(state, before);
    }

    #[test]
    fn test_auto_recomputes_all_lane_times_from_counts() {
        let mut state = auto_state(Lane::North, NOW - 1.0);
        state.lane_counts = LaneMap {
            north: 10,
            east: 30,
            south: 0,
            west: 0,
        };
        advance_junction(&mut state, NOW, &SignalTiming::default()).unwrap();

        assert_eq!(
            state.lane_times,
            LaneMap {
                north: 75,
                east: 105,
                south: 60,
                west: 60
            }
        );
        assert_eq!(state.timer_end, Deadline::At(NOW + 105.0));
    }

    #[test]
    fn test_emergency_expiry_reverts_to_auto_on_same_lane() {
        let mut state = auto_state(Lane::East, NOW - 10.0);
        state.mode = SignalMode::Emergency;
        state.lane_times.set(Lane::East, 80);
        // Counts must not trigger a recomputation on expiry
        state.lane_counts.set(Lane::North, 50);

        let outcome = advance_junction(&mut state, NOW, &SignalTiming::default()).unwrap();

        assert_eq!(outcome, TransitionOutcome::EmergencyExpired { lane: Lane::East });
        assert_eq!(state.mode, SignalMode::Auto);
        assert_eq!(state.current_green, Some(Lane::East));
        assert_eq!(state.timer_end, Deadline::At(NOW + 80.0));
        assert_eq!(*state.lane_times.get(Lane::North), 60);
    }

    #[test]
    fn test_active_emergency_is_skipped() {
        let mut state = auto_state(Lane::South, NOW + 100.0);
        state.mode = SignalMode::Emergency;
        let before = state.clone();

        let outcome = advance_junction(&mut state, NOW, &SignalTiming::default()).unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged);
        assert_eq!(state, before);
    }

    #[test]
    fn test_manual_and_stop_are_inert() {
        let mut manual = auto_state(Lane::West, NOW - 100.0);
        manual.mode = SignalMode::Manual;
        let before = manual.clone();
        advance_junction(&mut manual, NOW, &SignalTiming::default()).unwrap();
        assert_eq!(manual, before);

        let mut stopped = auto_state(Lane::West, 0.0);
        stopped.mode = SignalMode::Stop;
        stopped.current_green = None;
        let before = stopped.clone();
        advance_junction(&mut stopped, NOW, &SignalTiming::default()).unwrap();
        assert_eq!(stopped, before);
    }

    #[test]
    fn test_indefinite_auto_never_advances() {
        let mut state = auto_state(Lane::North, 0.0);
        state.timer_end = Deadline::Indefinite;
        let outcome = advance_junction(&mut state, f64::MAX, &SignalTiming::default()).unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged);
    }

    #[test]
    fn test_auto_without_green_lane_is_an_error() {
        let mut state = auto_state(Lane::North, 0.0);
        state.current_green = None;
        let result = advance_junction(&mut state, NOW, &SignalTiming::default());
        assert_eq!(
            result,
            Err(TransitionError::MissingGreenLane {
                mode: SignalMode::Auto
            })
        );
    }
}
