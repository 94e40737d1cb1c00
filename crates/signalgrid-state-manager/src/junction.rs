// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-junction signal state record

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::lanes::{Lane, LaneMap};
use crate::{StateError, StateResult};

/// Default minimum green time per lane (seconds)
pub const DEFAULT_BASE_TIME: u32 = 60;
/// Default bonus seconds shared across lanes by vehicle count
pub const DEFAULT_EXTRA_TIME_POOL: u32 = 60;
/// Default length of an emergency hold (seconds)
pub const DEFAULT_EMERGENCY_DURATION: u32 = 120;

/// Stored `timer_end` value for a deadline that never expires.
///
/// Any stored value at or above this decodes as [`Deadline::Indefinite`], which
/// also covers documents written as `now + 10^10`.
pub const INDEFINITE_TIMER_END: f64 = 1.0e10;

/// Control regime of a junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalMode {
    /// Round-robin cycling driven by the scheduler
    Auto,
    /// Operator holds one lane green
    Manual,
    /// Pre-emptive hold that reverts to Auto when it expires
    Emergency,
    /// All lanes halted
    Stop,
}

impl SignalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalMode::Auto => "Auto",
            SignalMode::Manual => "Manual",
            SignalMode::Emergency => "Emergency",
            SignalMode::Stop => "Stop",
        }
    }
}

impl std::fmt::Display for SignalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the current green interval (or hold) ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deadline {
    /// Expires at this Unix timestamp (seconds). `At(0.0)` is "already expired".
    At(f64),
    /// Never expires on its own
    Indefinite,
}

impl Deadline {
    /// Deadline `secs` seconds after `now`
    pub fn after(now: f64, secs: u32) -> Self {
        Deadline::At(now + f64::from(secs))
    }

    /// Decode a stored `timer_end` value
    pub fn from_timestamp(ts: f64) -> Self {
        if ts >= INDEFINITE_TIMER_END {
            Deadline::Indefinite
        } else {
            Deadline::At(ts)
        }
    }

    /// Stored `timer_end` value
    pub fn as_timestamp(&self) -> f64 {
        match self {
            Deadline::At(ts) => *ts,
            Deadline::Indefinite => INDEFINITE_TIMER_END,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        match self {
            Deadline::At(ts) => now >= *ts,
            Deadline::Indefinite => false,
        }
    }

    /// Seconds left before expiry, `None` when indefinite
    pub fn remaining(&self, now: f64) -> Option<f64> {
        match self {
            Deadline::At(ts) => Some((ts - now).max(0.0)),
            Deadline::Indefinite => None,
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::At(0.0)
    }
}

impl Serialize for Deadline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_timestamp())
    }
}

impl<'de> Deserialize<'de> for Deadline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ts = f64::deserialize(deserializer)?;
        Ok(Deadline::from_timestamp(ts))
    }
}

/// Timing constants used for defaults, allocation and emergency holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTiming {
    pub base_time: u32,
    pub extra_time_pool: u32,
    pub emergency_duration: u32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            base_time: DEFAULT_BASE_TIME,
            extra_time_pool: DEFAULT_EXTRA_TIME_POOL,
            emergency_duration: DEFAULT_EMERGENCY_DURATION,
        }
    }
}

fn default_lane_times() -> LaneMap<u32> {
    LaneMap::uniform(DEFAULT_BASE_TIME)
}

/// Signal state of one junction, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionState {
    /// Latest observed vehicle count per lane
    #[serde(default)]
    pub lane_counts: LaneMap<u32>,
    /// Green time per lane (seconds) computed at the last Auto switch
    #[serde(default = "default_lane_times")]
    pub lane_times: LaneMap<u32>,
    /// `None` only while stopped
    pub current_green: Option<Lane>,
    pub mode: SignalMode,
    #[serde(default)]
    pub timer_end: Deadline,
}

impl JunctionState {
    /// Fresh record: north green in Auto with uniform base timing
    pub fn new(timing: &SignalTiming, now: f64) -> Self {
        Self {
            lane_counts: LaneMap::default(),
            lane_times: LaneMap::uniform(timing.base_time),
            current_green: Some(Lane::North),
            mode: SignalMode::Auto,
            timer_end: Deadline::after(now, timing.base_time),
        }
    }

    /// Check the record invariants
    pub fn validate(&self, junction: &str) -> StateResult<()> {
        let stopped = self.mode == SignalMode::Stop;
        if stopped != self.current_green.is_none() {
            return Err(StateError::InvariantViolation {
                junction: junction.to_string(),
                detail: format!(
                    "mode {} with current_green {:?}",
                    self.mode, self.current_green
                ),
            });
        }
        if let Some((lane, _)) = self.lane_times.iter().find(|(_, secs)| **secs == 0) {
            return Err(StateError::InvariantViolation {
                junction: junction.to_string(),
                detail: format!("lane_times[{}] must be positive", lane),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_junction_defaults() {
        let state = JunctionState::new(&SignalTiming::default(), 1_000.0);
        assert_eq!(state.current_green, Some(Lane::North));
        assert_eq!(state.mode, SignalMode::Auto);
        assert_eq!(state.timer_end, Deadline::At(1_060.0));
        assert_eq!(state.lane_times, LaneMap::uniform(60));
        assert_eq!(state.lane_counts, LaneMap::uniform(0));
        assert!(state.validate("j").is_ok());
    }

    #[test]
    fn test_persisted_field_layout() {
        let state = JunctionState::new(&SignalTiming::default(), 100.0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"], "Auto");
        assert_eq!(json["current_green"], "north");
        assert_eq!(json["timer_end"], 160.0);
        assert_eq!(json["lane_times"]["west"], 60);
    }

    #[test]
    fn test_stop_serializes_null_green_and_zero_timer() {
        let mut state = JunctionState::new(&SignalTiming::default(), 0.0);
        state.mode = SignalMode::Stop;
        state.current_green = None;
        state.timer_end = Deadline::At(0.0);
        let json = serde_json::to_value(&state).unwrap();
        assert!(json["current_green"].is_null());
        assert_eq!(json["timer_end"], 0.0);
        assert_eq!(json["mode"], "Stop");
    }

    #[test]
    fn test_legacy_indefinite_timer_decodes_as_indefinite() {
        let json = serde_json::json!({
            "lane_counts": {"north": 0, "east": 0, "south": 0, "west": 0},
            "lane_times": {"north": 60, "east": 60, "south": 60, "west": 60},
            "current_green": "south",
            "mode": "Manual",
            "timer_end": 1_700_000_000.0 + 1.0e10
        });
        let state: JunctionState = serde_json::from_value(json).unwrap();
        assert_eq!(state.timer_end, Deadline::Indefinite);
        assert!(!state.timer_end.is_expired(f64::MAX));
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = serde_json::json!({"current_green": "east", "mode": "Auto"});
        let state: JunctionState = serde_json::from_value(json).unwrap();
        assert_eq!(state.lane_times, LaneMap::uniform(DEFAULT_BASE_TIME));
        assert_eq!(state.lane_counts, LaneMap::uniform(0));
        assert_eq!(state.timer_end, Deadline::At(0.0));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let json = serde_json::json!({"current_green": "east", "mode": "Blinking"});
        assert!(serde_json::from_value::<JunctionState>(json).is_err());
    }

    #[test]
    fn test_validate_green_lane_iff_not_stopped() {
        let mut state = JunctionState::new(&SignalTiming::default(), 0.0);
        state.current_green = None;
        assert!(matches!(
            state.validate("j"),
            Err(StateError::InvariantViolation { .. })
        ));

        state.mode = SignalMode::Stop;
        assert!(state.validate("j").is_ok());

        state.current_green = Some(Lane::West);
        assert!(state.validate("j").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_lane_time() {
        let mut state = JunctionState::new(&SignalTiming::default(), 0.0);
        state.lane_times.set(Lane::East, 0);
        assert!(state.validate("j").is_err());
    }

    #[test]
    fn test_deadline_remaining() {
        assert_eq!(Deadline::At(10.0).remaining(4.0), Some(6.0));
        assert_eq!(Deadline::At(10.0).remaining(12.0), Some(0.0));
        assert_eq!(Deadline::Indefinite.remaining(12.0), None);
        assert!(Deadline::At(10.0).is_expired(10.0));
    }
}
