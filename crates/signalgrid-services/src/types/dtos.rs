// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Transport-agnostic Data Transfer Objects (DTOs).

Field names follow the operator form and detection feed that drive the
services.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::fmt;

use serde::{Deserialize, Serialize};
use signalgrid_state_manager::{JunctionState, Lane, LaneMap, SignalMode};

use super::errors::{ServiceError, ServiceResult};

// ============================================================================
// CONTROL DTOs
// ============================================================================

/// Operator request as submitted by a caller; at most one field may be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlRequest {
    /// Hold this lane green (Manual)
    pub force_lane: Option<String>,
    /// Resume round-robin from the current lane
    pub switch_auto: bool,
    /// Pre-empt with this lane green (Emergency)
    pub emergency_lane: Option<String>,
    /// Halt all lanes
    pub stop_signals: bool,
    /// Restart the cycle at north
    pub start_signals: bool,
}

impl ControlRequest {
    /// Resolve the request to a single command
    ///
    /// Returns `Ok(None)` when no command is present. A blank lane string
    /// counts as absent. A request naming more than one command is rejected;
    /// lane ids are validated.
    pub fn into_command(mut self) -> ServiceResult<Option<ControlCommand>> {
        self.force_lane = self.force_lane.filter(|lane| !lane.trim().is_empty());
        self.emergency_lane = self.emergency_lane.filter(|lane| !lane.trim().is_empty());

        let mut present = Vec::new();
        if self.force_lane.is_some() {
            present.push("force_lane");
        }
        if self.switch_auto {
            present.push("switch_auto");
        }
        if self.emergency_lane.is_some() {
            present.push("emergency_lane");
        }
        if self.stop_signals {
            present.push("stop_signals");
        }
        if self.start_signals {
            present.push("start_signals");
        }
        if present.len() > 1 {
            return Err(ServiceError::ConflictingCommands(present.join(", ")));
        }

        let command = if let Some(lane) = self.force_lane {
            Some(ControlCommand::ForceLane(parse_lane(&lane)?))
        } else if self.switch_auto {
            Some(ControlCommand::SwitchAuto)
        } else if let Some(lane) = self.emergency_lane {
            Some(ControlCommand::Emergency(parse_lane(&lane)?))
        } else if self.stop_signals {
            Some(ControlCommand::Stop)
        } else if self.start_signals {
            Some(ControlCommand::Start)
        } else {
            None
        };
        Ok(command)
    }
}

/// A single validated mode command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    ForceLane(Lane),
    SwitchAuto,
    Emergency(Lane),
    Stop,
    Start,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::ForceLane(lane) => write!(f, "force_lane({})", lane),
            ControlCommand::SwitchAuto => f.write_str("switch_auto"),
            ControlCommand::Emergency(lane) => write!(f, "emergency({})", lane),
            ControlCommand::Stop => f.write_str("stop"),
            ControlCommand::Start => f.write_str("start"),
        }
    }
}

// ============================================================================
// COUNT DTOs
// ============================================================================

/// One vehicle-count reading from the detection pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountObservation {
    pub junction: String,
    pub lane: String,
    pub count: u32,
}

// ============================================================================
// JUNCTION DTOs
// ============================================================================

/// Dashboard view of one junction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionView {
    pub junction: String,
    pub lane_counts: LaneMap<u32>,
    pub lane_times: LaneMap<u32>,
    pub current_green: Option<Lane>,
    pub mode: SignalMode,
    pub timer_end: f64,
    /// Seconds left on the current green or hold; `None` when it does not expire
    pub remaining_secs: Option<f64>,
}

impl JunctionView {
    pub fn from_state(junction: &str, state: &JunctionState, now: f64) -> Self {
        let remaining_secs = match state.mode {
            SignalMode::Auto | SignalMode::Emergency => state.timer_end.remaining(now),
            SignalMode::Manual | SignalMode::Stop => None,
        };
        Self {
            junction: junction.to_string(),
            lane_counts: state.lane_counts,
            lane_times: state.lane_times,
            current_green: state.current_green,
            mode: state.mode,
            timer_end: state.timer_end.as_timestamp(),
            remaining_secs,
        }
    }
}

pub(crate) fn parse_lane(lane: &str) -> ServiceResult<Lane> {
    lane.parse::<Lane>().map_err(ServiceError::from)
}
