// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Newline-delimited JSON feed consumed by `signalgridd`
//!
//! Each line is either a count observation
//! `{"junction": "Fun Mall", "lane": "north", "count": 4}` or a control
//! request `{"junction": "Fun Mall", "command": {"force_lane": "east"}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use signalgrid_services::{ControlRequest, CountObservation, JunctionView, ServiceError, ServiceResult};

use crate::runtime::SignalRuntime;

/// One parsed feed line
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Command {
        junction: String,
        command: ControlRequest,
    },
    Count(CountObservation),
}

#[derive(Deserialize)]
struct CommandLine {
    junction: String,
    command: ControlRequest,
}

impl FeedMessage {
    /// Parse one line; a `command` key selects a control request, anything
    /// else must be a count observation
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(line)?;
        let is_command = value
            .as_object()
            .is_some_and(|object| object.contains_key("command"));

        if is_command {
            let CommandLine { junction, command } = serde_json::from_value(value)?;
            Ok(FeedMessage::Command { junction, command })
        } else {
            serde_json::from_value(value).map(FeedMessage::Count)
        }
    }

    pub fn junction(&self) -> &str {
        match self {
            FeedMessage::Command { junction, .. } => junction,
            FeedMessage::Count(observation) => &observation.junction,
        }
    }
}

/// Reply written back for each accepted line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junction: Option<JunctionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeedReply {
    pub fn accepted(view: JunctionView) -> Self {
        Self {
            ok: true,
            junction: Some(view),
            error: None,
        }
    }

    pub fn rejected(error: impl ToString) -> Self {
        Self {
            ok: false,
            junction: None,
            error: Some(error.to_string()),
        }
    }
}

impl SignalRuntime {
    /// Route one feed message to the matching service and describe the
    /// junction afterwards
    pub async fn dispatch(&self, message: FeedMessage) -> ServiceResult<JunctionView> {
        let junction = message.junction().to_string();
        match message {
            FeedMessage::Command { command, .. } => {
                self.mode_control().execute(&junction, command).await?;
            }
            FeedMessage::Count(observation) => {
                self.counts().ingest(observation).await?;
            }
        }

        self.queries()
            .describe_junction(&junction)
            .await?
            .ok_or_else(|| ServiceError::Internal(format!("junction '{}' vanished after update", junction)))
    }

    /// Parse and dispatch one raw line; blank lines yield `None`
    pub async fn handle_feed_line(&self, line: &str) -> Option<FeedReply> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let message = match FeedMessage::parse(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(target: "signalgrid", error = %e, "Skipping unparsable feed line");
                return Some(FeedReply::rejected(format!("unparsable line: {}", e)));
            }
        };

        match self.dispatch(message).await {
            Ok(view) => Some(FeedReply::accepted(view)),
            Err(e) => {
                tracing::warn!(target: "signalgrid", error = %e, "Feed request rejected");
                Some(FeedReply::rejected(e))
            }
        }
    }
}
