// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Mode control service implementation.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::sync::Arc;

use async_trait::async_trait;
use signalgrid_state_manager::{
    Deadline, JunctionState, Lane, SignalMode, SignalTiming, StateStore,
};
use tracing::info;

use super::with_store;
use crate::traits::ModeControlService;
use crate::types::{ControlCommand, ControlRequest, ServiceResult};

/// Apply one mode command to a junction record
///
/// | Command        | mode      | current_green | timer_end                      |
/// |----------------|-----------|---------------|--------------------------------|
/// | `ForceLane(l)` | Manual    | `l`           | indefinite                     |
/// | `SwitchAuto`   | Auto      | unchanged     | now + lane_times[current]      |
/// | `Emergency(l)` | Emergency | `l`           | now + emergency_duration       |
/// | `Stop`         | Stop      | none          | 0                              |
/// | `Start`        | Auto      | north         | now + base_time                |
///
/// `SwitchAuto` on a stopped junction has no lane to resume, so it starts
/// at north with the base time.
pub fn apply_command(
    state: &mut JunctionState,
    command: ControlCommand,
    now: f64,
    timing: &SignalTiming,
) {
    match command {
        ControlCommand::ForceLane(lane) => {
            state.mode = SignalMode::Manual;
            state.current_green = Some(lane);
            state.timer_end = Deadline::Indefinite;
        }
        ControlCommand::SwitchAuto => {
            state.mode = SignalMode::Auto;
            let (lane, secs) = match state.current_green {
                Some(lane) => (lane, *state.lane_times.get(lane)),
                None => (Lane::North, timing.base_time),
            };
            state.current_green = Some(lane);
            state.timer_end = Deadline::after(now, secs);
        }
        ControlCommand::Emergency(lane) => {
            state.mode = SignalMode::Emergency;
            state.current_green = Some(lane);
            state.timer_end = Deadline::after(now, timing.emergency_duration);
        }
        ControlCommand::Stop => {
            state.mode = SignalMode::Stop;
            state.current_green = None;
            state.timer_end = Deadline::At(0.0);
        }
        ControlCommand::Start => {
            state.mode = SignalMode::Auto;
            state.current_green = Some(Lane::North);
            state.timer_end = Deadline::after(now, timing.base_time);
        }
    }
}

/// Default implementation of ModeControlService
pub struct ModeControlServiceImpl {
    store: Arc<StateStore>,
}

impl ModeControlServiceImpl {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    async fn run(&self, junction: &str, command: ControlCommand) -> ServiceResult<JunctionState> {
        info!(target: "signalgrid-services", junction, %command, "Applying mode command");

        let name = junction.to_string();
        with_store(&self.store, move |store| {
            let timing = *store.timing();
            store.apply(&name, |state| {
                apply_command(state, command, store.now(), &timing);
                state.clone()
            })
        })
        .await
    }
}

#[async_trait]
impl ModeControlService for ModeControlServiceImpl {
    async fn force_lane(&self, junction: &str, lane: Lane) -> ServiceResult<JunctionState> {
        self.run(junction, ControlCommand::ForceLane(lane)).await
    }

    async fn switch_auto(&self, junction: &str) -> ServiceResult<JunctionState> {
        self.run(junction, ControlCommand::SwitchAuto).await
    }

    async fn set_emergency(&self, junction: &str, lane: Lane) -> ServiceResult<JunctionState> {
        self.run(junction, ControlCommand::Emergency(lane)).await
    }

    async fn stop(&self, junction: &str) -> ServiceResult<JunctionState> {
        self.run(junction, ControlCommand::Stop).await
    }

    async fn start(&self, junction: &str) -> ServiceResult<JunctionState> {
        self.run(junction, ControlCommand::Start).await
    }

    async fn execute(&self, junction: &str, request: ControlRequest) -> ServiceResult<JunctionState> {
        match request.into_command()? {
            Some(command) => self.run(junction, command).await,
            None => {
                let name = junction.to_string();
                with_store(&self.store, move |store| store.get_or_create(&name)).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceError;
    use signalgrid_state_manager::ManualClock;
    use tempfile::tempdir;

    const NOW: f64 = 1_700_000_000.0;

    fn service(dir: &std::path::Path) -> (ModeControlServiceImpl, Arc<StateStore>) {
        let store = Arc::new(StateStore::new(
            dir.join("state.json"),
            SignalTiming::default(),
            Arc::new(ManualClock::new(NOW)),
        ));
        (ModeControlServiceImpl::new(store.clone()), store)
    }

    #[test]
    fn test_switch_auto_resumes_current_lane_time() {
        let mut state = JunctionState::new(&SignalTiming::default(), 0.0);
        state.mode = SignalMode::Manual;
        state.current_green = Some(Lane::South);
        state.timer_end = Deadline::Indefinite;
        state.lane_times.set(Lane::South, 90);

        apply_command(&mut state, ControlCommand::SwitchAuto, NOW, &SignalTiming::default());

        assert_eq!(state.mode, SignalMode::Auto);
        assert_eq!(state.current_green, Some(Lane::South));
        assert_eq!(state.timer_end, Deadline::At(NOW + 90.0));
    }

    #[test]
    fn test_switch_auto_from_stop_starts_north() {
        let mut state = JunctionState::new(&SignalTiming::default(), 0.0);
        apply_command(&mut state, ControlCommand::Stop, NOW, &SignalTiming::default());
        apply_command(&mut state, ControlCommand::SwitchAuto, NOW, &SignalTiming::default());

        assert_eq!(state.current_green, Some(Lane::North));
        assert_eq!(state.timer_end, Deadline::At(NOW + 60.0));
        assert!(state.validate("j").is_ok());
    }

    #[test]
    fn test_start_keeps_stale_lane_times() {
        let mut state = JunctionState::new(&SignalTiming::default(), 0.0);
        state.current_green = Some(Lane::West);
        state.lane_times.set(Lane::North, 110);

        apply_command(&mut state, ControlCommand::Start, NOW, &SignalTiming::default());

        assert_eq!(state.current_green, Some(Lane::North));
        assert_eq!(state.timer_end, Deadline::At(NOW + 60.0));
        assert_eq!(*state.lane_times.get(Lane::North), 110);
    }

    #[tokio::test]
    async fn test_force_lane_sets_manual_indefinite() {
        let dir = tempdir().unwrap();
        let (service, store) = service(dir.path());

        let state = service.force_lane("Fun Mall", Lane::West).await.unwrap();

        assert_eq!(state.mode, SignalMode::Manual);
        assert_eq!(state.current_green, Some(Lane::West));
        assert_eq!(state.timer_end, Deadline::Indefinite);
        assert_eq!(store.read("Fun Mall"), Some(state));
    }

    #[tokio::test]
    async fn test_emergency_hold_duration() {
        let dir = tempdir().unwrap();
        let (service, _store) = service(dir.path());

        let state = service.set_emergency("j", Lane::South).await.unwrap();

        assert_eq!(state.mode, SignalMode::Emergency);
        assert_eq!(state.current_green, Some(Lane::South));
        assert_eq!(state.timer_end, Deadline::At(NOW + 120.0));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let dir = tempdir().unwrap();
        let (service, store) = service(dir.path());

        let first = service.stop("j").await.unwrap();
        let second = service.stop("j").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.mode, SignalMode::Stop);
        assert_eq!(second.current_green, None);
        assert_eq!(second.timer_end, Deadline::At(0.0));
        assert_eq!(store.read("j"), Some(second));
    }

    #[tokio::test]
    async fn test_execute_rejects_conflicting_request_without_mutation() {
        let dir = tempdir().unwrap();
        let (service, store) = service(dir.path());
        service.start("j").await.unwrap();
        let before = store.read("j");

        let request = ControlRequest {
            force_lane: Some("east".into()),
            switch_auto: true,
            ..Default::default()
        };
        let result = service.execute("j", request).await;

        assert!(matches!(result, Err(ServiceError::ConflictingCommands(_))));
        assert_eq!(store.read("j"), before);
    }

    #[tokio::test]
    async fn test_execute_invalid_lane_never_touches_store() {
        let dir = tempdir().unwrap();
        let (service, store) = service(dir.path());

        let request = ControlRequest {
            emergency_lane: Some("northwest".into()),
            ..Default::default()
        };
        let result = service.execute("j", request).await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert!(store.junction_names().is_empty());
    }

    #[tokio::test]
    async fn test_execute_without_command_creates_default() {
        let dir = tempdir().unwrap();
        let (service, _store) = service(dir.path());

        let state = service.execute("j", ControlRequest::default()).await.unwrap();
        assert_eq!(state, JunctionState::new(&SignalTiming::default(), NOW));
    }
}
