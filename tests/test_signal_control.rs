// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end control flows through `SignalRuntime` on a manual clock.

use std::sync::Arc;

use signalgrid::prelude::*;
use signalgrid::state_manager::ManualClock;
use tempfile::TempDir;

const START: f64 = 1_700_000_000.0;

fn build_runtime() -> (SignalRuntime, Arc<ManualClock>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SignalgridConfig::default();
    config.system.data_dir = dir.path().to_path_buf();
    let clock = Arc::new(ManualClock::new(START));
    let runtime = SignalRuntime::with_clock(config, clock.clone()).unwrap();
    (runtime, clock, dir)
}

#[tokio::test]
async fn auto_cycle_uses_latest_counts() {
    let (runtime, clock, _dir) = build_runtime();
    let counts = runtime.counts();

    counts.update_counts("Fun Mall", Lane::North, 10).await.unwrap();
    counts.update_counts("Fun Mall", Lane::East, 30).await.unwrap();

    clock.advance(61.0);
    let report = runtime.scheduler().tick_now().unwrap();
    assert_eq!(report.advanced, 1);

    let state = runtime.queries().get_junction("Fun Mall").await.unwrap().unwrap();
    assert_eq!(state.current_green, Some(Lane::East));
    assert_eq!(*state.lane_times.get(Lane::North), 75);
    assert_eq!(*state.lane_times.get(Lane::East), 105);
    assert_eq!(*state.lane_times.get(Lane::South), 60);
    assert_eq!(*state.lane_times.get(Lane::West), 60);
    assert_eq!(state.timer_end, Deadline::At(START + 61.0 + 105.0));
}

#[tokio::test]
async fn full_round_returns_to_north() {
    let (runtime, clock, _dir) = build_runtime();
    runtime.queries().get_or_create("j").await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        clock.advance(60.0);
        runtime.scheduler().tick_now().unwrap();
        let state = runtime.store().read("j").unwrap();
        seen.push(state.current_green.unwrap());
    }

    assert_eq!(seen, vec![Lane::East, Lane::South, Lane::West, Lane::North]);
}

#[tokio::test]
async fn emergency_expiry_resumes_same_lane() {
    let (runtime, clock, _dir) = build_runtime();
    runtime
        .store()
        .apply("j", |state| state.lane_times.set(Lane::East, 80))
        .unwrap();
    runtime.mode_control().set_emergency("j", Lane::East).await.unwrap();

    clock.advance(119.0);
    runtime.scheduler().tick_now().unwrap();
    assert_eq!(runtime.store().read("j").unwrap().mode, SignalMode::Emergency);

    clock.advance(1.0);
    runtime.scheduler().tick_now().unwrap();
    let state = runtime.store().read("j").unwrap();
    assert_eq!(state.mode, SignalMode::Auto);
    assert_eq!(state.current_green, Some(Lane::East));
    assert_eq!(state.timer_end, Deadline::At(START + 120.0 + 80.0));
}

#[tokio::test]
async fn manual_and_stopped_junctions_hold() {
    let (runtime, clock, _dir) = build_runtime();
    let control = runtime.mode_control();
    control.force_lane("held", Lane::South).await.unwrap();
    control.stop("halted").await.unwrap();

    clock.advance(10_000.0);
    let report = runtime.scheduler().tick_now().unwrap();
    assert_eq!(report.advanced, 0);
    assert!(!report.persisted);

    let held = runtime.store().read("held").unwrap();
    assert_eq!(held.current_green, Some(Lane::South));
    assert_eq!(held.timer_end, Deadline::Indefinite);

    let halted = runtime.store().read("halted").unwrap();
    assert_eq!(halted.mode, SignalMode::Stop);
    assert_eq!(halted.current_green, None);
}

#[tokio::test]
async fn switch_auto_after_manual_hold() {
    let (runtime, clock, _dir) = build_runtime();
    let control = runtime.mode_control();
    control.force_lane("j", Lane::West).await.unwrap();

    clock.advance(30.0);
    let state = control.switch_auto("j").await.unwrap();
    assert_eq!(state.mode, SignalMode::Auto);
    assert_eq!(state.current_green, Some(Lane::West));
    assert_eq!(state.timer_end, Deadline::At(START + 30.0 + 60.0));

    clock.advance(60.0);
    runtime.scheduler().tick_now().unwrap();
    assert_eq!(runtime.store().read("j").unwrap().current_green, Some(Lane::North));
}

#[tokio::test]
async fn legacy_indefinite_timer_is_preserved() {
    let (runtime, clock, _dir) = build_runtime();
    let path = runtime.store().path().to_path_buf();
    let legacy = serde_json::json!({
        "Fun Mall": {
            "lane_counts": {"north": 0, "east": 0, "south": 0, "west": 0},
            "lane_times": {"north": 60, "east": 60, "south": 60, "west": 60},
            "current_green": "east",
            "mode": "Manual",
            "timer_end": START + 1.0e10
        }
    });
    std::fs::write(&path, legacy.to_string()).unwrap();

    clock.advance(1.0e6);
    runtime.scheduler().tick_now().unwrap();

    let view = runtime.queries().describe_junction("Fun Mall").await.unwrap().unwrap();
    assert_eq!(view.mode, SignalMode::Manual);
    assert_eq!(view.remaining_secs, None);
    assert_eq!(
        runtime.store().read("Fun Mall").unwrap().timer_end,
        Deadline::Indefinite
    );
}

#[tokio::test]
async fn store_write_failure_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SignalgridConfig::default();
    config.system.data_dir = dir.path().to_path_buf();
    // The state file path is occupied by a directory, so every save fails
    std::fs::create_dir_all(dir.path().join("state.json")).unwrap();
    let runtime = SignalRuntime::with_clock(config, Arc::new(ManualClock::new(START))).unwrap();

    let result = runtime.mode_control().stop("j").await;
    assert!(matches!(result, Err(ServiceError::Storage(_))));
    assert!(runtime.store().junction_names().is_empty());
}
