// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lock-serialised junction state store
//!
//! Every state change is a full read-modify-write of the persisted document
//! performed while holding one process-wide lock. Nothing is cached between
//! calls: the file on disk is the only source of truth.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::clock::Clock;
use crate::junction::{JunctionState, SignalTiming};
use crate::persistence::{load_document, save_document, JunctionDocument};
use crate::{StateError, StateResult};

/// Durable mapping from junction name to [`JunctionState`]
pub struct StateStore {
    path: PathBuf,
    timing: SignalTiming,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl StateStore {
    /// Create a store backed by the document at `path`
    ///
    /// The file is not touched until the first call.
    pub fn new(path: impl Into<PathBuf>, timing: SignalTiming, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            timing,
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timing(&self) -> &SignalTiming {
        &self.timing
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time from the shared clock
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Apply `mutation` to the named junction and persist the whole document
    ///
    /// The junction is created with defaults if absent (or replaced if its
    /// stored record is malformed). The document is written back even when
    /// the mutation leaves the record unchanged. If the write fails the error
    /// is returned and the file keeps its previous content.
    pub fn apply<R>(
        &self,
        name: &str,
        mutation: impl FnOnce(&mut JunctionState) -> R,
    ) -> StateResult<R> {
        validate_junction_name(name)?;

        let _guard = self.lock.lock();
        let mut document = load_document(&self.path);
        let now = self.clock.now();

        let state = document.get_or_insert_with(name, || JunctionState::new(&self.timing, now))?;
        let result = mutation(state);
        state.validate(name)?;

        save_document(&self.path, &document).map_err(|e| {
            error!(target: "signalgrid-state-manager", junction = name, error = %e, "Failed to persist junction state");
            e
        })?;
        Ok(result)
    }

    /// Return the named junction, creating (and persisting) the default if absent
    pub fn get_or_create(&self, name: &str) -> StateResult<JunctionState> {
        self.apply(name, |state| state.clone())
    }

    /// Run `pass` over the whole document under the lock
    ///
    /// `pass` receives the current time and returns its result plus whether
    /// it changed anything; the document is written once, and only when it
    /// did.
    pub fn apply_all<R>(
        &self,
        pass: impl FnOnce(&mut JunctionDocument, f64) -> (R, bool),
    ) -> StateResult<R> {
        let _guard = self.lock.lock();
        let mut document = load_document(&self.path);
        let now = self.clock.now();

        let (result, changed) = pass(&mut document, now);
        if changed {
            save_document(&self.path, &document)?;
            debug!(target: "signalgrid-state-manager", junctions = document.len(), "Persisted state document");
        }
        Ok(result)
    }

    /// Best-effort read of one junction; never creates, never errors
    pub fn read(&self, name: &str) -> Option<JunctionState> {
        let _guard = self.lock.lock();
        load_document(&self.path).get(name).cloned()
    }

    /// Best-effort list of stored junction names, sorted
    pub fn junction_names(&self) -> Vec<String> {
        let _guard = self.lock.lock();
        load_document(&self.path)
            .names()
            .map(str::to_string)
            .collect()
    }

    /// Best-effort copy of every well-formed record
    pub fn snapshot(&self) -> BTreeMap<String, JunctionState> {
        let _guard = self.lock.lock();
        load_document(&self.path).valid_states()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("path", &self.path)
            .field("timing", &self.timing)
            .finish()
    }
}

fn validate_junction_name(name: &str) -> StateResult<()> {
    if name.trim().is_empty() {
        return Err(StateError::InvalidJunctionName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::junction::{Deadline, SignalMode};
    use crate::lanes::Lane;
    use tempfile::tempdir;

    fn store_in(dir: &Path, clock: Arc<ManualClock>) -> StateStore {
        StateStore::new(dir.join("state.json"), SignalTiming::default(), clock)
    }

    #[test]
    fn test_get_or_create_inserts_default_and_persists() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(1_000.0));
        let store = store_in(dir.path(), clock);

        let state = store.get_or_create("Fun Mall").unwrap();
        assert_eq!(state, JunctionState::new(&SignalTiming::default(), 1_000.0));
        assert_eq!(store.junction_names(), vec!["Fun Mall".to_string()]);
    }

    #[test]
    fn test_get_or_create_returns_existing() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(1_000.0));
        let store = store_in(dir.path(), clock.clone());

        store
            .apply("j", |s| s.lane_counts.set(Lane::South, 9))
            .unwrap();
        clock.advance(30.0);

        let state = store.get_or_create("j").unwrap();
        assert_eq!(*state.lane_counts.get(Lane::South), 9);
        assert_eq!(state.timer_end, Deadline::At(1_060.0));
    }

    #[test]
    fn test_apply_rejects_blank_name() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path(), Arc::new(ManualClock::new(0.0)));
        assert!(matches!(
            store.apply("  ", |_| ()),
            Err(StateError::InvalidJunctionName(_))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_apply_rejects_mutation_breaking_invariants() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path(), Arc::new(ManualClock::new(0.0)));
        store.get_or_create("j").unwrap();

        let result = store.apply("j", |s| s.mode = SignalMode::Stop);
        assert!(matches!(result, Err(StateError::InvariantViolation { .. })));
        assert_eq!(store.read("j").unwrap().mode, SignalMode::Auto);
    }

    #[test]
    fn test_apply_all_writes_only_when_changed() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path(), Arc::new(ManualClock::new(0.0)));

        let count = store.apply_all(|doc, _| (doc.len(), false)).unwrap();
        assert_eq!(count, 0);
        assert!(!store.path().exists());

        store
            .apply_all(|doc, now| {
                doc.insert("j", JunctionState::new(&SignalTiming::default(), now));
                ((), true)
            })
            .unwrap();
        assert!(store.read("j").is_some());
    }

    #[test]
    fn test_read_never_creates() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path(), Arc::new(ManualClock::new(0.0)));
        assert!(store.read("ghost").is_none());
        assert!(store.junction_names().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_document_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path(), Arc::new(ManualClock::new(0.0)));
        std::fs::write(store.path(), b"not json at all").unwrap();

        assert!(store.snapshot().is_empty());
        let state = store.get_or_create("j").unwrap();
        assert_eq!(state.mode, SignalMode::Auto);
        assert_eq!(store.junction_names(), vec!["j".to_string()]);
    }

    #[test]
    fn test_write_failure_is_surfaced() {
        let dir = tempdir().unwrap();
        // The state path is a directory, so the final rename fails
        let path = dir.path().join("state.json");
        std::fs::create_dir(&path).unwrap();
        let store = StateStore::new(
            &path,
            SignalTiming::default(),
            Arc::new(ManualClock::new(0.0)),
        );

        let result = store.apply("j", |s| s.mode = SignalMode::Manual);
        assert!(matches!(result, Err(StateError::Persistence { .. })));
        assert!(path.is_dir());
    }
}
