// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Persisted junction document (load/save)
//!
//! The document is one JSON object keyed by junction name. Loading never
//! fails: a missing or unparsable file is an empty document, and each entry
//! is decoded on its own so one corrupt record cannot hide the others.
//! Saving writes a temp file in the same directory, syncs it and renames it
//! over the target, so readers only ever see a complete document.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::junction::JunctionState;
use crate::{StateError, StateResult};

/// One stored record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JunctionEntry {
    Valid(JunctionState),
    /// Record that failed to decode or validate, kept verbatim
    Malformed(Value),
}

impl JunctionEntry {
    fn decode(name: &str, raw: Value) -> Self {
        match serde_json::from_value::<JunctionState>(raw.clone()) {
            Ok(state) => match state.validate(name) {
                Ok(()) => JunctionEntry::Valid(state),
                Err(e) => {
                    warn!(target: "signalgrid-state-manager", junction = name, error = %e, "Invalid junction record");
                    JunctionEntry::Malformed(raw)
                }
            },
            Err(e) => {
                warn!(target: "signalgrid-state-manager", junction = name, error = %e, "Malformed junction record");
                JunctionEntry::Malformed(raw)
            }
        }
    }

    pub fn as_valid(&self) -> Option<&JunctionState> {
        match self {
            JunctionEntry::Valid(state) => Some(state),
            JunctionEntry::Malformed(_) => None,
        }
    }

    pub fn as_valid_mut(&mut self) -> Option<&mut JunctionState> {
        match self {
            JunctionEntry::Valid(state) => Some(state),
            JunctionEntry::Malformed(_) => None,
        }
    }
}

/// Full persisted mapping, junction name -> record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JunctionDocument {
    entries: BTreeMap<String, JunctionEntry>,
}

impl JunctionDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a document from raw JSON text. Never fails.
    pub fn from_json_str(text: &str) -> Self {
        let raw: BTreeMap<String, Value> = match serde_json::from_str(text) {
            Ok(map) => map,
            Err(e) => {
                warn!(target: "signalgrid-state-manager", error = %e, "State document unparsable, treating as empty");
                return Self::default();
            }
        };

        let entries = raw
            .into_iter()
            .map(|(name, value)| {
                let entry = JunctionEntry::decode(&name, value);
                (name, entry)
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, name: &str) -> Option<&JunctionEntry> {
        self.entries.get(name)
    }

    pub fn get(&self, name: &str) -> Option<&JunctionState> {
        self.entries.get(name).and_then(JunctionEntry::as_valid)
    }

    pub fn insert(&mut self, name: impl Into<String>, state: JunctionState) {
        self.entries.insert(name.into(), JunctionEntry::Valid(state));
    }

    /// Mutable access to every entry, in name order
    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&str, &mut JunctionEntry)> {
        self.entries
            .iter_mut()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Resolve `name` to a valid record, inserting `default()` when it is
    /// absent or malformed.
    pub fn get_or_insert_with(
        &mut self,
        name: &str,
        default: impl FnOnce() -> JunctionState,
    ) -> StateResult<&mut JunctionState> {
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| JunctionEntry::Malformed(Value::Null));

        if let JunctionEntry::Malformed(raw) = entry {
            if raw.is_null() {
                debug!(target: "signalgrid-state-manager", junction = name, "Creating junction record");
            } else {
                warn!(target: "signalgrid-state-manager", junction = name, "Replacing malformed junction record with defaults");
            }
            *entry = JunctionEntry::Valid(default());
        }

        entry
            .as_valid_mut()
            .ok_or_else(|| StateError::InvariantViolation {
                junction: name.to_string(),
                detail: "record could not be replaced with defaults".to_string(),
            })
    }

    /// All well-formed records
    pub fn valid_states(&self) -> BTreeMap<String, JunctionState> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| entry.as_valid().map(|s| (name.clone(), s.clone())))
            .collect()
    }
}

/// Load the document at `path`, degrading to empty on any read problem
pub fn load_document(path: &Path) -> JunctionDocument {
    match std::fs::read_to_string(path) {
        Ok(text) => JunctionDocument::from_json_str(&text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(target: "signalgrid-state-manager", path = %path.display(), "No state document yet");
            JunctionDocument::default()
        }
        Err(e) => {
            warn!(target: "signalgrid-state-manager", path = %path.display(), error = %e, "State document unreadable, treating as empty");
            JunctionDocument::default()
        }
    }
}

/// Atomically replace the document at `path`
///
/// On error the previous file content is untouched.
pub fn save_document(path: &Path, document: &JunctionDocument) -> StateResult<()> {
    let bytes = serde_json::to_vec(document)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| StateError::Persistence {
        path: dir.display().to_string(),
        detail: format!("cannot create state directory: {}", e),
    })?;

    let persistence_error = |detail: String| StateError::Persistence {
        path: path.display().to_string(),
        detail,
    };

    let mut temp = tempfile::NamedTempFile::new_in(&dir)
        .map_err(|e| persistence_error(format!("cannot create temp file: {}", e)))?;
    temp.as_file_mut()
        .write_all(&bytes)
        .map_err(|e| persistence_error(format!("cannot write temp file: {}", e)))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| persistence_error(format!("cannot sync temp file: {}", e)))?;
    temp.persist(path)
        .map_err(|e| persistence_error(format!("cannot rename temp file: {}", e.error)))?;

    Ok(())
}
