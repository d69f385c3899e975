// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapshot persistence.
//!
//! One JSON blob per course, stored under [`storage_key`]:
//!
//! ```json
//! {"currentStep": 2, "inputs": {"income": 500, "rent": null}, "videoTime": 8.1, "isStarted": true}
//! ```
//!
//! Restoring never trusts the blob. It is decoded into a typed
//! [`Snapshot`] and then checked against the [`Worksheet`]: out of range
//! steps and gaps before the current step discard it, unknown keys and values
//! of the wrong kind are dropped. Write failures are logged and otherwise
//! ignored; losing a snapshot only costs the user a restart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::FieldValue;
use crate::state::AppState;
use crate::worksheet::Worksheet;

/// Prefix shared by every snapshot key.
pub const KEY_PREFIX: &str = "spotlight:";

/// Storage key for the course `slug`.
#[must_use]
pub fn storage_key(slug: &str) -> String {
    format!("{KEY_PREFIX}{slug}")
}

/// Failure reported by a [`Store`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing storage cannot be reached (disabled, private mode, ...).
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    /// The write was refused (quota, permissions, ...).
    #[error("storage write failed: {0}")]
    Write(String),
}

/// String key/value storage, e.g. browser `localStorage`.
pub trait Store {
    /// Reads `key`, `Ok(None)` when absent.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Deleting an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory [`Store`] for tests and native runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes all fail, for exercising the failure path.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Direct read, bypassing the trait.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Direct write, bypassing the read-only flag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Write("store is read-only".into()));
        }
        self.entries.insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Write("store is read-only".into()));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Why a stored snapshot was not used.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not JSON, or fields of the wrong type.
    #[error("snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    /// `currentStep` beyond the number of steps.
    #[error("snapshot step {step} is past the last step {total}")]
    StepOutOfRange {
        /// Stored step.
        step: u32,
        /// Steps in the worksheet.
        total: u32,
    },
    /// A step before the current one has no committed value.
    #[error("snapshot is missing a value for completed field `{0}`")]
    MissingInput(String),
}

/// The stored form of [`AppState`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// Last activated step.
    pub current_step: u32,
    /// Committed values by field id.
    pub inputs: BTreeMap<String, Option<FieldValue>>,
    /// Playback position when saved.
    pub video_time: f64,
    /// Whether the session had started.
    pub is_started: bool,
}

impl Snapshot {
    /// Captures `state`.
    #[must_use]
    pub fn capture(state: &AppState) -> Self {
        Self {
            current_step: state.current_step,
            inputs: state.inputs.clone(),
            video_time: if state.video_time.is_finite() {
                state.video_time
            } else {
                0.0
            },
            is_started: state.started,
        }
    }

    /// Serializes to the stored JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the stored JSON form. Shape only; see [`Self::into_state`].
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the snapshot against `sheet` and builds the state to resume.
    ///
    /// Returns `Ok(None)` for a snapshot that never left the start screen.
    pub fn into_state(self, sheet: &Worksheet) -> Result<Option<AppState>, SnapshotError> {
        // An unstarted session has nothing to resume, whatever else it holds.
        if !self.is_started {
            return Ok(None);
        }
        let total = sheet.total_steps();
        if self.current_step > total {
            return Err(SnapshotError::StepOutOfRange {
                step: self.current_step,
                total,
            });
        }

        let mut state = AppState::fresh(&sheet.fields);
        state.current_step = self.current_step;
        state.started = true;
        state.video_time = sheet.timeline.resume_point(self.current_step);

        for (id, value) in self.inputs {
            let Some(value) = value else { continue };
            let Some(field) = sheet.field(&id) else {
                tracing::debug!(field = %id, "dropping snapshot value for unknown field");
                continue;
            };
            if !field.kind.accepts(&value) {
                tracing::debug!(field = %id, %value, "dropping snapshot value of the wrong kind");
                continue;
            }
            let unlocked = sheet
                .timeline
                .step_for_field(&id)
                .is_some_and(|step| step <= self.current_step);
            if !unlocked {
                tracing::debug!(field = %id, "dropping snapshot value for a field not yet reached");
                continue;
            }
            state.inputs.insert(id, Some(value));
        }

        for entry in sheet.timeline.entries() {
            if entry.step_index >= self.current_step {
                break;
            }
            if state.value(&entry.field_id).is_none() {
                return Err(SnapshotError::MissingInput(entry.field_id.clone()));
            }
        }
        Ok(Some(state))
    }
}

/// Loads and validates the snapshot for `sheet`.
///
/// Anything unusable yields `Ok(None)` after a warning, as does a missing
/// snapshot; the error half reports why the stored blob was thrown away so
/// callers can trace it.
pub fn load(store: &dyn Store, sheet: &Worksheet) -> Result<Option<AppState>, SnapshotError> {
    let key = sheet.storage_key();
    let raw = match store.load(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Ok(None),
        Err(err) => {
            tracing::warn!(%key, %err, "could not read snapshot");
            return Ok(None);
        }
    };
    Snapshot::from_json(&raw)?.into_state(sheet)
}

/// Writes `state` for `sheet`, logging any failure.
pub fn save(store: &mut dyn Store, sheet: &Worksheet, state: &AppState) {
    let key = sheet.storage_key();
    let json = match Snapshot::capture(state).to_json() {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(%key, %err, "could not encode snapshot");
            return;
        }
    };
    if let Err(err) = store.save(&key, &json) {
        tracing::warn!(%key, %err, "could not write snapshot; continuing without it");
    }
}

/// Deletes the snapshot for `sheet`, logging any failure.
pub fn clear(store: &mut dyn Store, sheet: &Worksheet) {
    let key = sheet.storage_key();
    if let Err(err) = store.remove(&key) {
        tracing::warn!(%key, %err, "could not clear snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset;

    fn sheet() -> Worksheet {
        preset::budget_course().compile().unwrap()
    }

    fn restore(json: &str) -> Result<Option<AppState>, SnapshotError> {
        Snapshot::from_json(json)?.into_state(&sheet())
    }

    #[test]
    fn key_is_namespaced_by_slug() {
        assert_eq!(storage_key("budget"), "spotlight:budget");
        assert_eq!(sheet().storage_key(), "spotlight:budget");
    }

    #[test]
    fn round_trip_keeps_numeric_shape() {
        let sheet = sheet();
        let mut state = AppState::fresh(&sheet.fields);
        state.started = true;
        state.current_step = 2;
        state
            .inputs
            .insert("income".into(), Some(FieldValue::Number(500.0)));
        state.inputs.insert("rent".into(), Some(FieldValue::Number(10.0)));

        let json = Snapshot::capture(&state).to_json().unwrap();
        assert!(json.contains("\"income\":500.0"), "{json}");
        assert!(json.contains("\"reserve\":null"), "{json}");
        assert!(json.contains("\"isStarted\":true"), "{json}");

        let restored = restore(&json).unwrap().unwrap();
        assert_eq!(restored.current_step, 2);
        assert_eq!(restored.inputs, state.inputs);
        assert_eq!(restored.video_time, 8.0, "resumes at the step's pause point");
    }

    #[test]
    fn malformed_snapshots_are_rejected() {
        assert!(matches!(restore("not json"), Err(SnapshotError::Malformed(_))));
        assert!(matches!(
            restore(r#"{"currentStep": "two", "isStarted": true}"#),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            restore(r#"{"currentStep": -1, "isStarted": true}"#),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            restore(r#"{"currentStep": 9, "isStarted": true}"#),
            Err(SnapshotError::StepOutOfRange { step: 9, total: 4 })
        ));
    }

    #[test]
    fn gap_before_current_step_discards() {
        let json = r#"{"currentStep": 3, "inputs": {"income": 500, "savings": 5}, "isStarted": true}"#;
        assert!(matches!(restore(json), Err(SnapshotError::MissingInput(f)) if f == "rent"));
    }

    #[test]
    fn unknown_and_ill_typed_values_are_dropped() {
        let json = r#"{
            "currentStep": 2,
            "inputs": {"income": 500, "rent": "ten", "bonus": 3, "reserve": 1},
            "isStarted": true
        }"#;
        let state = restore(json).unwrap().unwrap();
        assert_eq!(state.value("income"), Some(&FieldValue::Number(500.0)));
        assert!(state.value("rent").is_none(), "text in a number field");
        assert!(!state.inputs.contains_key("bonus"));
        assert!(state.value("reserve").is_none(), "not reached yet");
    }

    #[test]
    fn not_started_is_fresh() {
        assert!(restore(r#"{"currentStep": 0, "isStarted": false}"#).unwrap().is_none());
        assert!(restore("{}").unwrap().is_none());
    }

    #[test]
    fn not_started_with_progress_is_fresh_not_malformed() {
        let json = r#"{"currentStep": 2, "inputs": {"income": 500, "rent": 10}, "isStarted": false}"#;
        assert!(restore(json).unwrap().is_none());
    }

    #[test]
    fn store_failures_are_swallowed() {
        let sheet = sheet();
        let mut store = MemoryStore::read_only();
        let state = AppState::fresh(&sheet.fields);
        save(&mut store, &sheet, &state);
        clear(&mut store, &sheet);
        assert!(load(&store, &sheet).unwrap().is_none());
    }
}
