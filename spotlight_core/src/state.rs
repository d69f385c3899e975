// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Controller state.

use core::fmt;
use std::collections::BTreeMap;

use crate::field::{FieldDefinition, FieldValue};
use crate::formula::Environment;
use crate::timeline::Timeline;

/// Where the worksheet is in its flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Start screen shown; nothing has played.
    #[default]
    Idle,
    /// Playing (or about to play) past step `step`.
    Resuming {
        /// Last activated step, `0` before the first pause.
        step: u32,
    },
    /// Paused with field `step` spotlighted.
    AwaitingInput {
        /// The spotlighted step.
        step: u32,
    },
    /// Every field confirmed and playback finished; results are shown.
    Completed,
}

impl Phase {
    /// Short lowercase name for logs and traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resuming { .. } => "resuming",
            Self::AwaitingInput { .. } => "awaiting_input",
            Self::Completed => "completed",
        }
    }

    /// The spotlighted step, if any.
    #[must_use]
    pub const fn spotlight_step(self) -> Option<u32> {
        match self {
            Self::AwaitingInput { step } => Some(step),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resuming { step } | Self::AwaitingInput { step } => {
                write!(f, "{}({step})", self.name())
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// The mutable part of a worksheet session. Owned by the
/// [`Controller`](crate::controller::Controller).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Last activated step, `0..=N`.
    pub current_step: u32,
    /// Committed value per field id; `None` until confirmed.
    pub inputs: BTreeMap<String, Option<FieldValue>>,
    /// Last reported playback position in seconds.
    pub video_time: f64,
    /// Whether a field is spotlighted.
    pub spotlight_active: bool,
    /// Whether the user has left the start screen.
    pub started: bool,
}

impl AppState {
    /// A state with every field empty.
    #[must_use]
    pub fn fresh(fields: &[FieldDefinition]) -> Self {
        Self {
            inputs: fields.iter().map(|f| (f.id.clone(), None)).collect(),
            ..Self::default()
        }
    }

    /// The committed value of `field_id`.
    #[must_use]
    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.inputs.get(field_id).and_then(Option::as_ref)
    }

    /// Returns `true` when every field the timeline unlocks has a committed
    /// value. Fields without a pause point can never be answered and do not
    /// count.
    #[must_use]
    pub fn answered(&self, timeline: &Timeline) -> bool {
        timeline
            .entries()
            .iter()
            .all(|entry| self.value(&entry.field_id).is_some())
    }

    /// Committed values as formula variables. Empty fields stay unbound and
    /// therefore read as `0`.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.inputs
            .iter()
            .filter_map(|(id, v)| v.as_ref().map(|v| (id.as_str(), v.as_number())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::TimelineCue;

    fn fields() -> Vec<FieldDefinition> {
        ["income", "rent"]
            .into_iter()
            .map(|id| FieldDefinition {
                id: id.into(),
                ..FieldDefinition::default()
            })
            .collect()
    }

    #[test]
    fn fresh_state_has_every_field_empty() {
        let state = AppState::fresh(&fields());
        assert_eq!(state.current_step, 0);
        assert_eq!(state.inputs.len(), 2);
        assert!(state.value("income").is_none());
    }

    #[test]
    fn answered_ignores_fields_without_a_pause() {
        let timeline = Timeline::from_cues(&[TimelineCue {
            pause_at: 3.0,
            field_id: "income".into(),
            prompt: String::new(),
        }])
        .unwrap();
        let mut state = AppState::fresh(&fields());
        assert!(!state.answered(&timeline));
        state
            .inputs
            .insert("income".into(), Some(FieldValue::Number(500.0)));
        assert!(state.answered(&timeline), "rent has no pause point");
    }

    #[test]
    fn environment_binds_committed_values_only() {
        let mut state = AppState::fresh(&fields());
        state
            .inputs
            .insert("rent".into(), Some(FieldValue::Number(10.0)));
        let env = state.environment();
        assert_eq!(env.get("rent"), 10.0);
        assert!(!env.contains("income"));
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::AwaitingInput { step: 2 }.to_string(), "awaiting_input(2)");
        assert_eq!(Phase::Completed.to_string(), "completed");
        assert_eq!(Phase::Resuming { step: 1 }.spotlight_step(), None);
    }
}
