// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pause points on the video timeline.
//!
//! A [`Timeline`] is built once from the course's cue list and never changes.
//! Entries are sorted by [`pause_at`](TimelineEntry::pause_at) and numbered
//! `1..=N`, so "lowest pause time" and "lowest step index" pick the same
//! entry.
//!
//! [`next_pause`] is the whole evaluator: it looks only at entries with a
//! step index above the current step. Callers advance `current_step` when a
//! step activates, which is what keeps a pause from firing twice.

use crate::course::{ConfigError, TimelineCue};

/// One pause point: where playback stops and which field unlocks.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEntry {
    /// Video time in seconds at which playback pauses.
    pub pause_at: f64,
    /// 1-based step number.
    pub step_index: u32,
    /// Field unlocked at this pause.
    pub field_id: String,
    /// Prompt shown while the field is spotlighted.
    pub prompt: String,
}

/// An immutable, validated list of pause points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Builds a timeline from unordered cues.
    ///
    /// Cues are stably sorted by pause time and numbered from 1. Negative or
    /// non-finite pause times are rejected.
    pub fn from_cues(cues: &[TimelineCue]) -> Result<Self, ConfigError> {
        if cues.is_empty() {
            return Err(ConfigError::EmptyTimeline);
        }
        for cue in cues {
            if !cue.pause_at.is_finite() || cue.pause_at < 0.0 {
                return Err(ConfigError::InvalidPause {
                    field_id: cue.field_id.clone(),
                    pause_at: cue.pause_at,
                });
            }
        }

        let mut sorted: Vec<&TimelineCue> = cues.iter().collect();
        sorted.sort_by(|a, b| a.pause_at.total_cmp(&b.pause_at));

        let entries = sorted
            .into_iter()
            .zip(1_u32..)
            .map(|(cue, step_index)| TimelineEntry {
                pause_at: cue.pause_at,
                step_index,
                field_id: cue.field_id.clone(),
                prompt: cue.prompt.clone(),
            })
            .collect();
        Ok(Self { entries })
    }

    /// Number of steps (`N`).
    #[must_use]
    pub fn len(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    /// Returns `true` if there are no pause points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in step order.
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// The entry for a 1-based step index.
    #[must_use]
    pub fn entry(&self, step_index: u32) -> Option<&TimelineEntry> {
        let idx = usize::try_from(step_index.checked_sub(1)?).ok()?;
        self.entries.get(idx)
    }

    /// The step that unlocks `field_id`, if any.
    #[must_use]
    pub fn step_for_field(&self, field_id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.field_id == field_id)
            .map(|e| e.step_index)
    }

    /// See [`next_pause`].
    #[must_use]
    pub fn next_pause(&self, current_step: u32, time: f64) -> Option<&TimelineEntry> {
        next_pause(&self.entries, current_step, time)
    }

    /// Where playback resumes after restoring at `current_step`: the pause
    /// point of that step, or `0` before the first one.
    #[must_use]
    pub fn resume_point(&self, current_step: u32) -> f64 {
        self.entry(current_step).map_or(0.0, |e| e.pause_at)
    }

    /// The most recent entry whose pause point `time` has passed.
    #[must_use]
    pub fn latest_crossed(&self, time: f64) -> Option<&TimelineEntry> {
        self.entries.iter().rev().find(|e| time >= e.pause_at)
    }
}

/// Returns the first entry after `current_step` whose pause point `time` has
/// crossed, or `None`.
///
/// Pure and idempotent: the same `(current_step, time)` always yields the
/// same entry. A `NaN` time never crosses anything.
#[must_use]
pub fn next_pause(
    entries: &[TimelineEntry],
    current_step: u32,
    time: f64,
) -> Option<&TimelineEntry> {
    entries
        .iter()
        .filter(|e| e.step_index > current_step)
        .find(|e| time >= e.pause_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(pause_at: f64, field_id: &str) -> TimelineCue {
        TimelineCue {
            pause_at,
            field_id: field_id.into(),
            prompt: format!("Enter {field_id}"),
        }
    }

    fn income_rent() -> Timeline {
        Timeline::from_cues(&[cue(3.0, "income"), cue(8.0, "rent")]).unwrap()
    }

    #[test]
    fn cues_are_sorted_and_numbered() {
        let timeline =
            Timeline::from_cues(&[cue(13.0, "savings"), cue(3.0, "income"), cue(8.0, "rent")])
                .unwrap();
        let steps: Vec<(u32, &str)> = timeline
            .entries()
            .iter()
            .map(|e| (e.step_index, e.field_id.as_str()))
            .collect();
        assert_eq!(steps, [(1, "income"), (2, "rent"), (3, "savings")]);
    }

    #[test]
    fn empty_and_negative_cues_are_rejected() {
        assert!(matches!(
            Timeline::from_cues(&[]),
            Err(ConfigError::EmptyTimeline)
        ));
        assert!(matches!(
            Timeline::from_cues(&[cue(-1.0, "income")]),
            Err(ConfigError::InvalidPause { .. })
        ));
        assert!(matches!(
            Timeline::from_cues(&[cue(f64::NAN, "income")]),
            Err(ConfigError::InvalidPause { .. })
        ));
    }

    #[test]
    fn income_then_rent_scenario() {
        let timeline = income_rent();
        assert!(timeline.next_pause(0, 2.9).is_none());

        let first = timeline.next_pause(0, 3.2).expect("step 1 should fire");
        assert_eq!(first.step_index, 1);
        assert_eq!(first.field_id, "income");

        // Still at step 1 (confirmed), before the second pause.
        assert!(timeline.next_pause(1, 5.0).is_none());

        let second = timeline.next_pause(1, 8.5).expect("step 2 should fire");
        assert_eq!(second.step_index, 2);
        assert_eq!(second.field_id, "rent");
    }

    #[test]
    fn never_returns_passed_steps() {
        let timeline = Timeline::from_cues(&[
            cue(3.0, "income"),
            cue(8.0, "rent"),
            cue(13.0, "savings"),
            cue(18.0, "reserve"),
        ])
        .unwrap();
        for current in 0..=4 {
            for tenth in 0..250 {
                let time = f64::from(tenth) / 10.0;
                if let Some(e) = timeline.next_pause(current, time) {
                    assert!(
                        e.step_index > current,
                        "step {} returned at current={current} time={time}",
                        e.step_index
                    );
                    assert!(time >= e.pause_at, "pause {} not crossed", e.pause_at);
                }
            }
        }
    }

    #[test]
    fn evaluation_is_idempotent() {
        let timeline = income_rent();
        let a = timeline.next_pause(0, 9.0).map(|e| e.step_index);
        let b = timeline.next_pause(0, 9.0).map(|e| e.step_index);
        assert_eq!(a, b);
        // Jumping past both pauses still yields the earliest one first.
        assert_eq!(a, Some(1));
    }

    #[test]
    fn nan_time_never_crosses() {
        assert!(income_rent().next_pause(0, f64::NAN).is_none());
    }

    #[test]
    fn resume_point_and_latest_crossed() {
        let timeline = income_rent();
        assert_eq!(timeline.resume_point(0), 0.0);
        assert_eq!(timeline.resume_point(1), 3.0);
        assert_eq!(timeline.resume_point(2), 8.0);
        assert!(timeline.latest_crossed(1.0).is_none());
        assert_eq!(timeline.latest_crossed(9.0).map(|e| e.step_index), Some(2));
        assert_eq!(timeline.step_for_field("rent"), Some(2));
        assert!(timeline.entry(0).is_none());
        assert!(timeline.entry(3).is_none());
    }
}
