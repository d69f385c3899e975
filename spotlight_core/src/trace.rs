// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle events from the worksheet controller.
//!
//! The controller calls one [`TraceSink`] method per transition. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine. Events borrow from controller state and are only valid for the
//! duration of the call; sinks that keep them must copy what they need.
//!
//! This is separate from the `tracing` log output: log lines are for humans
//! reading a console, trace events are for tools (recorders, timeline export,
//! test assertions).

use crate::field::FieldValue;
use crate::formula::{FormulaError, Results};
use crate::state::Phase;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the user leaves the start screen.
#[derive(Clone, Copy, Debug)]
pub struct StartedEvent {
    /// Playback position at start.
    pub video_time: f64,
}

/// Emitted when a pause point fires and a field is spotlighted.
#[derive(Clone, Copy, Debug)]
pub struct StepActivatedEvent<'a> {
    /// Step that activated.
    pub step_index: u32,
    /// Field now spotlighted.
    pub field_id: &'a str,
    /// Configured pause time.
    pub pause_at: f64,
    /// Reported playback time that crossed it.
    pub video_time: f64,
}

/// Emitted when a spotlighted field is confirmed.
#[derive(Clone, Copy, Debug)]
pub struct StepConfirmedEvent<'a> {
    /// Step that was confirmed.
    pub step_index: u32,
    /// Field that was committed.
    pub field_id: &'a str,
    /// Committed value.
    pub value: &'a FieldValue,
    /// Playback position.
    pub video_time: f64,
}

/// Emitted when a draft fails validation or targets a locked field.
#[derive(Clone, Copy, Debug)]
pub struct InputRejectedEvent<'a> {
    /// Field the input was aimed at.
    pub field_id: &'a str,
    /// Raw input text.
    pub raw: &'a str,
    /// Human-readable reason.
    pub reason: &'a str,
}

/// Emitted when results are computed.
#[derive(Clone, Copy, Debug)]
pub struct CompletedEvent<'a> {
    /// Playback position.
    pub video_time: f64,
    /// The results chain.
    pub results: &'a Results,
}

/// Emitted for each formula step that failed and was forced to `0`.
#[derive(Clone, Copy, Debug)]
pub struct FormulaFailedEvent<'a> {
    /// Step id.
    pub step_id: &'a str,
    /// Formula source.
    pub formula: &'a str,
    /// Why it failed.
    pub error: &'a FormulaError,
}

/// Emitted after a stored snapshot is applied.
#[derive(Clone, Copy, Debug)]
pub struct RestoredEvent {
    /// Restored step.
    pub current_step: u32,
    /// Phase the controller restored into.
    pub phase: Phase,
    /// Position playback was sought to.
    pub seek_to: f64,
}

/// Emitted when a stored snapshot is unusable and a fresh state is used.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotDiscardedEvent<'a> {
    /// Human-readable reason.
    pub reason: &'a str,
}

/// Emitted on reset.
#[derive(Clone, Copy, Debug)]
pub struct ResetEvent {
    /// Step the session had reached.
    pub from_step: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives lifecycle events from the controller.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when the session starts.
    fn on_started(&mut self, e: &StartedEvent) {
        _ = e;
    }

    /// Called when a step activates.
    fn on_step_activated(&mut self, e: &StepActivatedEvent<'_>) {
        _ = e;
    }

    /// Called when a step is confirmed.
    fn on_step_confirmed(&mut self, e: &StepConfirmedEvent<'_>) {
        _ = e;
    }

    /// Called when input is rejected.
    fn on_input_rejected(&mut self, e: &InputRejectedEvent<'_>) {
        _ = e;
    }

    /// Called when results are computed.
    fn on_completed(&mut self, e: &CompletedEvent<'_>) {
        _ = e;
    }

    /// Called for each failed formula step.
    fn on_formula_failed(&mut self, e: &FormulaFailedEvent<'_>) {
        _ = e;
    }

    /// Called after a snapshot is restored.
    fn on_restored(&mut self, e: &RestoredEvent) {
        _ = e;
    }

    /// Called when a snapshot is discarded.
    fn on_snapshot_discarded(&mut self, e: &SnapshotDiscardedEvent<'_>) {
        _ = e;
    }

    /// Called on reset.
    fn on_reset(&mut self, e: &ResetEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Forwards every event to both sinks, first then second.
impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn on_started(&mut self, e: &StartedEvent) {
        self.0.on_started(e);
        self.1.on_started(e);
    }

    fn on_step_activated(&mut self, e: &StepActivatedEvent<'_>) {
        self.0.on_step_activated(e);
        self.1.on_step_activated(e);
    }

    fn on_step_confirmed(&mut self, e: &StepConfirmedEvent<'_>) {
        self.0.on_step_confirmed(e);
        self.1.on_step_confirmed(e);
    }

    fn on_input_rejected(&mut self, e: &InputRejectedEvent<'_>) {
        self.0.on_input_rejected(e);
        self.1.on_input_rejected(e);
    }

    fn on_completed(&mut self, e: &CompletedEvent<'_>) {
        self.0.on_completed(e);
        self.1.on_completed(e);
    }

    fn on_formula_failed(&mut self, e: &FormulaFailedEvent<'_>) {
        self.0.on_formula_failed(e);
        self.1.on_formula_failed(e);
    }

    fn on_restored(&mut self, e: &RestoredEvent) {
        self.0.on_restored(e);
        self.1.on_restored(e);
    }

    fn on_snapshot_discarded(&mut self, e: &SnapshotDiscardedEvent<'_>) {
        self.0.on_snapshot_discarded(e);
        self.1.on_snapshot_discarded(e);
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        self.0.on_reset(e);
        self.1.on_reset(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_started(&StartedEvent { video_time: 0.0 });
        sink.on_step_activated(&StepActivatedEvent {
            step_index: 1,
            field_id: "income",
            pause_at: 3.0,
            video_time: 3.1,
        });
        sink.on_reset(&ResetEvent { from_step: 1 });
    }

    #[test]
    fn partial_sink_overrides_one_event() {
        struct Steps(Vec<u32>);
        impl TraceSink for Steps {
            fn on_step_activated(&mut self, e: &StepActivatedEvent<'_>) {
                self.0.push(e.step_index);
            }
        }

        let mut sink = Steps(Vec::new());
        for step_index in [1, 2] {
            sink.on_step_activated(&StepActivatedEvent {
                step_index,
                field_id: "f",
                pause_at: 0.0,
                video_time: 0.0,
            });
        }
        sink.on_started(&StartedEvent { video_time: 0.0 });
        assert_eq!(sink.0, [1, 2]);
    }

    #[test]
    fn pair_forwards_to_both() {
        struct Resets(u32);
        impl TraceSink for Resets {
            fn on_reset(&mut self, _: &ResetEvent) {
                self.0 += 1;
            }
        }

        let mut pair = (Resets(0), (NoopSink, Resets(10)));
        pair.on_reset(&ResetEvent { from_step: 2 });
        pair.on_started(&StartedEvent { video_time: 0.0 });
        assert_eq!(pair.0.0, 1);
        assert_eq!(pair.1.1.0, 11);
    }
}
