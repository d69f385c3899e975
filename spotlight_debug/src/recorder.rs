// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and stores every event as an
//! owned [`RecordedEvent`] stamped with the wall-clock offset from the
//! recorder's creation. Clones share one buffer, so hand a clone to the
//! controller and read the recording from the original.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use spotlight_core::trace::{
    CompletedEvent, FormulaFailedEvent, InputRejectedEvent, ResetEvent, RestoredEvent,
    SnapshotDiscardedEvent, StartedEvent, StepActivatedEvent, StepConfirmedEvent, TraceSink,
};

/// What happened.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// See [`StartedEvent`].
    Started {
        /// Playback position.
        video_time: f64,
    },
    /// See [`StepActivatedEvent`].
    StepActivated {
        /// Step index.
        step_index: u32,
        /// Spotlighted field.
        field_id: String,
        /// Configured pause time.
        pause_at: f64,
        /// Reported playback time.
        video_time: f64,
    },
    /// See [`StepConfirmedEvent`].
    StepConfirmed {
        /// Step index.
        step_index: u32,
        /// Committed field.
        field_id: String,
        /// Committed value, as displayed.
        value: String,
        /// Playback position.
        video_time: f64,
    },
    /// See [`InputRejectedEvent`].
    InputRejected {
        /// Target field.
        field_id: String,
        /// Raw input.
        raw: String,
        /// Reason.
        reason: String,
    },
    /// See [`CompletedEvent`].
    Completed {
        /// Playback position.
        video_time: f64,
        /// `(step id, value)` for every result.
        results: Vec<(String, f64)>,
    },
    /// See [`FormulaFailedEvent`].
    FormulaFailed {
        /// Step id.
        step_id: String,
        /// Formula source.
        formula: String,
        /// Error text.
        error: String,
    },
    /// See [`RestoredEvent`].
    Restored {
        /// Restored step.
        current_step: u32,
        /// Phase name.
        phase: String,
        /// Seek target.
        seek_to: f64,
    },
    /// See [`SnapshotDiscardedEvent`].
    SnapshotDiscarded {
        /// Reason.
        reason: String,
    },
    /// See [`ResetEvent`].
    Reset {
        /// Step reached before the reset.
        from_step: u32,
    },
}

impl EventKind {
    /// Short name for display and export.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Started",
            Self::StepActivated { .. } => "StepActivated",
            Self::StepConfirmed { .. } => "StepConfirmed",
            Self::InputRejected { .. } => "InputRejected",
            Self::Completed { .. } => "Completed",
            Self::FormulaFailed { .. } => "FormulaFailed",
            Self::Restored { .. } => "Restored",
            Self::SnapshotDiscarded { .. } => "SnapshotDiscarded",
            Self::Reset { .. } => "Reset",
        }
    }
}

/// One recorded event.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedEvent {
    /// Wall-clock offset from the recorder's creation.
    pub at: Duration,
    /// The event.
    pub kind: EventKind,
}

type Clock = Rc<dyn Fn() -> Duration>;

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Clone)]
pub struct RecorderSink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
    clock: Clock,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecorderSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderSink")
            .field("events", &self.events.borrow().len())
            .finish_non_exhaustive()
    }
}

impl RecorderSink {
    /// Creates an empty recorder timed by the system monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        let origin = Instant::now();
        Self::with_clock(move || origin.elapsed())
    }

    /// Creates an empty recorder timed by `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Fn() -> Duration + 'static) -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
            clock: Rc::new(clock),
        }
    }

    /// A copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, kind: EventKind) {
        let at = (self.clock)();
        self.events.borrow_mut().push(RecordedEvent { at, kind });
    }
}

impl TraceSink for RecorderSink {
    fn on_started(&mut self, e: &StartedEvent) {
        self.push(EventKind::Started {
            video_time: e.video_time,
        });
    }

    fn on_step_activated(&mut self, e: &StepActivatedEvent<'_>) {
        self.push(EventKind::StepActivated {
            step_index: e.step_index,
            field_id: e.field_id.to_owned(),
            pause_at: e.pause_at,
            video_time: e.video_time,
        });
    }

    fn on_step_confirmed(&mut self, e: &StepConfirmedEvent<'_>) {
        self.push(EventKind::StepConfirmed {
            step_index: e.step_index,
            field_id: e.field_id.to_owned(),
            value: e.value.to_string(),
            video_time: e.video_time,
        });
    }

    fn on_input_rejected(&mut self, e: &InputRejectedEvent<'_>) {
        self.push(EventKind::InputRejected {
            field_id: e.field_id.to_owned(),
            raw: e.raw.to_owned(),
            reason: e.reason.to_owned(),
        });
    }

    fn on_completed(&mut self, e: &CompletedEvent<'_>) {
        self.push(EventKind::Completed {
            video_time: e.video_time,
            results: e
                .results
                .steps()
                .iter()
                .map(|s| (s.id.clone(), s.value))
                .collect(),
        });
    }

    fn on_formula_failed(&mut self, e: &FormulaFailedEvent<'_>) {
        self.push(EventKind::FormulaFailed {
            step_id: e.step_id.to_owned(),
            formula: e.formula.to_owned(),
            error: e.error.to_string(),
        });
    }

    fn on_restored(&mut self, e: &RestoredEvent) {
        self.push(EventKind::Restored {
            current_step: e.current_step,
            phase: e.phase.to_string(),
            seek_to: e.seek_to,
        });
    }

    fn on_snapshot_discarded(&mut self, e: &SnapshotDiscardedEvent<'_>) {
        self.push(EventKind::SnapshotDiscarded {
            reason: e.reason.to_owned(),
        });
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        self.push(EventKind::Reset {
            from_step: e.from_step,
        });
    }
}
