// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The form-unlock state machine.
//!
//! ```text
//!            start                 next_pause fires
//!   Idle ───────────► Resuming(0) ─────────────────► AwaitingInput(k)
//!                        ▲    │                           │
//!                        │    │ ended, k == N             │ confirm (valid)
//!                        │    ▼                           ▼
//!                        │  Completed               Resuming(k)
//!                        └────────────────────────────────┘
//! ```
//!
//! [`Controller`] owns the [`AppState`], the playback backend, and the
//! snapshot store. Every state change goes through one of its transition
//! methods, and every transition persists a snapshot and re-renders.
//!
//! Only `Resuming` ever looks at the timeline. Time updates that arrive while
//! a field is spotlighted, before the session starts, or after completion
//! are recorded and otherwise ignored, so one pause can never be skipped or
//! activated twice.
//!
//! In a page, [`attach`](Controller::attach) moves the controller into an
//! `Rc<RefCell<_>>` and registers playback callbacks that hold only a `Weak`
//! reference to it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::field::{FieldKind, FieldValue};
use crate::formula::{Results, evaluate_steps};
use crate::message::compose_summary;
use crate::persist::{self, Store};
use crate::playback::Playback;
use crate::state::{AppState, Phase};
use crate::timeline::TimelineEntry;
use crate::trace::{
    CompletedEvent, FormulaFailedEvent, InputRejectedEvent, NoopSink, ResetEvent, RestoredEvent,
    SnapshotDiscardedEvent, StartedEvent, StepActivatedEvent, StepConfirmedEvent, TraceSink,
};
use crate::view::{ViewInputs, WorksheetView};
use crate::worksheet::Worksheet;

/// A user action the current phase does not allow.
///
/// Messages are short enough to show inline under the field.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GateError {
    /// The action does not apply in this phase.
    #[error("that is not available right now ({phase})")]
    WrongPhase {
        /// Phase at the time of the call.
        phase: Phase,
    },
    /// The field is not the spotlighted one.
    #[error("this field is locked")]
    Locked {
        /// Target field.
        field_id: String,
    },
    /// A number field got something that is not a number above zero.
    #[error("enter a number greater than 0")]
    InvalidNumber {
        /// Target field.
        field_id: String,
    },
    /// A text field got blank input.
    #[error("this field cannot be empty")]
    EmptyText {
        /// Target field.
        field_id: String,
    },
}

impl GateError {
    fn invalid(kind: FieldKind, field_id: &str) -> Self {
        let field_id = field_id.to_owned();
        match kind {
            FieldKind::Number => Self::InvalidNumber { field_id },
            FieldKind::Text => Self::EmptyText { field_id },
        }
    }
}

type RenderListener = Box<dyn FnMut(&WorksheetView)>;

/// Drives one worksheet session.
pub struct Controller {
    sheet: Worksheet,
    state: AppState,
    phase: Phase,
    draft: String,
    error: Option<GateError>,
    results: Option<Results>,
    /// Playback reported `ended` since the last seek.
    ended: bool,
    playback: Box<dyn Playback>,
    store: Box<dyn Store>,
    sink: Box<dyn TraceSink>,
    listener: Option<RenderListener>,
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("slug", &self.sheet.slug)
            .field("phase", &self.phase)
            .field("current_step", &self.state.current_step)
            .field("video_time", &self.state.video_time)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Creates an idle controller with a fresh state. Call
    /// [`restore`](Self::restore) to pick up a stored session.
    #[must_use]
    pub fn new(sheet: Worksheet, playback: Box<dyn Playback>, store: Box<dyn Store>) -> Self {
        let state = AppState::fresh(&sheet.fields);
        Self {
            sheet,
            state,
            phase: Phase::Idle,
            draft: String::new(),
            error: None,
            results: None,
            ended: false,
            playback,
            store,
            sink: Box::new(NoopSink),
            listener: None,
        }
    }

    /// Replaces the trace sink.
    #[must_use]
    pub fn with_trace(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Registers the render callback, replacing any previous one, and
    /// renders once.
    pub fn on_render(&mut self, listener: impl FnMut(&WorksheetView) + 'static) {
        self.listener = Some(Box::new(listener));
        self.notify();
    }

    /// Moves the controller behind `Rc<RefCell<_>>` and subscribes it to its
    /// playback backend.
    ///
    /// A playback event that arrives while the controller is already borrowed
    /// is dropped with a warning; the next time update carries the same
    /// information.
    pub fn attach(self) -> Rc<RefCell<Self>> {
        let this = Rc::new(RefCell::new(self));
        let weak = Rc::downgrade(&this);
        let on_time = weak.clone();
        let mut controller = this.borrow_mut();
        controller.playback.on_time_update(Box::new(move |time| {
            dispatch(&on_time, |c| c.handle_time_update(time));
        }));
        controller.playback.on_ended(Box::new(move || {
            dispatch(&weak, Controller::handle_ended);
        }));
        drop(controller);
        this
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The worksheet definition.
    #[must_use]
    pub fn worksheet(&self) -> &Worksheet {
        &self.sheet
    }

    /// Session state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Text in the spotlighted input.
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Results, once completed.
    #[must_use]
    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    /// The snapshot store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Projects the current state for rendering.
    #[must_use]
    pub fn view(&self) -> WorksheetView {
        let message = self.error.as_ref().map(ToString::to_string);
        WorksheetView::project(
            &self.sheet,
            ViewInputs {
                state: &self.state,
                phase: self.phase,
                draft: &self.draft,
                message: message.as_deref(),
                results: self.results.as_ref(),
                playing: self.playback.is_playing(),
            },
        )
    }

    /// The outbound summary, once completed.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let results = self.results.as_ref()?;
        (self.phase == Phase::Completed).then(|| compose_summary(&self.sheet, &self.state, results))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Applies the stored snapshot, if any.
    ///
    /// A session that had every field confirmed comes back completed. One
    /// that was waiting on a field comes back with that field spotlighted.
    /// Anything else comes back paused in `Resuming`, at the pause point of
    /// its last step; [`resume`](Self::resume) continues it.
    pub fn restore(&mut self) {
        let state = match persist::load(self.store.as_ref(), &self.sheet) {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(slug = %self.sheet.slug, %err, "discarding stored session");
                let reason = err.to_string();
                self.sink
                    .on_snapshot_discarded(&SnapshotDiscardedEvent { reason: &reason });
                persist::clear(self.store.as_mut(), &self.sheet);
                return;
            }
        };

        let step = state.current_step;
        let total = self.sheet.total_steps();
        let seek_to = self.sheet.timeline.resume_point(step);
        self.state = state;
        self.draft.clear();
        self.error = None;

        let pending = self
            .sheet
            .timeline
            .entry(step)
            .is_some_and(|entry| self.state.value(&entry.field_id).is_none());
        self.phase = if step == total && self.state.answered(&self.sheet.timeline) {
            Phase::Completed
        } else if pending {
            Phase::AwaitingInput { step }
        } else {
            Phase::Resuming { step }
        };
        self.state.spotlight_active = pending;

        self.ended = false;
        self.playback.pause();
        self.playback.seek_to(seek_to);
        if self.phase == Phase::Completed {
            self.evaluate();
        }

        tracing::info!(slug = %self.sheet.slug, phase = %self.phase, seek_to, "restored session");
        self.sink.on_restored(&RestoredEvent {
            current_step: step,
            phase: self.phase,
            seek_to,
        });
        self.notify();
    }

    /// Leaves the start screen and starts playback.
    pub fn start(&mut self) -> Result<(), GateError> {
        if self.phase != Phase::Idle {
            return Err(self.wrong_phase());
        }
        self.state.started = true;
        self.phase = Phase::Resuming { step: 0 };
        self.save();
        self.sink.on_started(&StartedEvent {
            video_time: self.state.video_time,
        });
        self.playback.play();
        self.notify();
        Ok(())
    }

    /// Continues a paused `Resuming` session, e.g. after a restore.
    pub fn resume(&mut self) -> Result<(), GateError> {
        let Phase::Resuming { step } = self.phase else {
            return Err(self.wrong_phase());
        };
        if step == self.sheet.total_steps()
            && self.state.answered(&self.sheet.timeline)
            && self.reached_end()
        {
            self.complete();
        } else if !self.playback.is_playing() {
            self.playback.play();
        }
        self.notify();
        Ok(())
    }

    /// Feeds a playback position. Activates the next crossed pause point
    /// while `Resuming`; otherwise only records the time.
    pub fn handle_time_update(&mut self, time: f64) {
        if time.is_finite() {
            self.state.video_time = time;
        }
        if let Phase::Resuming { .. } = self.phase
            && let Some(entry) = self.sheet.timeline.next_pause(self.state.current_step, time)
        {
            let entry = entry.clone();
            self.activate(&entry, time);
        }
        self.notify();
    }

    /// Playback reached the end.
    ///
    /// The end is remembered even while a field is spotlighted, so confirming
    /// the last field afterwards completes without replaying.
    pub fn handle_ended(&mut self) {
        self.ended = true;
        let total = self.sheet.total_steps();
        match self.phase {
            Phase::Resuming { step } if step == total && self.state.answered(&self.sheet.timeline) => {
                self.complete();
                self.notify();
            }
            Phase::Resuming { step } => {
                tracing::warn!(
                    slug = %self.sheet.slug,
                    step,
                    total,
                    "video ended before every pause point was reached"
                );
            }
            _ => {}
        }
    }

    /// Updates the spotlighted field's draft. Every other field is locked,
    /// including ones already confirmed.
    pub fn set_draft(&mut self, field_id: &str, raw: &str) -> Result<(), GateError> {
        let spotlighted = self
            .spotlight_entry()
            .is_some_and(|entry| entry.field_id == field_id);
        if !spotlighted {
            let err = GateError::Locked {
                field_id: field_id.to_owned(),
            };
            self.reject(field_id, raw, &err);
            return Err(err);
        }
        raw.clone_into(&mut self.draft);
        self.error = None;
        self.notify();
        Ok(())
    }

    /// Commits the draft and resumes playback.
    ///
    /// An invalid draft is refused with nothing changed but the inline
    /// message.
    pub fn confirm(&mut self) -> Result<(), GateError> {
        let Some(entry) = self.spotlight_entry().cloned() else {
            return Err(self.wrong_phase());
        };
        let kind = self
            .sheet
            .field(&entry.field_id)
            .map_or(FieldKind::Number, |f| f.kind);
        let Some(value) = kind.parse(&self.draft) else {
            let err = GateError::invalid(kind, &entry.field_id);
            let raw = self.draft.clone();
            self.reject(&entry.field_id, &raw, &err);
            self.error = Some(err.clone());
            self.notify();
            return Err(err);
        };

        self.commit(&entry, value);
        if entry.step_index == self.sheet.total_steps() && self.reached_end() {
            self.complete();
        } else {
            self.playback.play();
        }
        self.notify();
        Ok(())
    }

    /// Clears the stored session and returns to the start screen.
    pub fn reset(&mut self) {
        self.sink.on_reset(&ResetEvent {
            from_step: self.state.current_step,
        });
        persist::clear(self.store.as_mut(), &self.sheet);
        self.state = AppState::fresh(&self.sheet.fields);
        self.phase = Phase::Idle;
        self.draft.clear();
        self.error = None;
        self.results = None;
        self.ended = false;
        self.playback.pause();
        self.playback.seek_to(0.0);
        tracing::info!(slug = %self.sheet.slug, "session reset");
        self.notify();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn activate(&mut self, entry: &TimelineEntry, time: f64) {
        self.playback.pause();
        self.state.current_step = entry.step_index;
        self.state.spotlight_active = true;
        self.phase = Phase::AwaitingInput {
            step: entry.step_index,
        };
        self.draft = self
            .state
            .value(&entry.field_id)
            .map(ToString::to_string)
            .unwrap_or_default();
        self.error = None;
        self.save();
        tracing::debug!(step = entry.step_index, field = %entry.field_id, time, "step activated");
        self.sink.on_step_activated(&StepActivatedEvent {
            step_index: entry.step_index,
            field_id: &entry.field_id,
            pause_at: entry.pause_at,
            video_time: time,
        });
    }

    fn commit(&mut self, entry: &TimelineEntry, value: FieldValue) {
        self.sink.on_step_confirmed(&StepConfirmedEvent {
            step_index: entry.step_index,
            field_id: &entry.field_id,
            value: &value,
            video_time: self.state.video_time,
        });
        self.state.inputs.insert(entry.field_id.clone(), Some(value));
        self.state.spotlight_active = false;
        self.phase = Phase::Resuming {
            step: entry.step_index,
        };
        self.draft.clear();
        self.error = None;
        self.save();
    }

    fn complete(&mut self) {
        self.evaluate();
        self.phase = Phase::Completed;
        self.save();
        tracing::info!(slug = %self.sheet.slug, "worksheet completed");
        if let Some(results) = &self.results {
            self.sink.on_completed(&CompletedEvent {
                video_time: self.state.video_time,
                results,
            });
        }
    }

    fn evaluate(&mut self) {
        let results = evaluate_steps(&self.sheet.steps, &self.state.environment());
        for failed in results.failures() {
            if let Some(error) = &failed.error {
                let formula = self
                    .sheet
                    .steps
                    .iter()
                    .find(|s| s.id == failed.id)
                    .map_or("", |s| s.formula.as_str());
                self.sink.on_formula_failed(&FormulaFailedEvent {
                    step_id: &failed.id,
                    formula,
                    error,
                });
            }
        }
        self.results = Some(results);
    }

    fn spotlight_entry(&self) -> Option<&TimelineEntry> {
        self.phase
            .spotlight_step()
            .and_then(|step| self.sheet.timeline.entry(step))
    }

    fn reached_end(&self) -> bool {
        self.ended || self.at_end()
    }

    fn at_end(&self) -> bool {
        let duration = self.playback.duration();
        let end = if duration > 0.0 { duration } else { self.sheet.duration };
        self.playback.current_time() >= end
    }

    fn reject(&mut self, field_id: &str, raw: &str, err: &GateError) {
        tracing::debug!(field = field_id, %err, "input rejected");
        let reason = err.to_string();
        self.sink.on_input_rejected(&InputRejectedEvent {
            field_id,
            raw,
            reason: &reason,
        });
    }

    fn wrong_phase(&self) -> GateError {
        GateError::WrongPhase { phase: self.phase }
    }

    fn save(&mut self) {
        persist::save(self.store.as_mut(), &self.sheet, &self.state);
    }

    fn notify(&mut self) {
        if self.listener.is_none() {
            return;
        }
        let view = self.view();
        if let Some(listener) = &mut self.listener {
            listener(&view);
        }
    }
}

fn dispatch(weak: &Weak<RefCell<Controller>>, f: impl FnOnce(&mut Controller)) {
    let Some(controller) = weak.upgrade() else {
        return;
    };
    match controller.try_borrow_mut() {
        Ok(mut controller) => f(&mut controller),
        Err(_) => tracing::warn!("controller busy; dropping playback event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::Course;
    use crate::persist::{MemoryStore, Snapshot};
    use crate::preset;
    use crate::scripted::{PlaybackCommand, ScriptedHandle, ScriptedPlayback};
    use crate::view::FieldStatus;

    const FRAME: f64 = 0.25;

    struct Log(Rc<RefCell<Vec<String>>>);

    impl TraceSink for Log {
        fn on_step_activated(&mut self, e: &StepActivatedEvent<'_>) {
            self.0.borrow_mut().push(format!("activated {}", e.step_index));
        }
        fn on_step_confirmed(&mut self, e: &StepConfirmedEvent<'_>) {
            self.0.borrow_mut().push(format!("confirmed {}", e.step_index));
        }
        fn on_completed(&mut self, _: &CompletedEvent<'_>) {
            self.0.borrow_mut().push("completed".into());
        }
        fn on_snapshot_discarded(&mut self, _: &SnapshotDiscardedEvent<'_>) {
            self.0.borrow_mut().push("discarded".into());
        }
    }

    fn budget() -> Worksheet {
        preset::budget_course().compile().unwrap()
    }

    fn setup_with(sheet: Worksheet, store: MemoryStore) -> (Rc<RefCell<Controller>>, ScriptedHandle) {
        let (playback, handle) = ScriptedPlayback::new(sheet.duration);
        let controller = Controller::new(sheet, Box::new(playback), Box::new(store)).attach();
        (controller, handle)
    }

    fn setup() -> (Rc<RefCell<Controller>>, ScriptedHandle) {
        setup_with(budget(), MemoryStore::new())
    }

    fn answer(c: &Rc<RefCell<Controller>>, field: &str, raw: &str) {
        let mut c = c.borrow_mut();
        c.set_draft(field, raw).unwrap();
        c.confirm().unwrap();
    }

    fn stored(c: &Rc<RefCell<Controller>>) -> Option<Snapshot> {
        let c = c.borrow();
        let raw = c.store().load(&c.worksheet().storage_key()).unwrap()?;
        Some(Snapshot::from_json(&raw).unwrap())
    }

    #[test]
    fn full_session_reaches_results() {
        let (c, handle) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut ctl = c.borrow_mut();
            ctl.sink = Box::new(Log(Rc::clone(&log)));
            ctl.start().unwrap();
        }

        for (step, field, raw, pause) in [
            (1, "income", "500", 3.0),
            (2, "rent", "10", 8.0),
            (3, "savings", "5", 13.0),
            (4, "reserve", "3", 18.0),
        ] {
            let stopped = handle.run(FRAME, 60.0);
            assert_eq!(stopped, pause, "paused at step {step}");
            assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step });
            assert!(!handle.is_playing());
            answer(&c, field, raw);
            assert_eq!(c.borrow().phase(), Phase::Resuming { step });
            assert!(handle.is_playing());
        }

        assert_eq!(handle.run(FRAME, 60.0), 20.0);
        let ctl = c.borrow();
        assert_eq!(ctl.phase(), Phase::Completed);
        let results = ctl.results().unwrap();
        assert_eq!(results.value("safeMonthlyPayment"), Some(12.0));
        assert_eq!(results.value("totalBudget"), Some(3919.0));

        let view = ctl.view();
        let panel = view.results.unwrap();
        assert_eq!(panel.items.len(), 2);
        assert!(panel.items[1].is_main);
        assert_eq!(panel.items[1].value, "3,919");
        assert!(ctl.summary().unwrap().contains("3,919"));

        let events = log.borrow();
        assert_eq!(events.first().map(String::as_str), Some("activated 1"));
        assert_eq!(events.last().map(String::as_str), Some("completed"));
        assert_eq!(events.len(), 9);
    }

    #[test]
    fn time_updates_while_spotlighted_are_ignored() {
        let (c, handle) = setup();
        c.borrow_mut().start().unwrap();
        handle.run(FRAME, 60.0);
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 1 });

        // Late host events past several pause points.
        handle.deliver_time(9.0);
        handle.deliver_time(19.0);
        let ctl = c.borrow();
        assert_eq!(ctl.phase(), Phase::AwaitingInput { step: 1 });
        assert_eq!(ctl.state().current_step, 1);
        assert_eq!(ctl.state().video_time, 19.0);
    }

    #[test]
    fn idle_and_completed_ignore_time_updates() {
        let (c, handle) = setup();
        handle.deliver_time(5.0);
        assert_eq!(c.borrow().phase(), Phase::Idle);
        assert_eq!(c.borrow().state().current_step, 0);
    }

    #[test]
    fn jump_past_several_pauses_activates_the_earliest() {
        let (c, handle) = setup();
        c.borrow_mut().start().unwrap();
        handle.advance(14.0);
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 1 });
        answer(&c, "income", "500");
        handle.advance(FRAME);
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 2 });
    }

    #[test]
    fn invalid_input_changes_nothing() {
        let (c, handle) = setup();
        c.borrow_mut().start().unwrap();
        handle.run(FRAME, 60.0);
        handle.take_commands();

        let mut ctl = c.borrow_mut();
        let before = ctl.state().clone();
        for raw in ["", "0", "-5", "abc"] {
            ctl.set_draft("income", raw).unwrap();
            assert_eq!(
                ctl.confirm(),
                Err(GateError::InvalidNumber {
                    field_id: "income".into()
                }),
                "draft {raw:?}"
            );
            assert!(!ctl.view().confirm_visible);
        }
        assert_eq!(ctl.state(), &before);
        assert_eq!(ctl.phase(), Phase::AwaitingInput { step: 1 });
        assert!(ctl.view().message.is_some());
        drop(ctl);
        assert!(handle.commands().is_empty(), "no play on invalid confirm");
    }

    #[test]
    fn only_the_spotlighted_field_accepts_input() {
        let (c, handle) = setup();
        c.borrow_mut().start().unwrap();
        handle.run(FRAME, 60.0);
        answer(&c, "income", "500");
        handle.run(FRAME, 60.0);

        let mut ctl = c.borrow_mut();
        assert_eq!(ctl.phase(), Phase::AwaitingInput { step: 2 });
        assert!(matches!(
            ctl.set_draft("income", "700"),
            Err(GateError::Locked { .. })
        ));
        assert!(matches!(
            ctl.set_draft("savings", "5"),
            Err(GateError::Locked { .. })
        ));
        assert_eq!(
            ctl.state().value("income"),
            Some(&FieldValue::Number(500.0))
        );
        assert_eq!(ctl.view().fields[0].status, FieldStatus::Completed);
    }

    #[test]
    fn transitions_are_persisted() {
        let (c, handle) = setup();
        assert!(stored(&c).is_none());
        c.borrow_mut().start().unwrap();
        assert!(stored(&c).unwrap().is_started);

        handle.run(FRAME, 60.0);
        let snap = stored(&c).unwrap();
        assert_eq!(snap.current_step, 1);
        assert_eq!(snap.inputs["income"], None);

        answer(&c, "income", "500");
        let snap = stored(&c).unwrap();
        assert_eq!(snap.inputs["income"], Some(FieldValue::Number(500.0)));
    }

    #[test]
    fn restore_resumes_at_last_pause_point() {
        let (c, handle) = setup();
        c.borrow_mut().start().unwrap();
        handle.run(FRAME, 60.0);
        answer(&c, "income", "500");
        handle.run(FRAME, 60.0);
        answer(&c, "rent", "10");
        let raw = {
            let ctl = c.borrow();
            ctl.store()
                .load(&ctl.worksheet().storage_key())
                .unwrap()
                .unwrap()
        };

        let mut store = MemoryStore::new();
        store.insert("spotlight:budget", raw);
        let (c, handle) = setup_with(budget(), store);
        c.borrow_mut().restore();
        assert_eq!(c.borrow().phase(), Phase::Resuming { step: 2 });
        assert_eq!(
            handle.take_commands(),
            [PlaybackCommand::Pause, PlaybackCommand::Seek(8.0)]
        );
        assert!(c.borrow().view().resume_visible);

        c.borrow_mut().resume().unwrap();
        assert_eq!(handle.run(FRAME, 60.0), 13.0, "step 2 does not fire again");
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 3 });
    }

    #[test]
    fn restore_respotlights_an_unconfirmed_step() {
        let mut store = MemoryStore::new();
        store.insert(
            "spotlight:budget",
            r#"{"currentStep":2,"inputs":{"income":500,"rent":null},"videoTime":8.2,"isStarted":true}"#,
        );
        let (c, handle) = setup_with(budget(), store);
        c.borrow_mut().restore();
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 2 });
        assert_eq!(handle.time(), 8.0);
        answer(&c, "rent", "10");
        assert!(handle.is_playing());
    }

    #[test]
    fn restore_completed_session_shows_results() {
        let mut store = MemoryStore::new();
        store.insert(
            "spotlight:budget",
            r#"{"currentStep":4,"inputs":{"income":500,"rent":10,"savings":5,"reserve":3},"isStarted":true}"#,
        );
        let (c, _handle) = setup_with(budget(), store);
        c.borrow_mut().restore();
        let ctl = c.borrow();
        assert_eq!(ctl.phase(), Phase::Completed);
        assert_eq!(ctl.results().unwrap().value("totalBudget"), Some(3919.0));
    }

    #[test]
    fn malformed_snapshot_starts_fresh() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut store = MemoryStore::new();
        store.insert("spotlight:budget", r#"{"currentStep":99,"isStarted":true}"#);
        let sheet = budget();
        let (playback, _handle) = ScriptedPlayback::new(sheet.duration);
        let mut ctl = Controller::new(sheet, Box::new(playback), Box::new(store))
            .with_trace(Box::new(Log(Rc::clone(&log))));
        ctl.restore();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(*log.borrow(), ["discarded"]);
        assert!(ctl.store().load("spotlight:budget").unwrap().is_none());
    }

    #[test]
    fn reset_returns_to_start() {
        let (c, handle) = setup();
        c.borrow_mut().start().unwrap();
        handle.run(FRAME, 60.0);
        answer(&c, "income", "500");
        handle.take_commands();

        c.borrow_mut().reset();
        let ctl = c.borrow();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(!ctl.state().started);
        assert!(ctl.state().inputs.values().all(Option::is_none));
        assert!(stored(&c).is_none());
        assert_eq!(
            handle.commands(),
            [PlaybackCommand::Pause, PlaybackCommand::Seek(0.0)]
        );
        assert!(ctl.view().start_screen.is_some());
    }

    #[test]
    fn wrong_phase_actions_are_refused() {
        let (c, _handle) = setup();
        let mut ctl = c.borrow_mut();
        assert!(matches!(ctl.confirm(), Err(GateError::WrongPhase { .. })));
        assert!(matches!(ctl.resume(), Err(GateError::WrongPhase { .. })));
        ctl.start().unwrap();
        assert!(matches!(ctl.start(), Err(GateError::WrongPhase { .. })));
    }

    #[test]
    fn write_failures_do_not_stop_the_session() {
        let (c, handle) = setup_with(budget(), MemoryStore::read_only());
        c.borrow_mut().start().unwrap();
        handle.run(FRAME, 60.0);
        answer(&c, "income", "500");
        assert_eq!(c.borrow().phase(), Phase::Resuming { step: 1 });
    }

    #[test]
    fn last_pause_at_the_end_completes_on_confirm() {
        let course = Course::from_json(
            r#"{
                "slug": "short",
                "status": "published",
                "fields": [{"id": "age", "label": "Age", "order": 1}],
                "timeline": [{"pauseAt": 5, "fieldId": "age", "prompt": "Age?"}],
                "calculation": {"steps": [{"id": "double", "formula": "age * 2", "isMain": true}]},
                "video": {"downloadUrl": "https://cdn.example.com/v.mp4", "duration": 5}
            }"#,
        )
        .unwrap();
        let (c, handle) = setup_with(course.compile().unwrap(), MemoryStore::new());
        c.borrow_mut().start().unwrap();
        assert_eq!(handle.run(1.0, 60.0), 5.0);
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 1 });

        answer(&c, "age", "21");
        let ctl = c.borrow();
        assert_eq!(ctl.phase(), Phase::Completed);
        assert_eq!(ctl.results().unwrap().value("double"), Some(42.0));
    }

    #[test]
    fn ended_during_the_last_spotlight_completes_on_confirm() {
        let course = Course::from_json(
            r#"{
                "slug": "late",
                "status": "published",
                "fields": [{"id": "age", "label": "Age", "order": 1}],
                "timeline": [{"pauseAt": 4.5, "fieldId": "age", "prompt": "Age?"}],
                "calculation": {"steps": [{"id": "double", "formula": "age * 2", "isMain": true}]},
                "video": {"downloadUrl": "https://cdn.example.com/v.mp4", "duration": 5}
            }"#,
        )
        .unwrap();
        let (c, handle) = setup_with(course.compile().unwrap(), MemoryStore::new());
        c.borrow_mut().start().unwrap();
        assert_eq!(handle.run(0.5, 60.0), 4.5);
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 1 });

        // The host reports the end while the position still reads short of it.
        handle.deliver_ended();
        assert_eq!(c.borrow().phase(), Phase::AwaitingInput { step: 1 });
        handle.take_commands();

        answer(&c, "age", "21");
        assert_eq!(c.borrow().phase(), Phase::Completed);
        assert!(
            !handle.commands().contains(&PlaybackCommand::Play),
            "no replay after the end"
        );
    }

    #[test]
    fn fields_without_a_pause_do_not_block_completion() {
        let course = Course::from_json(
            r#"{
                "slug": "extra",
                "status": "published",
                "fields": [
                    {"id": "age", "label": "Age", "order": 1},
                    {"id": "memo", "label": "Memo", "type": "text", "order": 2}
                ],
                "timeline": [{"pauseAt": 2, "fieldId": "age", "prompt": "Age?"}],
                "calculation": {"steps": [{"id": "double", "formula": "age * 2", "isMain": true}]},
                "video": {"downloadUrl": "https://cdn.example.com/v.mp4", "duration": 5}
            }"#,
        )
        .unwrap();
        let (c, handle) = setup_with(course.compile().unwrap(), MemoryStore::new());
        c.borrow_mut().start().unwrap();
        assert_eq!(handle.run(1.0, 60.0), 2.0);
        answer(&c, "age", "21");
        assert_eq!(handle.run(1.0, 60.0), 5.0);

        let ctl = c.borrow();
        assert_eq!(ctl.phase(), Phase::Completed);
        assert_eq!(ctl.results().unwrap().value("double"), Some(42.0));
    }

    #[test]
    fn render_listener_sees_every_change() {
        let (c, handle) = setup();
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        c.borrow_mut()
            .on_render(move |view: &WorksheetView| sink.borrow_mut().push(view.phase));
        c.borrow_mut().start().unwrap();
        handle.run(FRAME, 60.0);

        let frames = frames.borrow();
        assert_eq!(frames.first(), Some(&Phase::Idle));
        assert_eq!(frames.last(), Some(&Phase::AwaitingInput { step: 1 }));
    }
}
