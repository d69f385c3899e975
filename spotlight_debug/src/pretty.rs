// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Playback
//! positions are printed in seconds.

use std::io::Write;

use spotlight_core::trace::{
    CompletedEvent, FormulaFailedEvent, InputRejectedEvent, ResetEvent, RestoredEvent,
    SnapshotDiscardedEvent, StartedEvent, StepActivatedEvent, StepConfirmedEvent, TraceSink,
};
use spotlight_core::view::format_number;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_started(&mut self, e: &StartedEvent) {
        let _ = writeln!(self.writer, "[start] at {:.2}s", e.video_time);
    }

    fn on_step_activated(&mut self, e: &StepActivatedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[step:activate] step={} field={} pause_at={:.2}s at {:.2}s",
            e.step_index, e.field_id, e.pause_at, e.video_time,
        );
    }

    fn on_step_confirmed(&mut self, e: &StepConfirmedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[step:confirm] step={} field={} value={} at {:.2}s",
            e.step_index, e.field_id, e.value, e.video_time,
        );
    }

    fn on_input_rejected(&mut self, e: &InputRejectedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[input:reject] field={} raw={:?} reason={}",
            e.field_id, e.raw, e.reason,
        );
    }

    fn on_completed(&mut self, e: &CompletedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[complete] at {:.2}s results={}",
            e.video_time,
            e.results.steps().len(),
        );
        for step in e.results.steps() {
            let marker = if step.is_main { " (main)" } else { "" };
            let _ = writeln!(
                self.writer,
                "  {} = {}{}{marker}",
                step.id,
                format_number(step.value),
                step.unit,
            );
        }
    }

    fn on_formula_failed(&mut self, e: &FormulaFailedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[formula:fail] step={} formula={:?} error={}",
            e.step_id, e.formula, e.error,
        );
    }

    fn on_restored(&mut self, e: &RestoredEvent) {
        let _ = writeln!(
            self.writer,
            "[restore] step={} phase={} seek={:.2}s",
            e.current_step, e.phase, e.seek_to,
        );
    }

    fn on_snapshot_discarded(&mut self, e: &SnapshotDiscardedEvent<'_>) {
        let _ = writeln!(self.writer, "[restore:discard] {}", e.reason);
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        let _ = writeln!(self.writer, "[reset] from step={}", e.from_step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotlight_core::field::FieldValue;
    use spotlight_core::state::Phase;

    fn output(f: impl FnOnce(&mut PrettyPrintSink<Vec<u8>>)) -> String {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn one_line_per_event() {
        let text = output(|sink| {
            sink.on_started(&StartedEvent { video_time: 0.0 });
            sink.on_step_activated(&StepActivatedEvent {
                step_index: 1,
                field_id: "income",
                pause_at: 3.0,
                video_time: 3.1,
            });
            sink.on_step_confirmed(&StepConfirmedEvent {
                step_index: 1,
                field_id: "income",
                value: &FieldValue::Number(500.0),
                video_time: 3.1,
            });
            sink.on_restored(&RestoredEvent {
                current_step: 2,
                phase: Phase::AwaitingInput { step: 2 },
                seek_to: 8.0,
            });
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "[start] at 0.00s",
                "[step:activate] step=1 field=income pause_at=3.00s at 3.10s",
                "[step:confirm] step=1 field=income value=500 at 3.10s",
                "[restore] step=2 phase=awaiting_input(2) seek=8.00s",
            ]
        );
    }

    #[test]
    fn rejection_quotes_raw_input() {
        let text = output(|sink| {
            sink.on_input_rejected(&InputRejectedEvent {
                field_id: "rent",
                raw: "abc",
                reason: "not a number",
            });
        });
        assert_eq!(
            text,
            "[input:reject] field=rent raw=\"abc\" reason=not a number\n"
        );
    }
}
