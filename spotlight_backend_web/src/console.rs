// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser console output.
//!
//! [`ConsoleSink`] prints controller lifecycle events. [`ConsoleWriter`] is
//! an [`io::Write`](std::io::Write) that forwards whole lines to
//! `console.log`, suitable as a log formatter's destination.

use std::io;

use wasm_bindgen::JsValue;
use web_sys::console;

use spotlight_core::trace::{
    CompletedEvent, FormulaFailedEvent, InputRejectedEvent, ResetEvent, RestoredEvent,
    SnapshotDiscardedEvent, StartedEvent, StepActivatedEvent, StepConfirmedEvent, TraceSink,
};
use spotlight_core::view::format_number;

/// A [`TraceSink`] that writes to the browser console.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Creates a sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn log(line: &str) {
    console::debug_1(&JsValue::from_str(line));
}

impl TraceSink for ConsoleSink {
    fn on_started(&mut self, e: &StartedEvent) {
        log(&format!("[spotlight] started at {:.2}s", e.video_time));
    }

    fn on_step_activated(&mut self, e: &StepActivatedEvent<'_>) {
        log(&format!(
            "[spotlight] step {} ({}) at {:.2}s",
            e.step_index, e.field_id, e.video_time
        ));
    }

    fn on_step_confirmed(&mut self, e: &StepConfirmedEvent<'_>) {
        log(&format!(
            "[spotlight] step {} confirmed: {} = {}",
            e.step_index, e.field_id, e.value
        ));
    }

    fn on_input_rejected(&mut self, e: &InputRejectedEvent<'_>) {
        log(&format!("[spotlight] {} rejected: {}", e.field_id, e.reason));
    }

    fn on_completed(&mut self, e: &CompletedEvent<'_>) {
        let results: Vec<String> = e
            .results
            .steps()
            .iter()
            .map(|s| format!("{}={}", s.id, format_number(s.value)))
            .collect();
        log(&format!("[spotlight] completed: {}", results.join(", ")));
    }

    fn on_formula_failed(&mut self, e: &FormulaFailedEvent<'_>) {
        console::warn_1(&JsValue::from_str(&format!(
            "[spotlight] formula {} failed ({}): {}",
            e.step_id, e.error, e.formula
        )));
    }

    fn on_restored(&mut self, e: &RestoredEvent) {
        log(&format!(
            "[spotlight] restored {} at {:.2}s",
            e.phase, e.seek_to
        ));
    }

    fn on_snapshot_discarded(&mut self, e: &SnapshotDiscardedEvent<'_>) {
        console::warn_1(&JsValue::from_str(&format!(
            "[spotlight] stored session discarded: {}",
            e.reason
        )));
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        log(&format!("[spotlight] reset from step {}", e.from_step));
    }
}

/// Line-buffered writer to `console.log`.
#[derive(Debug, Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl ConsoleWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end();
        if !line.is_empty() {
            console::log_1(&JsValue::from_str(line));
        }
        self.buf.clear();
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        for chunk in data.split_inclusive(|b| *b == b'\n') {
            self.buf.extend_from_slice(chunk);
            if chunk.ends_with(b"\n") {
                self.emit();
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.emit();
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.emit();
        }
    }
}
