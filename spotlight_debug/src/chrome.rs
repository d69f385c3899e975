// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][trace-format] JSON to the given writer.
//!
//! Each step becomes a duration span on thread 1, opened when its pause point
//! fires and closed when the input is confirmed. Everything else is an
//! instant event on thread 0.
//!
//! [trace-format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};
use std::time::Duration;

use serde_json::{Value, json};

use crate::recorder::{EventKind, RecordedEvent};

const SESSION_TID: u32 = 0;
const STEP_TID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::new();
    let mut open_step: Option<u32> = None;

    for recorded in events {
        let ts = micros(recorded.at);
        match &recorded.kind {
            EventKind::StepActivated {
                step_index,
                field_id,
                pause_at,
                video_time,
            } => {
                if let Some(step) = open_step.take() {
                    out.push(span_end(step, ts, None));
                }
                open_step = Some(*step_index);
                out.push(json!({
                    "ph": "B",
                    "name": step_name(*step_index),
                    "cat": "Step",
                    "ts": ts,
                    "pid": 0,
                    "tid": STEP_TID,
                    "args": {
                        "field_id": field_id,
                        "pause_at": pause_at,
                        "video_time": video_time,
                    }
                }));
            }
            EventKind::StepConfirmed {
                step_index,
                field_id,
                value,
                video_time,
            } => {
                if open_step == Some(*step_index) {
                    open_step = None;
                    out.push(span_end(
                        *step_index,
                        ts,
                        Some(json!({
                            "field_id": field_id,
                            "value": value,
                            "video_time": video_time,
                        })),
                    ));
                } else {
                    out.push(instant(
                        &recorded.kind,
                        ts,
                        json!({
                            "step_index": step_index,
                            "field_id": field_id,
                            "value": value,
                            "video_time": video_time,
                        }),
                    ));
                }
            }
            EventKind::Reset { from_step } => {
                if let Some(step) = open_step.take() {
                    out.push(span_end(step, ts, None));
                }
                out.push(instant(
                    &recorded.kind,
                    ts,
                    json!({ "from_step": from_step }),
                ));
            }
            EventKind::Started { video_time } => {
                out.push(instant(
                    &recorded.kind,
                    ts,
                    json!({ "video_time": video_time }),
                ));
            }
            EventKind::InputRejected {
                field_id,
                raw,
                reason,
            } => {
                out.push(instant(
                    &recorded.kind,
                    ts,
                    json!({ "field_id": field_id, "raw": raw, "reason": reason }),
                ));
            }
            EventKind::Completed {
                video_time,
                results,
            } => {
                let results: serde_json::Map<String, Value> = results
                    .iter()
                    .map(|(id, value)| (id.clone(), json!(value)))
                    .collect();
                out.push(instant(
                    &recorded.kind,
                    ts,
                    json!({ "video_time": video_time, "results": results }),
                ));
            }
            EventKind::FormulaFailed {
                step_id,
                formula,
                error,
            } => {
                out.push(instant(
                    &recorded.kind,
                    ts,
                    json!({ "step_id": step_id, "formula": formula, "error": error }),
                ));
            }
            EventKind::Restored {
                current_step,
                phase,
                seek_to,
            } => {
                out.push(instant(
                    &recorded.kind,
                    ts,
                    json!({
                        "current_step": current_step,
                        "phase": phase,
                        "video_time": seek_to,
                    }),
                ));
            }
            EventKind::SnapshotDiscarded { reason } => {
                out.push(instant(&recorded.kind, ts, json!({ "reason": reason })));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

fn instant(kind: &EventKind, ts: f64, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": kind.name(),
        "cat": "Session",
        "ts": ts,
        "pid": 0,
        "tid": SESSION_TID,
        "s": "t",
        "args": args,
    })
}

fn span_end(step: u32, ts: f64, args: Option<Value>) -> Value {
    json!({
        "ph": "E",
        "name": step_name(step),
        "cat": "Step",
        "ts": ts,
        "pid": 0,
        "tid": STEP_TID,
        "args": args.unwrap_or_else(|| json!({})),
    })
}

fn step_name(step: u32) -> String {
    format!("Step {step}")
}

fn micros(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use spotlight_core::field::FieldValue;
    use spotlight_core::trace::{
        ResetEvent, StartedEvent, StepActivatedEvent, StepConfirmedEvent, TraceSink,
    };

    fn millis_clock() -> impl Fn() -> Duration {
        let n = std::cell::Cell::new(0_u64);
        move || {
            let t = n.get();
            n.set(t + 1);
            Duration::from_millis(t)
        }
    }

    fn parse(events: &[RecordedEvent]) -> Vec<Value> {
        let mut out = Vec::new();
        export(events, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn steps_become_spans() {
        let mut rec = RecorderSink::with_clock(millis_clock());
        rec.on_started(&StartedEvent { video_time: 0.0 });
        rec.on_step_activated(&StepActivatedEvent {
            step_index: 1,
            field_id: "income",
            pause_at: 3.0,
            video_time: 3.0,
        });
        rec.on_step_confirmed(&StepConfirmedEvent {
            step_index: 1,
            field_id: "income",
            value: &FieldValue::Number(500.0),
            video_time: 3.0,
        });

        let parsed = parse(&rec.events());
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Started");
        assert_eq!(parsed[0]["tid"], 0);

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "Step 1");
        assert_eq!(parsed[1]["tid"], 1);
        assert_eq!(parsed[1]["ts"], 1000.0);
        assert_eq!(parsed[1]["args"]["video_time"], 3.0);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["name"], "Step 1");
        assert_eq!(parsed[2]["args"]["value"], "500");
    }

    #[test]
    fn reset_closes_an_open_span() {
        let mut rec = RecorderSink::with_clock(millis_clock());
        rec.on_step_activated(&StepActivatedEvent {
            step_index: 2,
            field_id: "rent",
            pause_at: 8.0,
            video_time: 8.1,
        });
        rec.on_reset(&ResetEvent { from_step: 2 });

        let parsed = parse(&rec.events());
        let phases: Vec<&str> = parsed.iter().map(|e| e["ph"].as_str().unwrap()).collect();
        assert_eq!(phases, ["B", "E", "i"]);
        assert_eq!(parsed[2]["name"], "Reset");
    }

    #[test]
    fn export_empty_recording() {
        assert!(parse(&[]).is_empty());
    }
}
