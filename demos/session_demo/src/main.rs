// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted worksheet session that exercises the controller end to end.
//!
//! Plays the built-in budget course on a virtual clock, answering each
//! spotlighted field (with one rejected attempt and one edit to a locked
//! field along the way). Events go to both a
//! [`PrettyPrintSink`](spotlight_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](spotlight_debug::recorder::RecorderSink); the recording
//! is exported as a Chrome trace JSON file. The stored snapshot is then
//! restored into a second controller to show the session survives a reload.
//!
//! Usage: `session_demo [trace.json]`. Log verbosity follows `RUST_LOG`.

use std::cell::RefCell;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;

use spotlight_core::controller::Controller;
use spotlight_core::persist::{MemoryStore, Store};
use spotlight_core::preset;
use spotlight_core::scripted::{ScriptedHandle, ScriptedPlayback};
use spotlight_core::state::Phase;
use spotlight_debug::chrome;
use spotlight_debug::pretty::PrettyPrintSink;
use spotlight_debug::recorder::RecorderSink;

/// Host frame length in seconds (~60 Hz).
const FRAME: f64 = 1.0 / 60.0;
/// Upper bound on simulated frames.
const MAX_FRAMES: u32 = 10_000;

const ANSWERS: [(&str, &str); 4] = [
    ("income", "500"),
    ("rent", "10"),
    ("savings", "5"),
    ("reserve", "3"),
];

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let out_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "spotlight-trace.json".into());

    // -- session -------------------------------------------------------------
    let sheet = preset::budget_course().compile()?;
    let (playback, handle) = ScriptedPlayback::new(sheet.duration);
    let recorder = RecorderSink::new();
    let sink = (PrettyPrintSink::new(Box::new(std::io::stdout())), recorder.clone());
    let controller = Controller::new(sheet, Box::new(playback), Box::new(MemoryStore::new()))
        .with_trace(Box::new(sink))
        .attach();

    controller.borrow_mut().start()?;
    drive(&controller, &handle)?;

    let snapshot = {
        let c = controller.borrow();
        if let Some(summary) = c.summary() {
            println!("\n{summary}\n");
        }
        Store::load(c.store(), &c.worksheet().storage_key())?
    };

    // -- export --------------------------------------------------------------
    let file = File::create(&out_path)?;
    let mut writer = BufWriter::new(file);
    chrome::export(&recorder.events(), &mut writer)?;
    tracing::info!(path = %out_path, events = recorder.len(), "wrote Chrome trace");

    // -- reload --------------------------------------------------------------
    let sheet = preset::budget_course().compile()?;
    let mut store = MemoryStore::new();
    if let Some(snapshot) = snapshot {
        store.insert(sheet.storage_key(), snapshot);
    }
    let (playback, _handle) = ScriptedPlayback::new(sheet.duration);
    let mut reloaded = Controller::new(sheet, Box::new(playback), Box::new(store))
        .with_trace(Box::new(PrettyPrintSink::stderr()));
    reloaded.restore();
    tracing::info!(phase = %reloaded.phase(), "reloaded session");

    Ok(())
}

/// Runs frames until the worksheet completes, answering each spotlight.
fn drive(controller: &Rc<RefCell<Controller>>, handle: &ScriptedHandle) -> Result<(), Box<dyn Error>> {
    for _ in 0..MAX_FRAMES {
        let phase = controller.borrow().phase();
        match phase {
            Phase::Completed => return Ok(()),
            Phase::AwaitingInput { step } => answer(&mut controller.borrow_mut(), step)?,
            Phase::Idle | Phase::Resuming { .. } => {
                if !handle.advance(FRAME) {
                    return Err(format!("playback stalled in {phase}").into());
                }
            }
        }
    }
    Err("worksheet did not complete".into())
}

fn answer(controller: &mut Controller, step: u32) -> Result<(), Box<dyn Error>> {
    let field_id = controller
        .worksheet()
        .timeline
        .entry(step)
        .map(|e| e.field_id.clone())
        .ok_or("spotlighted step has no timeline entry")?;
    let value = ANSWERS
        .iter()
        .find(|(id, _)| *id == field_id)
        .map(|(_, v)| *v)
        .ok_or("no scripted answer")?;

    if step == 2 {
        // Confirmed fields stay locked.
        if let Err(err) = controller.set_draft("income", "900") {
            tracing::info!(%err, "edit refused");
        }
        // Invalid input is refused without changing state.
        controller.set_draft(&field_id, "ten")?;
        if let Err(err) = controller.confirm() {
            tracing::info!(%err, "confirm refused");
        }
    }

    controller.set_draft(&field_id, value)?;
    controller.confirm()?;
    Ok(())
}
