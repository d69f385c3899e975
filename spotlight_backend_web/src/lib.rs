// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for spotlight worksheets.
//!
//! This crate provides integration with browser APIs:
//!
//! - Playback adapters implementing
//!   [`Playback`](spotlight_core::playback::Playback):
//!   [`CanvasPlayback`] (mock video on a `requestAnimationFrame` clock),
//!   [`ElementPlayback`] (`<video>`), and [`EmbeddedPlayback`] (YouTube
//!   iframe API).
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`LocalStore`]: `localStorage` snapshot store
//! - [`DomPresenter`]: renders a
//!   [`WorksheetView`](spotlight_core::view::WorksheetView) to the DOM
//! - [`messaging`]: LIFF `sendMessages`
//! - [`fetch`]: abortable course loading
//! - [`ConsoleSink`] / [`ConsoleWriter`]: console output
//! - [`app::mount`]: wires all of the above into a page

pub mod app;
mod canvas;
mod console;
mod events;
pub mod fetch;
pub mod messaging;
mod presenter;
mod raf;
mod storage;
mod video;
mod youtube;

pub use canvas::CanvasPlayback;
pub use console::{ConsoleSink, ConsoleWriter};
pub use presenter::{DomPresenter, FIELD_ATTR};
pub use raf::RafLoop;
pub use storage::LocalStore;
pub use video::ElementPlayback;
pub use youtube::{EmbeddedPlayback, POLL_INTERVAL_MS, PendingCommands};

use wasm_bindgen::{JsCast as _, JsValue};

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    if let Some(err) = err.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
