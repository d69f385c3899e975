// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for spotlight
//! sessions.
//!
//! This crate provides [`TraceSink`](spotlight_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: timestamped in-memory recording, shareable
//!   with the code that drives the session.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from a
//!   recording, with one span per spotlighted step.

pub mod chrome;
pub mod pretty;
pub mod recorder;
