// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timeline-driven worksheet controller.
//!
//! `spotlight_core` owns everything about a video-synced worksheet that does
//! not need a browser: the course document model, the timeline of pause
//! points, the form-unlock state machine, the formula engine, and the
//! snapshot persistence format. Rendering is a pure projection of controller
//! state, so the whole flow runs (and is tested) without any UI at all.
//!
//! # Architecture
//!
//! ```text
//!   Course (JSON / preset) ──► Course::compile() ──► Worksheet
//!                                                       │
//!   Playback (element / embedded / mock)                │
//!       │ on_time_update(t)                             ▼
//!       └──────────────► Controller ──► Timeline::next_pause()
//!                           │   │
//!           confirm/reset ──┘   ├──► Store (Snapshot JSON)
//!                               ├──► TraceSink (lifecycle events)
//!                               └──► WorksheetView ──► presenter
//!                                          │
//!                 ended ──► formula::evaluate_steps() ──► Results
//! ```
//!
//! **[`course`]**: Serde model of the course document, access gating, and
//! compilation into a validated [`Worksheet`](worksheet::Worksheet).
//!
//! **[`timeline`]**: Ordered pause points and the pure
//! [`next_pause`](timeline::next_pause) evaluator.
//!
//! **[`controller`]**: The form-unlock state machine. All mutation of
//! [`AppState`](state::AppState) goes through its transition methods.
//!
//! **[`formula`]**: Whitelisted recursive-descent expression evaluator with a
//! small builtin set. Bad formulas evaluate to `0` and are logged.
//!
//! **[`persist`]**: Snapshot format and the [`Store`](persist::Store) trait.
//!
//! **[`playback`]**: The [`Playback`](playback::Playback) contract shared by
//! every video backend, plus [`TimeFeed`](playback::TimeFeed) filtering.
//!
//! **[`clock`]**: [`VirtualClock`](clock::VirtualClock) for the canvas mock.
//!
//! **[`layout`]**: Geometry and text of a mock video frame.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait for lifecycle
//! instrumentation.
//!
//! **[`scripted`]**: A host-driven [`Playback`](playback::Playback) used by
//! tests and the native demo.

pub mod clock;
pub mod controller;
pub mod course;
pub mod field;
pub mod formula;
pub mod launch;
pub mod layout;
pub mod message;
pub mod persist;
pub mod playback;
pub mod preset;
pub mod scripted;
pub mod state;
pub mod timeline;
pub mod trace;
pub mod view;
pub mod worksheet;
