// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A host-driven [`Playback`] for tests and native runs.
//!
//! [`ScriptedPlayback::new`] returns the backend (handed to the controller)
//! and a [`ScriptedHandle`] that plays the role of the host event loop:
//! advancing virtual time, delivering callbacks, and recording every command
//! the controller issued.
//!
//! ```
//! use spotlight_core::playback::Playback;
//! use spotlight_core::scripted::{PlaybackCommand, ScriptedPlayback};
//!
//! let (mut playback, handle) = ScriptedPlayback::new(10.0);
//! playback.play();
//! handle.advance(2.5);
//! assert_eq!(handle.time(), 2.5);
//! assert_eq!(handle.commands(), [PlaybackCommand::Play]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::clock::VirtualClock;
use crate::playback::Playback;

/// A command the controller sent to the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackCommand {
    /// `play()`.
    Play,
    /// `pause()`.
    Pause,
    /// `seek_to(t)`.
    Seek(f64),
}

type TimeCallback = Box<dyn FnMut(f64)>;
type EndedCallback = Box<dyn FnMut()>;

struct State {
    clock: VirtualClock,
    commands: Vec<PlaybackCommand>,
    on_time_update: Option<TimeCallback>,
    on_ended: Option<EndedCallback>,
}

/// The backend half. Owned by the controller.
pub struct ScriptedPlayback {
    state: Rc<RefCell<State>>,
}

/// The host half. Drives time and inspects commands.
#[derive(Clone)]
pub struct ScriptedHandle {
    state: Rc<RefCell<State>>,
}

impl ScriptedPlayback {
    /// Creates a paused backend of `duration` seconds and its handle.
    #[must_use]
    pub fn new(duration: f64) -> (Self, ScriptedHandle) {
        let state = Rc::new(RefCell::new(State {
            clock: VirtualClock::new(duration),
            commands: Vec::new(),
            on_time_update: None,
            on_ended: None,
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            ScriptedHandle { state },
        )
    }
}

impl Playback for ScriptedPlayback {
    fn current_time(&self) -> f64 {
        self.state.borrow().clock.time()
    }

    fn duration(&self) -> f64 {
        self.state.borrow().clock.duration()
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().clock.is_playing()
    }

    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.commands.push(PlaybackCommand::Play);
        state.clock.play();
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        state.commands.push(PlaybackCommand::Pause);
        state.clock.pause();
    }

    fn seek_to(&mut self, time: f64) {
        let mut state = self.state.borrow_mut();
        state.commands.push(PlaybackCommand::Seek(time));
        state.clock.seek(time);
    }

    fn on_time_update(&mut self, callback: Box<dyn FnMut(f64)>) {
        self.state.borrow_mut().on_time_update = Some(callback);
    }

    fn on_ended(&mut self, callback: Box<dyn FnMut()>) {
        self.state.borrow_mut().on_ended = Some(callback);
    }
}

impl core::fmt::Debug for ScriptedPlayback {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ScriptedPlayback")
            .field("time", &state.clock.time())
            .field("playing", &state.clock.is_playing())
            .finish_non_exhaustive()
    }
}

impl ScriptedHandle {
    /// Current virtual time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.state.borrow().clock.time()
    }

    /// Whether the backend is playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.borrow().clock.is_playing()
    }

    /// Every command so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> Vec<PlaybackCommand> {
        self.state.borrow().commands.clone()
    }

    /// Returns and clears the command log.
    pub fn take_commands(&self) -> Vec<PlaybackCommand> {
        core::mem::take(&mut self.state.borrow_mut().commands)
    }

    /// One host frame of `dt` seconds: advances a playing clock and delivers
    /// the time update (and `ended`, once) to the registered callbacks.
    ///
    /// Returns `false` without firing anything while paused.
    pub fn advance(&self, dt: f64) -> bool {
        let tick = {
            let mut state = self.state.borrow_mut();
            if !state.clock.is_playing() {
                return false;
            }
            state.clock.advance(dt)
        };
        self.deliver_time(tick.time);
        if tick.ended {
            self.deliver_ended();
        }
        true
    }

    /// Advances in `step`-second frames until playback stops or `limit`
    /// seconds of frames have run. Returns the final time.
    pub fn run(&self, step: f64, limit: f64) -> f64 {
        let mut spent = 0.0;
        while spent < limit && self.advance(step) {
            spent += step;
        }
        self.time()
    }

    /// Delivers a time update of `time` whether or not playback is running,
    /// as a late or stray host event would.
    pub fn deliver_time(&self, time: f64) {
        let callback = self.state.borrow_mut().on_time_update.take();
        if let Some(mut callback) = callback {
            callback(time);
            let mut state = self.state.borrow_mut();
            if state.on_time_update.is_none() {
                state.on_time_update = Some(callback);
            }
        }
    }

    /// Delivers an `ended` event.
    pub fn deliver_ended(&self) {
        let callback = self.state.borrow_mut().on_ended.take();
        if let Some(mut callback) = callback {
            callback();
            let mut state = self.state.borrow_mut();
            if state.on_ended.is_none() {
                state.on_ended = Some(callback);
            }
        }
    }
}

impl core::fmt::Debug for ScriptedHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScriptedHandle")
            .field("time", &self.time())
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn callbacks_may_call_back_into_the_backend() {
        let (playback, handle) = ScriptedPlayback::new(10.0);
        let playback = Rc::new(RefCell::new(playback));

        let inner = Rc::clone(&playback);
        playback
            .borrow_mut()
            .on_time_update(Box::new(move |t| {
                if t >= 3.0 {
                    inner.borrow_mut().pause();
                }
            }));
        playback.borrow_mut().play();

        let end = handle.run(0.5, 60.0);
        assert_eq!(end, 3.0);
        assert!(!handle.is_playing());
        assert_eq!(
            handle.commands(),
            [PlaybackCommand::Play, PlaybackCommand::Pause]
        );
    }

    #[test]
    fn ended_is_delivered_once() {
        let (mut playback, handle) = ScriptedPlayback::new(2.0);
        let ended = Rc::new(Cell::new(0));
        let count = Rc::clone(&ended);
        playback.on_ended(Box::new(move || count.set(count.get() + 1)));
        playback.play();
        handle.run(0.5, 10.0);
        assert_eq!(ended.get(), 1);
        assert!(!handle.advance(0.5), "stopped at the end");

        playback.seek_to(1.0);
        playback.play();
        handle.run(0.5, 10.0);
        assert_eq!(ended.get(), 2, "seek re-arms ended");
    }

    #[test]
    fn paused_backend_delivers_nothing() {
        let (mut playback, handle) = ScriptedPlayback::new(2.0);
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        playback.on_time_update(Box::new(move |_| flag.set(true)));
        assert!(!handle.advance(1.0));
        assert!(!seen.get());
        assert!(handle.take_commands().is_empty());
    }
}
