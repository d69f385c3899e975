// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` tick source.
//!
//! [`RafLoop`] calls a closure once per animation frame with the frame's
//! [`DOMHighResTimeStamp`][mdn] in milliseconds. The canvas mock feeds these
//! straight into its [`VirtualClock`](spotlight_core::clock::VirtualClock).
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching (and unwrapping) the Window object on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// A self-rescheduling `requestAnimationFrame` loop.
///
/// Create with [`RafLoop::new`], then call [`start`](Self::start). The loop
/// re-registers itself each frame until [`stop`](Self::stop) is called or
/// the `RafLoop` is dropped.
pub struct RafLoop {
    inner: Rc<RafInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`. Kept apart
    /// from `callback` so the closure can re-register itself while the
    /// callback runs.
    closure: RefCell<Option<RafClosure>>,
    callback: RefCell<Box<dyn FnMut(f64)>>,
    frames: Cell<u64>,
    running: Cell<bool>,
    raf_id: Cell<i32>,
}

impl RafLoop {
    /// Creates a loop that is **not yet running**.
    pub fn new(callback: impl FnMut(f64) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                frames: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. A no-op if already running.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            let weak = Rc::downgrade(&self.inner);
            let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if !inner.running.get() {
                    return;
                }
                inner.frames.set(inner.frames.get() + 1);
                inner.callback.borrow_mut()(timestamp_ms);

                if inner.running.get()
                    && let Some(ref closure) = *inner.closure.borrow()
                {
                    let id = request_animation_frame(closure.as_ref().unchecked_ref());
                    inner.raf_id.set(id);
                }
            }) as Box<dyn FnMut(f64)>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(id);
        }
    }

    /// Stops the loop and cancels the pending frame. Can be restarted.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }

    /// Returns `true` while the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of frames delivered so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        self.inner.closure.borrow_mut().take();
    }
}

impl std::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .field("frames", &self.inner.frames.get())
            .finish_non_exhaustive()
    }
}
