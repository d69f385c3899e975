// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Media element playback.
//!
//! Wraps a `<video>` element playing an uploaded file. Native `timeupdate`
//! and `ended` events pass through a [`TimeFeed`] before reaching the
//! controller.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlMediaElement;

use spotlight_core::playback::{Playback, TimeFeed};

use crate::describe;
use crate::events::{CallbackSlot, Listener};

/// [`Playback`] over an `HTMLMediaElement`.
pub struct ElementPlayback {
    inner: Rc<ElementInner>,
    _listeners: [Listener; 2],
}

struct ElementInner {
    element: HtmlMediaElement,
    feed: RefCell<TimeFeed>,
    on_time_update: CallbackSlot<dyn FnMut(f64)>,
    on_ended: CallbackSlot<dyn FnMut()>,
}

impl ElementPlayback {
    /// Points `element` at `url` and subscribes to its events.
    pub fn new(element: HtmlMediaElement, url: &str) -> Result<Self, JsValue> {
        element.set_src(url);
        element.set_preload("auto");
        element.set_attribute("playsinline", "")?;

        let inner = Rc::new(ElementInner {
            element,
            feed: RefCell::new(TimeFeed::new()),
            on_time_update: CallbackSlot::new(),
            on_ended: CallbackSlot::new(),
        });

        let on_time = Rc::downgrade(&inner);
        let time_update = Listener::new(&inner.element, "timeupdate", move |_| {
            let Some(inner) = on_time.upgrade() else {
                return;
            };
            let time = inner.feed.borrow_mut().time_update(inner.element.current_time());
            if let Some(time) = time {
                inner.on_time_update.call_with(|cb| cb(time));
            }
        })?;

        let on_end = Rc::downgrade(&inner);
        let ended = Listener::new(&inner.element, "ended", move |_| {
            let Some(inner) = on_end.upgrade() else {
                return;
            };
            let first = inner.feed.borrow_mut().ended();
            if first {
                inner.on_ended.call_with(|cb| cb());
            }
        })?;

        Ok(Self {
            inner,
            _listeners: [time_update, ended],
        })
    }
}

impl Playback for ElementPlayback {
    fn current_time(&self) -> f64 {
        self.inner.element.current_time()
    }

    fn duration(&self) -> f64 {
        let duration = self.inner.element.duration();
        if duration.is_finite() { duration } else { 0.0 }
    }

    fn is_playing(&self) -> bool {
        !self.inner.element.paused()
    }

    fn play(&mut self) {
        match self.inner.element.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    tracing::warn!(error = %describe(&err), "media playback refused");
                }
            }),
            Err(err) => tracing::warn!(error = %describe(&err), "media playback failed"),
        }
    }

    fn pause(&mut self) {
        if let Err(err) = self.inner.element.pause() {
            tracing::warn!(error = %describe(&err), "media pause failed");
        }
    }

    fn seek_to(&mut self, time: f64) {
        let duration = self.duration();
        self.inner.element.set_current_time(time);
        self.inner.feed.borrow_mut().seek(time, duration);
    }

    fn on_time_update(&mut self, callback: Box<dyn FnMut(f64)>) {
        self.inner.on_time_update.set(callback);
    }

    fn on_ended(&mut self, callback: Box<dyn FnMut()>) {
        self.inner.on_ended.set(callback);
    }
}

impl std::fmt::Debug for ElementPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementPlayback")
            .field("src", &self.inner.element.src())
            .field("time", &self.inner.element.current_time())
            .finish_non_exhaustive()
    }
}
