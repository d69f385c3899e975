// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Embedded YouTube playback.
//!
//! The iframe API script is loaded on first use. Until the player reports
//! ready, `play`, `pause`, and `seek_to` are queued in [`PendingCommands`]
//! and replayed on ready. The player fires no time events of its own, so
//! the position is polled every [`POLL_INTERVAL_MS`] milliseconds.

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, HtmlElement, Window};

use spotlight_core::playback::{Playback, TimeFeed};

use crate::describe;
use crate::events::CallbackSlot;

/// How often the player position is sampled.
pub const POLL_INTERVAL_MS: i32 = 250;

const API_SRC: &str = "https://www.youtube.com/iframe_api";
const STATE_ENDED: f64 = 0.0;
const STATE_PLAYING: i32 = 1;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = YT, js_name = Player)]
    type YtPlayer;

    #[wasm_bindgen(constructor, js_namespace = YT, js_class = "Player")]
    fn new(host: &Element, options: &Object) -> YtPlayer;

    #[wasm_bindgen(method, js_name = playVideo)]
    fn play_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = pauseVideo)]
    fn pause_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = seekTo)]
    fn seek_to(this: &YtPlayer, seconds: f64, allow_seek_ahead: bool);

    #[wasm_bindgen(method, js_name = getCurrentTime)]
    fn get_current_time(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_name = getDuration)]
    fn get_duration(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_name = getPlayerState)]
    fn get_player_state(this: &YtPlayer) -> i32;
}

/// Commands issued before the player is ready.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingCommands {
    ready: bool,
    play: bool,
    seek: Option<f64>,
}

impl PendingCommands {
    /// Whether the player has reported ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether playback was requested and not since paused.
    #[must_use]
    pub fn wants_play(&self) -> bool {
        self.play
    }

    /// The queued seek target, if any.
    #[must_use]
    pub fn queued_seek(&self) -> Option<f64> {
        self.seek
    }

    /// Records a play request. Returns `true` if it should run now.
    pub fn play(&mut self) -> bool {
        self.play = true;
        self.ready
    }

    /// Records a pause request. Returns `true` if it should run now.
    pub fn pause(&mut self) -> bool {
        self.play = false;
        self.ready
    }

    /// Records a seek request. Returns `true` if it should run now.
    pub fn seek(&mut self, time: f64) -> bool {
        if !self.ready {
            self.seek = Some(time);
        }
        self.ready
    }

    /// Marks the player ready and returns what to replay: the seek target
    /// first, then whether to start playing.
    pub fn ready(&mut self) -> (Option<f64>, bool) {
        self.ready = true;
        (self.seek.take(), self.play)
    }
}

/// [`Playback`] over an embedded YouTube player.
pub struct EmbeddedPlayback {
    inner: Rc<EmbeddedInner>,
}

struct EmbeddedInner {
    host: HtmlElement,
    duration_hint: f64,
    player: RefCell<Option<YtPlayer>>,
    pending: RefCell<PendingCommands>,
    feed: RefCell<TimeFeed>,
    on_time_update: CallbackSlot<dyn FnMut(f64)>,
    on_ended: CallbackSlot<dyn FnMut()>,
    closures: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
    poll: RefCell<Option<(i32, Closure<dyn FnMut()>)>>,
}

impl EmbeddedPlayback {
    /// Creates the player inside `host` once the iframe API has loaded.
    ///
    /// `duration_hint` stands in for the duration until the player knows it.
    #[must_use]
    pub fn new(host: HtmlElement, video_id: String, duration_hint: f64) -> Self {
        let inner = Rc::new(EmbeddedInner {
            host,
            duration_hint,
            player: RefCell::new(None),
            pending: RefCell::new(PendingCommands::default()),
            feed: RefCell::new(TimeFeed::new()),
            on_time_update: CallbackSlot::new(),
            on_ended: CallbackSlot::new(),
            closures: RefCell::new(Vec::new()),
            poll: RefCell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = mount(weak, &video_id).await {
                tracing::warn!(%video_id, error = %describe(&err), "could not load the embedded player");
            }
        });
        Self { inner }
    }
}

async fn mount(weak: Weak<EmbeddedInner>, video_id: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    JsFuture::from(api_ready(&window)?).await?;
    let Some(inner) = weak.upgrade() else {
        return Ok(());
    };

    let on_ready = {
        let weak = weak.clone();
        Closure::wrap(Box::new(move |_event: JsValue| {
            if let Some(inner) = weak.upgrade() {
                inner.ready();
            }
        }) as Box<dyn FnMut(JsValue)>)
    };
    let on_state = {
        let weak = weak.clone();
        Closure::wrap(Box::new(move |event: JsValue| {
            let state = Reflect::get(&event, &"data".into())
                .ok()
                .and_then(|d| d.as_f64());
            if state == Some(STATE_ENDED)
                && let Some(inner) = weak.upgrade()
            {
                inner.ended();
            }
        }) as Box<dyn FnMut(JsValue)>)
    };

    let options = player_options(video_id, &on_ready, &on_state)?;
    let player = YtPlayer::new(&inner.host, &options);
    *inner.player.borrow_mut() = Some(player);
    inner.closures.borrow_mut().extend([on_ready, on_state]);

    let poll = Closure::wrap(Box::new(move || {
        if let Some(inner) = weak.upgrade() {
            inner.sample();
        }
    }) as Box<dyn FnMut()>);
    let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
        poll.as_ref().unchecked_ref(),
        POLL_INTERVAL_MS,
    )?;
    *inner.poll.borrow_mut() = Some((id, poll));
    Ok(())
}

thread_local! {
    static API_READY: OnceCell<Promise> = const { OnceCell::new() };
}

/// A promise that resolves once `window.YT.Player` exists. Injects the API
/// script on the first call.
fn api_ready(window: &Window) -> Result<Promise, JsValue> {
    let loaded = Reflect::get(window, &"YT".into())
        .ok()
        .filter(|yt| yt.is_object())
        .and_then(|yt| Reflect::get(&yt, &"Player".into()).ok())
        .is_some_and(|player| player.is_function());
    if loaded {
        return Ok(Promise::resolve(&JsValue::UNDEFINED));
    }
    if let Some(promise) = API_READY.with(|cell| cell.get().cloned()) {
        return Ok(promise);
    }

    let mut hook = None;
    let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
        hook = Some(resolve);
    });
    if let Some(resolve) = hook {
        Reflect::set(window, &"onYouTubeIframeAPIReady".into(), &resolve)?;
    }
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let script = document.create_element("script")?;
    script.set_attribute("src", API_SRC)?;
    script.set_attribute("async", "")?;
    document
        .head()
        .ok_or_else(|| JsValue::from_str("no <head>"))?
        .append_child(&script)?;

    API_READY.with(|cell| {
        let _ = cell.set(promise.clone());
    });
    Ok(promise)
}

fn player_options(
    video_id: &str,
    on_ready: &Closure<dyn FnMut(JsValue)>,
    on_state: &Closure<dyn FnMut(JsValue)>,
) -> Result<Object, JsValue> {
    let vars = Object::new();
    for key in ["playsinline", "rel", "modestbranding"] {
        Reflect::set(&vars, &key.into(), &1.into())?;
    }
    Reflect::set(&vars, &"controls".into(), &0.into())?;

    let events = Object::new();
    Reflect::set(&events, &"onReady".into(), on_ready.as_ref())?;
    Reflect::set(&events, &"onStateChange".into(), on_state.as_ref())?;

    let options = Object::new();
    Reflect::set(&options, &"videoId".into(), &video_id.into())?;
    Reflect::set(&options, &"width".into(), &"100%".into())?;
    Reflect::set(&options, &"height".into(), &"100%".into())?;
    Reflect::set(&options, &"playerVars".into(), &vars)?;
    Reflect::set(&options, &"events".into(), &events)?;
    Ok(options)
}

impl EmbeddedInner {
    fn ready(&self) {
        let (seek, play) = self.pending.borrow_mut().ready();
        tracing::debug!(?seek, play, "embedded player ready");
        if let Some(player) = &*self.player.borrow() {
            if let Some(time) = seek {
                player.seek_to(time, true);
            }
            if play {
                player.play_video();
            }
        }
    }

    fn sample(&self) {
        let time = match &*self.player.borrow() {
            Some(player) if self.pending.borrow().is_ready() => player.get_current_time(),
            _ => return,
        };
        let time = self.feed.borrow_mut().time_update(time);
        if let Some(time) = time {
            self.on_time_update.call_with(|cb| cb(time));
        }
    }

    fn ended(&self) {
        let first = self.feed.borrow_mut().ended();
        if first {
            self.on_ended.call_with(|cb| cb());
        }
    }

    fn with_ready_player(&self, f: impl FnOnce(&YtPlayer)) {
        if let Some(player) = &*self.player.borrow() {
            f(player);
        }
    }
}

impl Playback for EmbeddedPlayback {
    fn current_time(&self) -> f64 {
        let pending = self.inner.pending.borrow();
        match &*self.inner.player.borrow() {
            Some(player) if pending.is_ready() => player.get_current_time(),
            _ => pending.queued_seek().unwrap_or(0.0),
        }
    }

    fn duration(&self) -> f64 {
        let known = match &*self.inner.player.borrow() {
            Some(player) if self.inner.pending.borrow().is_ready() => player.get_duration(),
            _ => 0.0,
        };
        if known.is_finite() && known > 0.0 {
            known
        } else {
            self.inner.duration_hint
        }
    }

    fn is_playing(&self) -> bool {
        let pending = self.inner.pending.borrow();
        match &*self.inner.player.borrow() {
            Some(player) if pending.is_ready() => player.get_player_state() == STATE_PLAYING,
            _ => pending.wants_play(),
        }
    }

    fn play(&mut self) {
        if self.inner.pending.borrow_mut().play() {
            self.inner.with_ready_player(YtPlayer::play_video);
        }
    }

    fn pause(&mut self) {
        if self.inner.pending.borrow_mut().pause() {
            self.inner.with_ready_player(YtPlayer::pause_video);
        }
    }

    fn seek_to(&mut self, time: f64) {
        let duration = self.duration();
        self.inner.feed.borrow_mut().seek(time, duration);
        if self.inner.pending.borrow_mut().seek(time) {
            self.inner.with_ready_player(|p| p.seek_to(time, true));
        }
    }

    fn on_time_update(&mut self, callback: Box<dyn FnMut(f64)>) {
        self.inner.on_time_update.set(callback);
    }

    fn on_ended(&mut self, callback: Box<dyn FnMut()>) {
        self.inner.on_ended.set(callback);
    }
}

impl Drop for EmbeddedPlayback {
    fn drop(&mut self) {
        if let Some((id, _closure)) = self.inner.poll.borrow_mut().take()
            && let Some(window) = web_sys::window()
        {
            window.clear_interval_with_handle(id);
        }
    }
}

impl std::fmt::Debug for EmbeddedPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedPlayback")
            .field("pending", &*self.inner.pending.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_queue_until_ready() {
        let mut pending = PendingCommands::default();
        assert!(!pending.seek(8.0));
        assert!(!pending.play());
        assert!(pending.wants_play());
        assert_eq!(pending.queued_seek(), Some(8.0));

        assert_eq!(pending.ready(), (Some(8.0), true));
        assert!(pending.is_ready());
        assert_eq!(pending.queued_seek(), None);
    }

    #[test]
    fn pause_before_ready_cancels_the_queued_play() {
        let mut pending = PendingCommands::default();
        pending.play();
        pending.pause();
        assert_eq!(pending.ready(), (None, false));
    }

    #[test]
    fn commands_run_immediately_once_ready() {
        let mut pending = PendingCommands::default();
        pending.ready();
        assert!(pending.play());
        assert!(pending.seek(3.0));
        assert_eq!(pending.queued_seek(), None);
        assert!(pending.pause());
    }
}
