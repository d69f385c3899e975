// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page wiring: course loading, backend selection, and UI events.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use url::Url;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use web_sys::{Document, Event, HtmlCanvasElement, HtmlElement, HtmlInputElement, HtmlMediaElement};

use spotlight_core::controller::{Controller, GateError};
use spotlight_core::launch::LaunchParams;
use spotlight_core::message::SendOutcome;
use spotlight_core::playback::{Playback, PlaybackKind};
use spotlight_core::worksheet::Worksheet;

use crate::canvas::CanvasPlayback;
use crate::console::ConsoleSink;
use crate::events::Listener;
use crate::fetch::{self, AbortGuard, FetchError};
use crate::messaging;
use crate::presenter::{DomPresenter, FIELD_ATTR};
use crate::storage::LocalStore;
use crate::video::ElementPlayback;
use crate::youtube::EmbeddedPlayback;

/// Directory, relative to the page, that course documents are fetched from.
pub const COURSE_DIR: &str = "courses/";

/// A mounted worksheet. Dropping it detaches every listener.
pub struct App {
    controller: Rc<RefCell<Controller>>,
    _presenter: Rc<RefCell<DomPresenter>>,
    _listeners: Vec<Listener>,
}

impl App {
    /// The running controller.
    #[must_use]
    pub fn controller(&self) -> &Rc<RefCell<Controller>> {
        &self.controller
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

/// Loads the course named by the page URL and mounts the worksheet in
/// `root`.
///
/// A course that fails to load or validate replaces `root` with a static
/// error screen and returns the error.
pub async fn mount(root: HtmlElement) -> Result<App, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let location = window.location();
    let params = LaunchParams::from_query(&location.search()?);

    let sheet = match load(&params, &location.href()?).await {
        Ok(sheet) => sheet,
        Err(err) => {
            tracing::error!(course = %params.course, %err, "course failed to load");
            DomPresenter::render_error(&document, &root, &err.to_string())?;
            return Err(JsValue::from_str(&err.to_string()));
        }
    };
    tracing::info!(slug = %sheet.slug, steps = sheet.total_steps(), "course loaded");

    let presenter = DomPresenter::new(&document, root)?;
    let playback = make_playback(&document, &sheet, presenter.video_host())?;
    let liff_id = sheet.liff_id.clone();
    let presenter = Rc::new(RefCell::new(presenter));

    let mut controller = Controller::new(sheet, playback, Box::new(LocalStore::open()))
        .with_trace(Box::new(ConsoleSink::new()));
    let target = Rc::clone(&presenter);
    controller.on_render(move |view| {
        if let Err(err) = target.borrow_mut().render(view) {
            tracing::warn!(error = %crate::describe(&err), "render failed");
        }
    });
    let controller = controller.attach();
    controller.borrow_mut().restore();

    let listeners = wire(&presenter.borrow(), &Rc::downgrade(&controller))?;

    if !liff_id.is_empty() {
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = messaging::init(&liff_id).await {
                tracing::warn!(%liff_id, error = %crate::describe(&err), "LIFF init failed");
            }
        });
    }

    Ok(App {
        controller,
        _presenter: presenter,
        _listeners: listeners,
    })
}

async fn load(params: &LaunchParams, href: &str) -> Result<Worksheet, FetchError> {
    let base = course_base(href)?;
    let guard = AbortGuard::new().map_err(|err| FetchError::Network(crate::describe(&err)))?;
    let course = fetch::load_course(params, &base, &guard).await?;
    Ok(course.compile()?)
}

/// The URL course documents are resolved against, given the page URL.
pub fn course_base(href: &str) -> Result<Url, url::ParseError> {
    Url::parse(href)?.join(COURSE_DIR)
}

/// Creates the playback backend the worksheet's video source calls for,
/// inside `host`.
pub fn make_playback(
    document: &Document,
    sheet: &Worksheet,
    host: &HtmlElement,
) -> Result<Box<dyn Playback>, JsValue> {
    let kind = PlaybackKind::select(sheet.video.as_ref());
    tracing::info!(backend = kind.name(), "selected playback backend");
    Ok(match kind {
        PlaybackKind::Mock => {
            let canvas: HtmlCanvasElement = document.create_element("canvas")?.unchecked_into();
            host.append_child(&canvas)?;
            Box::new(CanvasPlayback::new(canvas, sheet.clone())?)
        }
        PlaybackKind::Embedded { video_id } => {
            let frame: HtmlElement = document.create_element("div")?.unchecked_into();
            host.append_child(&frame)?;
            Box::new(EmbeddedPlayback::new(frame, video_id, sheet.duration))
        }
        PlaybackKind::Element { url } => {
            let video: HtmlMediaElement = document.create_element("video")?.unchecked_into();
            host.append_child(&video)?;
            Box::new(ElementPlayback::new(video, &url)?)
        }
    })
}

type Handle = Weak<RefCell<Controller>>;

fn wire(presenter: &DomPresenter, controller: &Handle) -> Result<Vec<Listener>, JsValue> {
    let mut listeners = Vec::new();

    let buttons: [(&HtmlElement, &'static str, fn(&mut Controller) -> Result<(), GateError>); 4] = [
        (presenter.start_button(), "start", Controller::start),
        (presenter.resume_button(), "resume", Controller::resume),
        (presenter.confirm_button(), "confirm", Controller::confirm),
        (presenter.reset_button(), "reset", |c| {
            c.reset();
            Ok(())
        }),
    ];
    for (button, action, f) in buttons {
        let handle = controller.clone();
        listeners.push(Listener::new(button, "click", move |_| {
            act(&handle, action, f);
        })?);
    }

    let handle = controller.clone();
    listeners.push(Listener::new(presenter.fields(), "input", move |event: Event| {
        let Some(input) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(field_id) = input.get_attribute(FIELD_ATTR) else {
            return;
        };
        let raw = input.value();
        act(&handle, "edit", |c| c.set_draft(&field_id, &raw));
    })?);

    let handle = controller.clone();
    listeners.push(Listener::new(presenter.fields(), "submit", move |event: Event| {
        event.prevent_default();
        act(&handle, "confirm", Controller::confirm);
    })?);

    let handle = controller.clone();
    listeners.push(Listener::new(presenter.send_button(), "click", move |_| {
        let summary = handle
            .upgrade()
            .and_then(|c| c.try_borrow().ok().and_then(|c| c.summary()));
        let Some(text) = summary else {
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = messaging::send_summary(text).await;
            notify(&outcome);
        });
    })?);

    Ok(listeners)
}

fn act(handle: &Handle, action: &str, f: impl FnOnce(&mut Controller) -> Result<(), GateError>) {
    let Some(controller) = handle.upgrade() else {
        return;
    };
    let Ok(mut controller) = controller.try_borrow_mut() else {
        tracing::warn!(action, "controller busy; ignoring UI event");
        return;
    };
    if let Err(err) = f(&mut controller) {
        tracing::debug!(action, %err, "UI event refused");
    }
}

fn notify(outcome: &SendOutcome) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(&outcome.notice());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn courses_resolve_next_to_the_page() {
        let base = course_base("https://example.com/app/index.html?course=starter").unwrap();
        assert_eq!(base.as_str(), "https://example.com/app/courses/");
        let base = course_base("https://example.com/app/").unwrap();
        assert_eq!(base.as_str(), "https://example.com/app/courses/");
    }

    #[test]
    fn bad_page_urls_are_errors() {
        assert!(course_base("not a url").is_err());
    }
}
