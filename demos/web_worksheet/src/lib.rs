// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser entry point for spotlight worksheets.
//!
//! Mounts the course named by `?course=<slug>` into the page's `#app`
//! element. Without a video source the worksheet plays against a canvas
//! mock, so `?course=budget` works offline.
//!
//! Build with: `wasm-pack build --target web demos/web_worksheet`
//! Then serve `demos/web_worksheet/` and open `index.html`.

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

use std::cell::RefCell;

use spotlight_backend_web::ConsoleWriter;
use spotlight_backend_web::app::{self, App};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

/// Id of the element the worksheet mounts into.
const ROOT_ID: &str = "app";

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Entry point for the worksheet demo.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // A second start (hot reload) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(ConsoleWriter::new)
        .try_init();

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let root: HtmlElement = match document.get_element_by_id(ROOT_ID) {
        Some(el) => el.dyn_into()?,
        None => {
            let el: HtmlElement = document.create_element("main")?.dyn_into()?;
            el.set_id(ROOT_ID);
            document
                .body()
                .ok_or_else(|| JsValue::from_str("no body"))?
                .append_child(&el)?;
            el
        }
    };

    wasm_bindgen_futures::spawn_local(async move {
        match app::mount(root).await {
            Ok(mounted) => APP.with(|slot| *slot.borrow_mut() = Some(mounted)),
            Err(err) => tracing::error!(?err, "worksheet failed to mount"),
        }
    });
    Ok(())
}
