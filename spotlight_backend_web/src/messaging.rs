// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sending results to a LINE chat through the LIFF SDK.
//!
//! The SDK is a page-level `<script>`; when it is missing every binding
//! below fails with a `ReferenceError`, which reads as "not embedded".

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use spotlight_core::message::SendOutcome;

use crate::describe;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = liff, js_name = init)]
    fn liff_init(config: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = liff, js_name = isInClient)]
    fn liff_is_in_client() -> Result<bool, JsValue>;

    #[wasm_bindgen(catch, js_namespace = liff, js_name = sendMessages)]
    fn liff_send_messages(messages: &Array) -> Result<Promise, JsValue>;
}

/// Initializes the SDK for `liff_id`.
pub async fn init(liff_id: &str) -> Result<(), JsValue> {
    let config = Object::new();
    Reflect::set(&config, &"liffId".into(), &liff_id.into())?;
    JsFuture::from(liff_init(&config)?).await?;
    tracing::debug!(liff_id, "LIFF initialized");
    Ok(())
}

/// Whether the page runs inside the LINE app.
#[must_use]
pub fn is_in_client() -> bool {
    liff_is_in_client().unwrap_or(false)
}

/// Sends `text` as one chat message.
///
/// Outside the LINE app nothing is sent and the text comes back for manual
/// copying; so does a refused send.
pub async fn send_summary(text: String) -> SendOutcome {
    if !is_in_client() {
        return SendOutcome::NotEmbedded { text };
    }
    match send_text(&text).await {
        Ok(()) => SendOutcome::Sent,
        Err(err) => {
            let reason = describe(&err);
            tracing::warn!(%reason, "sending results failed");
            SendOutcome::Failed { text, reason }
        }
    }
}

async fn send_text(text: &str) -> Result<(), JsValue> {
    let message = Object::new();
    Reflect::set(&message, &"type".into(), &"text".into())?;
    Reflect::set(&message, &"text".into(), &text.into())?;
    let messages = Array::of1(&message);
    JsFuture::from(liff_send_messages(&messages)?).await?;
    Ok(())
}
