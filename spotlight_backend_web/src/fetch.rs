// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Course loading.
//!
//! Built-in courses resolve locally. Anything else is fetched as
//! `<slug>.json` relative to a base URL, under an [`AbortGuard`] that
//! cancels the request when dropped or when the page is hidden for good.

use thiserror::Error;
use url::Url;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, DomException, RequestInit, Response};

use spotlight_core::course::{ConfigError, Course};
use spotlight_core::launch::LaunchParams;
use spotlight_core::preset;

use crate::describe;
use crate::events::Listener;

/// Why a course could not be loaded.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request was cancelled.
    #[error("request aborted")]
    Aborted,
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with an error status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The response body could not be read as text.
    #[error("unreadable response body: {0}")]
    Body(String),
    /// The course URL could not be built.
    #[error("bad course URL: {0}")]
    Url(#[from] url::ParseError),
    /// The document is not a usable course.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FetchError {
    fn from_js(err: &JsValue) -> Self {
        let aborted = err
            .dyn_ref::<DomException>()
            .is_some_and(|e| e.name() == "AbortError");
        if aborted {
            Self::Aborted
        } else {
            Self::Network(describe(err))
        }
    }
}

/// Owns an `AbortController`. Aborts on drop and on `pagehide`.
pub struct AbortGuard {
    controller: AbortController,
    _pagehide: Option<Listener>,
}

impl AbortGuard {
    /// Creates a guard for a new request.
    pub fn new() -> Result<Self, JsValue> {
        let controller = AbortController::new()?;
        let pagehide = match web_sys::window() {
            Some(window) => {
                let on_hide = controller.clone();
                Some(Listener::new(&window, "pagehide", move |_| on_hide.abort())?)
            }
            None => None,
        };
        Ok(Self {
            controller,
            _pagehide: pagehide,
        })
    }

    /// The signal to pass to `fetch`.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        self.controller.signal()
    }

    /// Aborts now.
    pub fn abort(&self) {
        self.controller.abort();
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        self.controller.abort();
    }
}

impl std::fmt::Debug for AbortGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortGuard")
            .field("aborted", &self.controller.signal().aborted())
            .finish_non_exhaustive()
    }
}

/// GETs `url` as text.
pub async fn fetch_text(url: &Url, guard: &AbortGuard) -> Result<String, FetchError> {
    let window = web_sys::window().ok_or_else(|| FetchError::Network("no window".into()))?;
    let init = RequestInit::new();
    init.set_method("GET");
    init.set_signal(Some(&guard.signal()));

    let response = JsFuture::from(window.fetch_with_str_and_init(url.as_str(), &init))
        .await
        .map_err(|err| FetchError::from_js(&err))?;
    let response: Response = response
        .dyn_into()
        .map_err(|err| FetchError::Network(describe(&err)))?;
    if !response.ok() {
        return Err(FetchError::Status {
            status: response.status(),
            url: url.to_string(),
        });
    }

    let body = response
        .text()
        .map_err(|err| FetchError::Body(describe(&err)))?;
    let body = JsFuture::from(body)
        .await
        .map_err(|err| FetchError::from_js(&err))?;
    body.as_string()
        .ok_or_else(|| FetchError::Body("body is not a string".into()))
}

/// Resolves the course `params` names: a built-in preset, or
/// `<base>/<slug>.json`. Drafts load only with `preview=1`.
pub async fn load_course(
    params: &LaunchParams,
    base: &Url,
    guard: &AbortGuard,
) -> Result<Course, FetchError> {
    if let Some(course) = preset::by_slug(&params.course) {
        return Ok(course);
    }
    let url = params.course_url(base)?;
    tracing::debug!(%url, "fetching course");
    let text = match fetch_text(&url, guard).await {
        Err(FetchError::Status { status: 404, .. }) => {
            return Err(ConfigError::NotFound(params.course.clone()).into());
        }
        other => other?,
    };
    let course = Course::from_json(&text)?;
    course.check_access(params.preview)?;
    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = FetchError::Status {
            status: 404,
            url: "https://example.com/courses/x.json".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://example.com/courses/x.json");
        assert_eq!(FetchError::Aborted.to_string(), "request aborted");
    }

    #[test]
    fn config_errors_pass_through() {
        let err: FetchError = ConfigError::Unpublished("draft".into()).into();
        assert_eq!(err.to_string(), ConfigError::Unpublished("draft".into()).to_string());
    }
}
