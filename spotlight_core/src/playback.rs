// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The playback contract shared by every video backend.
//!
//! A backend is a real media element, an embedded YouTube player, or the
//! canvas mock. The controller only ever sees [`Playback`].
//!
//! # Callback contract
//!
//! - `on_time_update` values are non-decreasing while playing. A seek starts
//!   a new run.
//! - `on_ended` fires once per arrival at the end; a seek back below the end
//!   re-arms it.
//! - Callbacks are never invoked from inside `play`, `pause`, or `seek_to`.
//!   They arrive from the host event loop, so a callback may freely call back
//!   into the backend.
//!
//! [`TimeFeed`] implements the first two rules for backends whose raw events
//! do not already guarantee them.

use url::Url;

use crate::course::VideoSource;

/// Uniform control surface over a video backend.
pub trait Playback {
    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Total length in seconds, `0` until known.
    fn duration(&self) -> f64;

    /// Whether playback is running.
    fn is_playing(&self) -> bool;

    /// Starts or resumes playback. A no-op at the end.
    fn play(&mut self);

    /// Pauses playback.
    fn pause(&mut self);

    /// Moves to `time` seconds.
    fn seek_to(&mut self, time: f64);

    /// Registers the time update callback, replacing any previous one.
    fn on_time_update(&mut self, callback: Box<dyn FnMut(f64)>);

    /// Registers the ended callback, replacing any previous one.
    fn on_ended(&mut self, callback: Box<dyn FnMut()>);
}

/// Which backend a video source needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackKind {
    /// No video: the canvas-drawn mock.
    Mock,
    /// A YouTube video, played through the embedded player.
    Embedded {
        /// YouTube video id.
        video_id: String,
    },
    /// Anything else, played by a media element.
    Element {
        /// Media URL.
        url: String,
    },
}

impl PlaybackKind {
    /// Picks the backend for `video`.
    #[must_use]
    pub fn select(video: Option<&VideoSource>) -> Self {
        let Some(video) = video else {
            return Self::Mock;
        };
        let url = video.download_url.trim();
        if url.is_empty() {
            return Self::Mock;
        }
        match youtube_id(url) {
            Some(video_id) => Self::Embedded { video_id },
            None => Self::Element { url: url.into() },
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Embedded { .. } => "embedded",
            Self::Element { .. } => "element",
        }
    }
}

/// Extracts the video id from `youtube.com/watch?v=`, `youtu.be/`, and
/// `youtube.com/embed/` URLs.
#[must_use]
pub fn youtube_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let mut segments = url.path_segments()?;
    let id = match host {
        "youtu.be" => segments.next()?.to_owned(),
        "youtube.com" | "youtube-nocookie.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())?,
            "embed" | "shorts" | "live" => segments.next()?.to_owned(),
            _ => return None,
        },
        _ => return None,
    };
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

/// Filters raw position reports into the callback contract.
///
/// Backwards or non-finite positions are dropped; `ended` passes once until
/// the next seek below the end.
#[derive(Clone, Debug, Default)]
pub struct TimeFeed {
    last: Option<f64>,
    ended: bool,
}

impl TimeFeed {
    /// Creates a feed with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the position to report, or `None` to drop it.
    pub fn time_update(&mut self, time: f64) -> Option<f64> {
        if !time.is_finite() {
            return None;
        }
        if self.last.is_some_and(|last| time < last) {
            return None;
        }
        self.last = Some(time);
        Some(time)
    }

    /// Returns `true` the first time the end is reached.
    pub fn ended(&mut self) -> bool {
        !core::mem::replace(&mut self.ended, true)
    }

    /// Starts a new run at `time`.
    pub fn seek(&mut self, time: f64, duration: f64) {
        self.last = None;
        if time < duration || duration <= 0.0 {
            self.ended = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> VideoSource {
        VideoSource {
            download_url: url.into(),
            duration: 0.0,
        }
    }

    #[test]
    fn backend_selection() {
        assert_eq!(PlaybackKind::select(None), PlaybackKind::Mock);
        assert_eq!(PlaybackKind::select(Some(&source("  "))), PlaybackKind::Mock);
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
        ] {
            assert_eq!(
                PlaybackKind::select(Some(&source(url))),
                PlaybackKind::Embedded {
                    video_id: "dQw4w9WgXcQ".into()
                },
                "{url}"
            );
        }
        assert_eq!(
            PlaybackKind::select(Some(&source("https://cdn.example.com/a.mp4"))).name(),
            "element"
        );
        assert_eq!(
            PlaybackKind::select(Some(&source("https://youtube.com/channel/x"))).name(),
            "element"
        );
    }

    #[test]
    fn feed_is_monotonic() {
        let mut feed = TimeFeed::new();
        assert_eq!(feed.time_update(1.0), Some(1.0));
        assert_eq!(feed.time_update(0.9), None);
        assert_eq!(feed.time_update(f64::NAN), None);
        assert_eq!(feed.time_update(1.0), Some(1.0));
        feed.seek(0.0, 10.0);
        assert_eq!(feed.time_update(0.2), Some(0.2));
    }

    #[test]
    fn feed_ends_once_until_seek() {
        let mut feed = TimeFeed::new();
        assert!(feed.ended());
        assert!(!feed.ended());
        feed.seek(10.0, 10.0);
        assert!(!feed.ended(), "seeking to the end does not re-arm");
        feed.seek(3.0, 10.0);
        assert!(feed.ended());
    }
}
