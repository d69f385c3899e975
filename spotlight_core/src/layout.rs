// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text and geometry of one canvas mock frame.
//!
//! The mock has no real footage; each frame is a flat background with a
//! headline, an optional subtitle, and an elapsed/total timecode. All sizes
//! are in device pixels: callers pass the CSS size and the device pixel
//! ratio, and draw the result as-is.

use kurbo::{Point, Rect, Size};

use crate::worksheet::Worksheet;

/// Background fill.
pub const BACKGROUND: &str = "#1a1a2e";

/// Horizontal anchor of a text run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    /// `origin` is the horizontal center.
    Center,
    /// `origin` is the right edge.
    Right,
}

/// One text run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// Text.
    pub text: String,
    /// Anchor point; vertically the middle of the line.
    pub origin: Point,
    /// Font size in device pixels.
    pub font_px: f64,
    /// Whether the run is bold.
    pub bold: bool,
    /// White at this opacity.
    pub alpha: f64,
    /// Horizontal anchor.
    pub align: Align,
}

/// A laid-out frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MockFrame {
    /// Frame bounds in device pixels.
    pub bounds: Rect,
    /// Main line.
    pub headline: TextRun,
    /// Secondary line.
    pub subtitle: Option<TextRun>,
    /// Bottom-right timecode.
    pub timecode: TextRun,
}

impl MockFrame {
    /// Lays out the frame shown at `time` seconds.
    #[must_use]
    pub fn layout(sheet: &Worksheet, time: f64, css_size: Size, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let size = css_size * scale;
        let bounds = Rect::from_origin_size(Point::ORIGIN, size);
        let center = bounds.center();

        let total = sheet.total_steps();
        let (headline, subtitle) = if time >= sheet.duration - 1.0 {
            (
                sheet.result_heading().to_owned(),
                Some("Your results are ready".to_owned()),
            )
        } else if let Some(entry) = sheet.timeline.latest_crossed(time) {
            (
                entry.prompt.clone(),
                Some(format!("Step {} / {total}", entry.step_index)),
            )
        } else {
            let title = [&sheet.ui.start_screen_title, &sheet.name]
                .into_iter()
                .find(|s| !s.trim().is_empty())
                .cloned()
                .unwrap_or_default();
            (title, None)
        };

        Self {
            bounds,
            headline: TextRun {
                text: headline,
                origin: Point::new(center.x, center.y - 10.0 * scale),
                font_px: 20.0 * scale,
                bold: true,
                alpha: 1.0,
                align: Align::Center,
            },
            subtitle: subtitle.map(|text| TextRun {
                text,
                origin: Point::new(center.x, center.y + 18.0 * scale),
                font_px: 13.0 * scale,
                bold: false,
                alpha: 0.6,
                align: Align::Center,
            }),
            timecode: TextRun {
                text: timecode(time, sheet.duration),
                origin: Point::new(bounds.x1 - 12.0 * scale, bounds.y1 - 10.0 * scale),
                font_px: 11.0 * scale,
                bold: false,
                alpha: 0.4,
                align: Align::Right,
            },
        }
    }
}

/// `"<whole elapsed seconds>s / <duration>s"`.
#[must_use]
pub fn timecode(time: f64, duration: f64) -> String {
    let elapsed = if time.is_finite() { time.max(0.0).floor() } else { 0.0 };
    format!("{elapsed}s / {duration}s")
}
