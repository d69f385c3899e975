// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas-drawn mock video.
//!
//! Used when a course has no video. A [`VirtualClock`] advances by real
//! elapsed time on each animation frame; every frame that moved the clock
//! (or followed a seek or resize) is redrawn from a [`MockFrame`] layout.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::Size;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use spotlight_core::clock::VirtualClock;
use spotlight_core::layout::{Align, BACKGROUND, MockFrame, TextRun};
use spotlight_core::playback::Playback;
use spotlight_core::worksheet::Worksheet;

use crate::events::{CallbackSlot, Listener};
use crate::raf::RafLoop;

/// [`Playback`] over a virtual clock, drawn to a `<canvas>`.
pub struct CanvasPlayback {
    inner: Rc<CanvasInner>,
    raf: RafLoop,
    _resize: Option<Listener>,
}

struct CanvasInner {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    sheet: Worksheet,
    clock: RefCell<VirtualClock>,
    dirty: Cell<bool>,
    on_time_update: CallbackSlot<dyn FnMut(f64)>,
    on_ended: CallbackSlot<dyn FnMut()>,
}

impl CanvasPlayback {
    /// Takes over `canvas` and starts drawing. Playback starts paused at 0.
    pub fn new(canvas: HtmlCanvasElement, sheet: Worksheet) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d canvas context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let inner = Rc::new(CanvasInner {
            clock: RefCell::new(VirtualClock::new(sheet.duration)),
            canvas,
            context,
            sheet,
            dirty: Cell::new(true),
            on_time_update: CallbackSlot::new(),
            on_ended: CallbackSlot::new(),
        });
        inner.fit_to_parent();

        let resize = match web_sys::window() {
            Some(window) => {
                let weak = Rc::downgrade(&inner);
                Some(Listener::new(&window, "resize", move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.fit_to_parent();
                    }
                })?)
            }
            None => None,
        };

        let frame_inner = Rc::clone(&inner);
        let raf = RafLoop::new(move |host_ms| frame_inner.frame(host_ms));
        raf.start();

        Ok(Self {
            inner,
            raf,
            _resize: resize,
        })
    }
}

impl CanvasInner {
    fn frame(&self, host_ms: f64) {
        let tick = self.clock.borrow_mut().tick(host_ms);
        if tick.is_some() || self.dirty.get() {
            self.dirty.set(false);
            self.draw();
        }
        if let Some(tick) = tick {
            self.on_time_update.call_with(|cb| cb(tick.time));
            if tick.ended {
                self.on_ended.call_with(|cb| cb());
            }
        }
    }

    fn fit_to_parent(&self) {
        let Some(parent) = self.canvas.parent_element() else {
            return;
        };
        let rect = parent.get_bounding_client_rect();
        let scale = device_pixel_ratio();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "canvas backing store sizes are small positive pixel counts"
        )]
        let (width, height) = (
            (rect.width() * scale).round().max(1.0) as u32,
            (rect.height() * scale).round().max(1.0) as u32,
        );
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", rect.width()));
        let _ = style.set_property("height", &format!("{}px", rect.height()));
        self.dirty.set(true);
    }

    fn draw(&self) {
        let scale = device_pixel_ratio();
        let css = Size::new(
            f64::from(self.canvas.width()) / scale,
            f64::from(self.canvas.height()) / scale,
        );
        let time = self.clock.borrow().time();
        let frame = MockFrame::layout(&self.sheet, time, css, scale);

        let ctx = &self.context;
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(
            frame.bounds.x0,
            frame.bounds.y0,
            frame.bounds.width(),
            frame.bounds.height(),
        );
        ctx.set_text_baseline("middle");
        for run in [Some(&frame.headline), frame.subtitle.as_ref(), Some(&frame.timecode)]
            .into_iter()
            .flatten()
        {
            draw_text(ctx, run);
        }
    }
}

fn draw_text(ctx: &CanvasRenderingContext2d, run: &TextRun) {
    ctx.set_font(&font(run));
    ctx.set_text_align(match run.align {
        Align::Center => "center",
        Align::Right => "right",
    });
    ctx.set_fill_style_str(&white(run.alpha));
    let _ = ctx.fill_text(&run.text, run.origin.x, run.origin.y);
}

fn font(run: &TextRun) -> String {
    let weight = if run.bold { "bold " } else { "" };
    format!("{weight}{}px sans-serif", run.font_px)
}

fn white(alpha: f64) -> String {
    format!("rgba(255, 255, 255, {})", alpha.clamp(0.0, 1.0))
}

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(1.0)
}

impl Playback for CanvasPlayback {
    fn current_time(&self) -> f64 {
        self.inner.clock.borrow().time()
    }

    fn duration(&self) -> f64 {
        self.inner.clock.borrow().duration()
    }

    fn is_playing(&self) -> bool {
        self.inner.clock.borrow().is_playing()
    }

    fn play(&mut self) {
        self.inner.clock.borrow_mut().play();
    }

    fn pause(&mut self) {
        self.inner.clock.borrow_mut().pause();
    }

    fn seek_to(&mut self, time: f64) {
        self.inner.clock.borrow_mut().seek(time);
        self.inner.dirty.set(true);
    }

    fn on_time_update(&mut self, callback: Box<dyn FnMut(f64)>) {
        self.inner.on_time_update.set(callback);
    }

    fn on_ended(&mut self, callback: Box<dyn FnMut()>) {
        self.inner.on_ended.set(callback);
    }
}

impl std::fmt::Debug for CanvasPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.inner.clock.borrow();
        f.debug_struct("CanvasPlayback")
            .field("time", &clock.time())
            .field("playing", &clock.is_playing())
            .field("raf", &self.raf)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    fn run(bold: bool, font_px: f64) -> TextRun {
        TextRun {
            text: "x".into(),
            origin: Point::ORIGIN,
            font_px,
            bold,
            alpha: 1.0,
            align: Align::Center,
        }
    }

    #[test]
    fn font_shorthand() {
        assert_eq!(font(&run(true, 40.0)), "bold 40px sans-serif");
        assert_eq!(font(&run(false, 26.0)), "26px sans-serif");
    }

    #[test]
    fn text_color_is_clamped_white() {
        assert_eq!(white(0.6), "rgba(255, 255, 255, 0.6)");
        assert_eq!(white(2.0), "rgba(255, 255, 255, 1)");
    }
}
