// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What the worksheet looks like right now.
//!
//! [`WorksheetView`] is a pure projection of controller state. Presenters
//! render it wholesale after every change and keep no state of their own.

use crate::field::FieldKind;
use crate::formula::Results;
use crate::state::{AppState, Phase};
use crate::worksheet::Worksheet;

/// Display state of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldStatus {
    /// Not reached yet; input disabled.
    Locked,
    /// The one field accepting input.
    Spotlight,
    /// Confirmed; shown read-only.
    Completed,
}

impl FieldStatus {
    /// CSS class name.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Spotlight => "spotlight",
            Self::Completed => "completed",
        }
    }
}

/// One form field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldView {
    /// Field id.
    pub id: String,
    /// Step that unlocks it.
    pub step_index: Option<u32>,
    /// Step header text.
    pub step_label: String,
    /// Input label.
    pub label: String,
    /// Unit suffix.
    pub unit: String,
    /// Placeholder.
    pub placeholder: String,
    /// Input kind.
    pub kind: FieldKind,
    /// Display state.
    pub status: FieldStatus,
    /// Current text: the draft while spotlighted, else the committed value.
    pub value: String,
    /// Prompt, while spotlighted.
    pub prompt: Option<String>,
}

/// One displayed result.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultView {
    /// Step id.
    pub id: String,
    /// Label.
    pub label: String,
    /// Formatted value.
    pub value: String,
    /// Unit suffix.
    pub unit: String,
    /// Whether this is the emphasized result.
    pub is_main: bool,
}

/// The results panel.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsView {
    /// Panel heading.
    pub heading: String,
    /// Displayed results in declaration order.
    pub items: Vec<ResultView>,
    /// Footnote.
    pub note: String,
}

/// Start screen text.
#[derive(Clone, Debug, PartialEq)]
pub struct StartScreen {
    /// Heading.
    pub title: String,
    /// Body.
    pub description: String,
}

/// The whole screen.
#[derive(Clone, Debug, PartialEq)]
pub struct WorksheetView {
    /// Worksheet heading.
    pub title: String,
    /// Accent color, CSS syntax, empty for the default.
    pub accent: String,
    /// Controller phase.
    pub phase: Phase,
    /// Present only while idle.
    pub start_screen: Option<StartScreen>,
    /// Whether the dimming overlay is shown.
    pub overlay: bool,
    /// Whether the confirm button is shown.
    pub confirm_visible: bool,
    /// Whether the resume button is shown (restored session, paused).
    pub resume_visible: bool,
    /// Inline validation message.
    pub message: Option<String>,
    /// Fields in display order.
    pub fields: Vec<FieldView>,
    /// Results, once completed.
    pub results: Option<ResultsView>,
    /// Playback progress, `0..=1`.
    pub progress: f64,
}

/// Inputs to [`WorksheetView::project`] beyond the worksheet itself.
#[derive(Clone, Copy, Debug)]
pub struct ViewInputs<'a> {
    /// Session state.
    pub state: &'a AppState,
    /// Controller phase.
    pub phase: Phase,
    /// Text in the spotlighted input.
    pub draft: &'a str,
    /// Inline message to show.
    pub message: Option<&'a str>,
    /// Results, when computed.
    pub results: Option<&'a Results>,
    /// Whether playback is running.
    pub playing: bool,
}

impl WorksheetView {
    /// Builds the view.
    #[must_use]
    pub fn project(sheet: &Worksheet, inputs: ViewInputs<'_>) -> Self {
        let ViewInputs {
            state,
            phase,
            draft,
            message,
            results,
            playing,
        } = inputs;
        let spotlight = phase.spotlight_step();

        let fields = sheet
            .fields
            .iter()
            .map(|field| {
                let entry = sheet
                    .timeline
                    .step_for_field(&field.id)
                    .and_then(|step| sheet.timeline.entry(step));
                let step_index = entry.map(|e| e.step_index);
                let committed = state.value(&field.id);
                let status = match step_index {
                    Some(step) if spotlight == Some(step) => FieldStatus::Spotlight,
                    Some(step) if step <= state.current_step && committed.is_some() => {
                        FieldStatus::Completed
                    }
                    _ => FieldStatus::Locked,
                };
                let value = match status {
                    FieldStatus::Spotlight => draft.to_owned(),
                    _ => committed.map(ToString::to_string).unwrap_or_default(),
                };
                FieldView {
                    id: field.id.clone(),
                    step_index,
                    step_label: field.step_label.clone(),
                    label: field.label.clone(),
                    unit: field.unit.clone(),
                    placeholder: field.placeholder.clone(),
                    kind: field.kind,
                    status,
                    value,
                    prompt: entry
                        .filter(|_| status == FieldStatus::Spotlight)
                        .map(|e| e.prompt.clone()),
                }
            })
            .collect();

        let confirm_visible = spotlight
            .and_then(|step| sheet.timeline.entry(step))
            .and_then(|entry| sheet.field(&entry.field_id))
            .is_some_and(|field| field.kind.parse(draft).is_some());

        let results = match (phase, results) {
            (Phase::Completed, Some(results)) => Some(ResultsView {
                heading: sheet.result_heading().to_owned(),
                items: results
                    .displayed()
                    .map(|r| ResultView {
                        id: r.id.clone(),
                        label: r.label.clone(),
                        value: format_number(r.value),
                        unit: r.unit.clone(),
                        is_main: r.is_main,
                    })
                    .collect(),
                note: sheet.note.clone(),
            }),
            _ => None,
        };

        let start_screen = (phase == Phase::Idle).then(|| StartScreen {
            title: non_empty_or(&sheet.ui.start_screen_title, &sheet.name),
            description: sheet.ui.start_screen_description.clone(),
        });

        let progress = if sheet.duration > 0.0 {
            (state.video_time / sheet.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            title: non_empty_or(&sheet.ui.title, &sheet.name),
            accent: sheet.ui.primary_color.clone(),
            phase,
            start_screen,
            overlay: spotlight.is_some(),
            confirm_visible,
            resume_visible: matches!(phase, Phase::Resuming { .. }) && !playing,
            message: message.map(str::to_owned),
            fields,
            results,
            progress,
        }
    }

    /// The spotlighted field, if any.
    #[must_use]
    pub fn spotlight(&self) -> Option<&FieldView> {
        self.fields
            .iter()
            .find(|f| f.status == FieldStatus::Spotlight)
    }
}

fn non_empty_or(preferred: &str, fallback: &str) -> String {
    if preferred.trim().is_empty() {
        fallback.to_owned()
    } else {
        preferred.to_owned()
    }
}

/// Formats a result: thousands separators, at most two decimals, no
/// trailing zeros.
///
/// ```
/// use spotlight_core::view::format_number;
/// assert_eq!(format_number(3919.0), "3,919");
/// assert_eq!(format_number(-1234.5), "-1,234.5");
/// assert_eq!(format_number(12.0), "12");
/// ```
#[must_use]
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".into();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}
