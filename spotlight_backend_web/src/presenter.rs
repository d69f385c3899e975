// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM rendering.
//!
//! [`DomPresenter`] builds the worksheet markup inside a root element once,
//! then applies each [`WorksheetView`] to it. Only properties that changed
//! are written, so the spotlighted input keeps its caret while the user
//! types.

use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use web_sys::{Document, HtmlElement, HtmlInputElement};

use spotlight_core::field::FieldKind;
use spotlight_core::view::{FieldStatus, FieldView, ResultsView, WorksheetView};

/// `data-` attribute naming the field an input belongs to.
pub const FIELD_ATTR: &str = "data-field";

/// Owns the worksheet's DOM subtree.
pub struct DomPresenter {
    document: Document,
    root: HtmlElement,
    title: HtmlElement,
    video_host: HtmlElement,
    progress_bar: HtmlElement,
    start_screen: HtmlElement,
    start_title: HtmlElement,
    start_description: HtmlElement,
    start_button: HtmlElement,
    overlay: HtmlElement,
    fields: HtmlElement,
    rows: Vec<FieldRow>,
    message: HtmlElement,
    confirm_button: HtmlElement,
    resume_button: HtmlElement,
    results: HtmlElement,
    results_heading: HtmlElement,
    results_list: HtmlElement,
    results_note: HtmlElement,
    send_button: HtmlElement,
    reset_button: HtmlElement,
    focused: Option<String>,
}

struct FieldRow {
    id: String,
    row: HtmlElement,
    step_label: HtmlElement,
    label: HtmlElement,
    input: HtmlInputElement,
    unit: HtmlElement,
    prompt: HtmlElement,
}

impl std::fmt::Debug for DomPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomPresenter")
            .field("rows", &self.rows.len())
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}

impl DomPresenter {
    /// Builds the worksheet skeleton inside `root`, replacing its children.
    pub fn new(document: &Document, root: HtmlElement) -> Result<Self, JsValue> {
        root.set_text_content(None);
        root.class_list().add_1("spotlight")?;
        let build = Builder { document };

        let title = build.child(&root, "h1", "title")?;
        let stage = build.child(&root, "div", "stage")?;
        let video_host = build.child(&stage, "div", "video")?;
        let progress = build.child(&stage, "div", "progress")?;
        let progress_bar = build.child(&progress, "div", "progress-bar")?;

        let start_screen = build.child(&stage, "div", "start-screen")?;
        let start_title = build.child(&start_screen, "h2", "start-title")?;
        let start_description = build.child(&start_screen, "p", "start-description")?;
        let start_button = build.button(&start_screen, "start", "Start")?;

        let overlay = build.child(&root, "div", "overlay")?;
        let fields = build.child(&root, "form", "fields")?;
        let message = build.child(&root, "p", "message")?;
        let actions = build.child(&root, "div", "actions")?;
        let confirm_button = build.button(&actions, "confirm", "Next")?;
        let resume_button = build.button(&actions, "resume", "Resume")?;

        let results = build.child(&root, "section", "results")?;
        let results_heading = build.child(&results, "h2", "results-heading")?;
        let results_list = build.child(&results, "ul", "results-list")?;
        let results_note = build.child(&results, "p", "results-note")?;
        let send_button = build.button(&results, "send", "Send to LINE")?;

        let reset_button = build.button(&root, "reset", "Start over")?;

        Ok(Self {
            document: document.clone(),
            root,
            title,
            video_host,
            progress_bar,
            start_screen,
            start_title,
            start_description,
            start_button,
            overlay,
            fields,
            rows: Vec::new(),
            message,
            confirm_button,
            resume_button,
            results,
            results_heading,
            results_list,
            results_note,
            send_button,
            reset_button,
            focused: None,
        })
    }

    /// Replaces everything under `root` with a static error panel.
    pub fn render_error(document: &Document, root: &HtmlElement, message: &str) -> Result<(), JsValue> {
        root.set_text_content(None);
        let build = Builder { document };
        let panel = build.child(root, "div", "error-screen")?;
        let heading = build.child(&panel, "h2", "error-title")?;
        heading.set_text_content(Some("This worksheet could not be loaded"));
        let detail = build.child(&panel, "p", "error-detail")?;
        detail.set_text_content(Some(message));
        Ok(())
    }

    /// Where the playback backend draws or embeds its video.
    #[must_use]
    pub fn video_host(&self) -> &HtmlElement {
        &self.video_host
    }

    /// The form holding the field inputs. Input events bubble here; each
    /// input carries its field id in [`FIELD_ATTR`].
    #[must_use]
    pub fn fields(&self) -> &HtmlElement {
        &self.fields
    }

    /// The start button.
    #[must_use]
    pub fn start_button(&self) -> &HtmlElement {
        &self.start_button
    }

    /// The confirm ("Next") button.
    #[must_use]
    pub fn confirm_button(&self) -> &HtmlElement {
        &self.confirm_button
    }

    /// The resume button shown after a restore.
    #[must_use]
    pub fn resume_button(&self) -> &HtmlElement {
        &self.resume_button
    }

    /// The send-to-chat button.
    #[must_use]
    pub fn send_button(&self) -> &HtmlElement {
        &self.send_button
    }

    /// The reset button.
    #[must_use]
    pub fn reset_button(&self) -> &HtmlElement {
        &self.reset_button
    }

    /// Applies `view` to the DOM.
    pub fn render(&mut self, view: &WorksheetView) -> Result<(), JsValue> {
        set_text(&self.title, &view.title);
        if !view.accent.trim().is_empty() {
            self.root.style().set_property("--accent", &view.accent)?;
        }
        self.progress_bar
            .style()
            .set_property("width", &progress_width(view.progress))?;

        self.start_screen.set_hidden(view.start_screen.is_none());
        if let Some(start) = &view.start_screen {
            set_text(&self.start_title, &start.title);
            set_text(&self.start_description, &start.description);
        }

        self.overlay.set_hidden(!view.overlay);
        self.sync_rows(&view.fields)?;
        for (row, field) in self.rows.iter().zip(&view.fields) {
            row.apply(field);
        }
        self.focus_spotlight(view);

        let message = view.message.as_deref().unwrap_or("");
        set_text(&self.message, message);
        self.message.set_hidden(message.is_empty());

        self.confirm_button.set_hidden(!view.confirm_visible);
        self.resume_button.set_hidden(!view.resume_visible);
        self.reset_button.set_hidden(view.start_screen.is_some());

        match &view.results {
            Some(results) => {
                self.render_results(results)?;
                self.results.set_hidden(false);
            }
            None => self.results.set_hidden(true),
        }
        Ok(())
    }

    fn sync_rows(&mut self, fields: &[FieldView]) -> Result<(), JsValue> {
        let same = self.rows.len() == fields.len()
            && self.rows.iter().zip(fields).all(|(row, field)| row.id == field.id);
        if same {
            return Ok(());
        }
        for row in self.rows.drain(..) {
            row.row.remove();
        }
        let build = Builder {
            document: &self.document,
        };
        for field in fields {
            self.rows.push(FieldRow::new(&build, &self.fields, field)?);
        }
        Ok(())
    }

    fn focus_spotlight(&mut self, view: &WorksheetView) {
        let spotlight = view.spotlight().map(|f| f.id.clone());
        if spotlight != self.focused {
            if let Some(id) = &spotlight
                && let Some(row) = self.rows.iter().find(|r| &r.id == id)
            {
                let _ = row.input.focus();
            }
            self.focused = spotlight;
        }
    }

    fn render_results(&self, results: &ResultsView) -> Result<(), JsValue> {
        set_text(&self.results_heading, &results.heading);
        self.results_list.set_text_content(None);
        let build = Builder {
            document: &self.document,
        };
        for item in &results.items {
            let li = build.child(&self.results_list, "li", if item.is_main { "result main" } else { "result" })?;
            let label = build.child(&li, "span", "result-label")?;
            label.set_text_content(Some(&item.label));
            let value = build.child(&li, "span", "result-value")?;
            value.set_text_content(Some(&format!("{}{}", item.value, item.unit)));
        }
        set_text(&self.results_note, &results.note);
        self.results_note.set_hidden(results.note.trim().is_empty());
        Ok(())
    }
}

impl FieldRow {
    fn new(build: &Builder<'_>, parent: &HtmlElement, field: &FieldView) -> Result<Self, JsValue> {
        let row = build.child(parent, "div", &row_class(field.status))?;
        let step_label = build.child(&row, "span", "step-label")?;
        let label = build.child(&row, "label", "label")?;
        let line = build.child(&row, "div", "input-line")?;
        let input: HtmlInputElement = build.element("input", "input")?.unchecked_into();
        input.set_type(input_type(field.kind));
        if field.kind == FieldKind::Number {
            input.set_attribute("inputmode", "decimal")?;
        }
        input.set_attribute(FIELD_ATTR, &field.id)?;
        input.set_id(&format!("field-{}", field.id));
        label.set_attribute("for", &input.id())?;
        line.append_child(&input)?;
        let unit = build.child(&line, "span", "unit")?;
        let prompt = build.child(&row, "p", "prompt")?;
        Ok(Self {
            id: field.id.clone(),
            row,
            step_label,
            label,
            input,
            unit,
            prompt,
        })
    }

    fn apply(&self, field: &FieldView) {
        let class = row_class(field.status);
        if self.row.class_name() != class {
            self.row.set_class_name(&class);
        }
        set_text(&self.step_label, &field.step_label);
        set_text(&self.label, &field.label);
        set_text(&self.unit, &field.unit);
        let prompt = field.prompt.as_deref().unwrap_or("");
        set_text(&self.prompt, prompt);
        self.prompt.set_hidden(prompt.is_empty());

        self.input.set_disabled(field.status != FieldStatus::Spotlight);
        if self.input.placeholder() != field.placeholder {
            self.input.set_placeholder(&field.placeholder);
        }
        if self.input.value() != field.value {
            self.input.set_value(&field.value);
        }
    }
}

struct Builder<'a> {
    document: &'a Document,
}

impl Builder<'_> {
    fn element(&self, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
        let el: HtmlElement = self.document.create_element(tag)?.unchecked_into();
        el.set_class_name(class);
        Ok(el)
    }

    fn child(&self, parent: &HtmlElement, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
        let el = self.element(tag, class)?;
        parent.append_child(&el)?;
        Ok(el)
    }

    fn button(&self, parent: &HtmlElement, class: &str, text: &str) -> Result<HtmlElement, JsValue> {
        let el = self.child(parent, "button", class)?;
        el.set_attribute("type", "button")?;
        el.set_text_content(Some(text));
        Ok(el)
    }
}

fn set_text(el: &HtmlElement, text: &str) {
    if el.text_content().as_deref() != Some(text) {
        el.set_text_content(Some(text));
    }
}

fn row_class(status: FieldStatus) -> String {
    format!("field {}", status.class())
}

fn input_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Number => "number",
        FieldKind::Text => "text",
    }
}

fn progress_width(progress: f64) -> String {
    let percent = if progress.is_finite() {
        (progress * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    format!("{percent:.1}%")
}
