// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The course document: one worksheet configuration.
//!
//! Courses arrive either as a built-in [`preset`](crate::preset) or as a JSON
//! document fetched by slug. Keys are camelCase to match the stored
//! documents. Every field is optional on the wire; [`Course::compile`] is
//! where structure is enforced.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::FieldDefinition;
use crate::formula::Formula;
use crate::timeline::Timeline;
use crate::worksheet::Worksheet;

/// Seconds of mock video after the last pause point when the course has no
/// video of its own.
pub const MOCK_TAIL_SECONDS: f64 = 2.0;

/// Errors that stop a course from loading. Each one maps to the static error
/// screen; none are retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No course exists for the requested slug.
    #[error("course `{0}` was not found")]
    NotFound(String),
    /// The course is a draft and preview mode is off.
    #[error("course `{0}` is not published")]
    Unpublished(String),
    /// The document is not valid JSON for a course.
    #[error("malformed course document: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The timeline has no pause points.
    #[error("the timeline has no pause points")]
    EmptyTimeline,
    /// A pause time is negative or not a number.
    #[error("pause point for `{field_id}` has invalid time {pause_at}")]
    InvalidPause {
        /// Field the cue points at.
        field_id: String,
        /// The rejected time.
        pause_at: f64,
    },
    /// Two fields share an id.
    #[error("field id `{0}` is defined more than once")]
    DuplicateField(String),
    /// A pause point references a field that does not exist.
    #[error("pause point references unknown field `{0}`")]
    UnknownField(String),
    /// Two pause points unlock the same field.
    #[error("field `{0}` is unlocked by more than one pause point")]
    DuplicateCue(String),
    /// Two formula steps share an id.
    #[error("formula step id `{0}` is defined more than once")]
    DuplicateStep(String),
}

/// Publication state of a course.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    /// Visible only with `preview=1`.
    #[default]
    Draft,
    /// Visible to everyone.
    Published,
}

/// A pause point as authored: no step number yet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineCue {
    /// Video time in seconds.
    pub pause_at: f64,
    /// Field unlocked at this pause.
    pub field_id: String,
    /// Prompt text.
    pub prompt: String,
}

/// One named computation in the results chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormulaStep {
    /// Result id, usable as a variable by later steps.
    pub id: String,
    /// Label shown with the result.
    pub label: String,
    /// Arithmetic expression.
    pub formula: String,
    /// Unit suffix.
    pub unit: String,
    /// Whether the result is shown.
    pub display: bool,
    /// Whether the result is the emphasized one.
    pub is_main: bool,
}

impl Default for FormulaStep {
    fn default() -> Self {
        Self {
            id: String::new(),
            label: String::new(),
            formula: String::new(),
            unit: String::new(),
            display: true,
            is_main: false,
        }
    }
}

/// The results chain plus its footnote.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Calculation {
    /// Steps in evaluation order.
    pub steps: Vec<FormulaStep>,
    /// Footnote shown under results (e.g. loan assumptions).
    pub note: String,
}

/// Uploaded or linked video.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSource {
    /// Media URL or a YouTube page URL.
    pub download_url: String,
    /// Duration in seconds, `0` when unknown.
    pub duration: f64,
}

/// Text and color overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiText {
    /// Start screen heading.
    pub start_screen_title: String,
    /// Start screen body.
    pub start_screen_description: String,
    /// Worksheet heading.
    pub title: String,
    /// Results heading.
    pub result_title: String,
    /// Accent color, CSS syntax.
    pub primary_color: String,
}

/// A course document as stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    /// Display name.
    pub name: String,
    /// URL slug; also namespaces the local snapshot.
    pub slug: String,
    /// Free-form description.
    pub description: String,
    /// LINE front-end app id used for outbound messages.
    pub liff_id: String,
    /// Publication state.
    pub status: CourseStatus,
    /// Form fields.
    pub fields: Vec<FieldDefinition>,
    /// Pause points, in any order.
    pub timeline: Vec<TimelineCue>,
    /// Results chain.
    pub calculation: Calculation,
    /// Video, or `None` for the canvas mock.
    pub video: Option<VideoSource>,
    /// Text overrides.
    pub ui: UiText,
}

impl Course {
    /// Parses a course document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Publish gating: drafts load only in preview mode.
    pub fn check_access(&self, preview: bool) -> Result<(), ConfigError> {
        match self.status {
            CourseStatus::Published => Ok(()),
            CourseStatus::Draft if preview => Ok(()),
            CourseStatus::Draft => Err(ConfigError::Unpublished(self.slug.clone())),
        }
    }

    /// Validates the document and builds the runtime [`Worksheet`].
    ///
    /// Structural problems are errors. Suspicious but workable content
    /// (several main results, pauses past the end of the video, formulas
    /// that read a later step) is logged and loading continues.
    pub fn compile(&self) -> Result<Worksheet, ConfigError> {
        let mut field_ids = BTreeSet::new();
        for field in &self.fields {
            if !field_ids.insert(field.id.as_str()) {
                return Err(ConfigError::DuplicateField(field.id.clone()));
            }
        }

        let mut cued = BTreeSet::new();
        for cue in &self.timeline {
            if !field_ids.contains(cue.field_id.as_str()) {
                return Err(ConfigError::UnknownField(cue.field_id.clone()));
            }
            if !cued.insert(cue.field_id.as_str()) {
                return Err(ConfigError::DuplicateCue(cue.field_id.clone()));
            }
        }
        let timeline = Timeline::from_cues(&self.timeline)?;

        let mut step_ids = BTreeSet::new();
        for step in &self.calculation.steps {
            if !step_ids.insert(step.id.as_str()) {
                return Err(ConfigError::DuplicateStep(step.id.clone()));
            }
        }

        let mut fields = self.fields.clone();
        fields.sort_by_key(|f| f.order);

        let last_pause = timeline.entries().last().map_or(0.0, |e| e.pause_at);
        let duration = match &self.video {
            Some(video) if video.duration > 0.0 => video.duration,
            _ => last_pause + MOCK_TAIL_SECONDS,
        };

        self.warn_suspicious(&timeline, duration, &field_ids);

        Ok(Worksheet {
            name: self.name.clone(),
            slug: self.slug.clone(),
            liff_id: self.liff_id.clone(),
            fields,
            timeline,
            steps: self.calculation.steps.clone(),
            note: self.calculation.note.clone(),
            duration,
            video: self.video.clone().filter(|v| !v.download_url.trim().is_empty()),
            ui: self.ui.clone(),
        })
    }

    fn warn_suspicious(&self, timeline: &Timeline, duration: f64, field_ids: &BTreeSet<&str>) {
        let mains = self.calculation.steps.iter().filter(|s| s.is_main).count();
        if mains > 1 {
            tracing::warn!(slug = %self.slug, mains, "more than one formula step is marked main");
        }

        for entry in timeline.entries() {
            if entry.pause_at >= duration {
                tracing::warn!(
                    slug = %self.slug,
                    field = %entry.field_id,
                    pause_at = entry.pause_at,
                    duration,
                    "pause point is at or past the end of the video"
                );
            }
        }

        for field in &self.fields {
            if timeline.step_for_field(&field.id).is_none() {
                tracing::warn!(slug = %self.slug, field = %field.id, "field is never unlocked");
            }
        }

        let steps = &self.calculation.steps;
        for (idx, step) in steps.iter().enumerate() {
            let formula = match Formula::parse(&step.formula) {
                Ok(formula) => formula,
                Err(err) => {
                    tracing::warn!(step = %step.id, %err, "formula will evaluate to 0");
                    continue;
                }
            };
            for var in formula.variables() {
                let later = steps[idx + 1..].iter().any(|s| s.id == var);
                if later && !field_ids.contains(var) {
                    tracing::warn!(
                        step = %step.id,
                        variable = var,
                        "formula reads a later step; it will see 0"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    const DOC: &str = r#"{
        "name": "Budget",
        "slug": "budget",
        "status": "published",
        "fields": [
            {"id": "rent", "label": "Rent", "type": "number", "unit": "万円", "order": 2},
            {"id": "income", "label": "Income", "type": "number", "unit": "万円", "order": 1}
        ],
        "timeline": [
            {"pauseAt": 8, "fieldId": "rent", "prompt": "Rent?"},
            {"pauseAt": 3, "fieldId": "income", "prompt": "Income?"}
        ],
        "calculation": {
            "steps": [{"id": "total", "label": "Total", "formula": "income + rent", "isMain": true}],
            "note": "rough"
        },
        "video": null,
        "ui": {"title": "Budget sim"},
        "updatedAt": {"seconds": 1}
    }"#;

    #[test]
    fn parses_and_compiles() {
        let course = Course::from_json(DOC).unwrap();
        assert_eq!(course.status, CourseStatus::Published);
        assert!(course.calculation.steps[0].display, "display defaults to true");

        let sheet = course.compile().unwrap();
        assert_eq!(sheet.fields[0].id, "income", "fields sorted by order");
        assert_eq!(sheet.fields[0].kind, FieldKind::Number);
        assert_eq!(sheet.timeline.entry(1).unwrap().field_id, "income");
        assert_eq!(sheet.duration, 8.0 + MOCK_TAIL_SECONDS);
        assert!(sheet.video.is_none());
    }

    #[test]
    fn draft_needs_preview() {
        let mut course = Course::from_json(DOC).unwrap();
        course.status = CourseStatus::Draft;
        assert!(matches!(
            course.check_access(false),
            Err(ConfigError::Unpublished(slug)) if slug == "budget"
        ));
        assert!(course.check_access(true).is_ok());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let mut course = Course::from_json(DOC).unwrap();
        course.timeline[0].field_id = "bonus".into();
        assert!(matches!(course.compile(), Err(ConfigError::UnknownField(f)) if f == "bonus"));
    }

    #[test]
    fn duplicates_are_errors() {
        let mut course = Course::from_json(DOC).unwrap();
        course.fields[1].id = "rent".into();
        assert!(matches!(course.compile(), Err(ConfigError::DuplicateField(_))));

        let mut course = Course::from_json(DOC).unwrap();
        course.timeline[1].field_id = "rent".into();
        assert!(matches!(course.compile(), Err(ConfigError::DuplicateCue(_))));

        let mut course = Course::from_json(DOC).unwrap();
        let step = course.calculation.steps[0].clone();
        course.calculation.steps.push(step);
        assert!(matches!(course.compile(), Err(ConfigError::DuplicateStep(_))));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            Course::from_json("{\"fields\": 3}"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn video_duration_wins_over_mock_tail() {
        let mut course = Course::from_json(DOC).unwrap();
        course.video = Some(VideoSource {
            download_url: "https://cdn.example.com/a.mp4".into(),
            duration: 42.0,
        });
        let sheet = course.compile().unwrap();
        assert_eq!(sheet.duration, 42.0);
        assert!(sheet.video.is_some());
    }
}
