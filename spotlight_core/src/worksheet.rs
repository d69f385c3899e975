// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The validated, immutable form of a course.

use crate::course::{FormulaStep, UiText, VideoSource};
use crate::field::FieldDefinition;
use crate::persist;
use crate::timeline::Timeline;

/// Everything the controller needs from a course, checked once at load.
///
/// Built by [`Course::compile`](crate::course::Course::compile).
#[derive(Clone, Debug)]
pub struct Worksheet {
    /// Course name.
    pub name: String,
    /// Course slug.
    pub slug: String,
    /// LINE front-end app id, empty when messaging is not configured.
    pub liff_id: String,
    /// Fields sorted by display order.
    pub fields: Vec<FieldDefinition>,
    /// Pause points.
    pub timeline: Timeline,
    /// Results chain in evaluation order.
    pub steps: Vec<FormulaStep>,
    /// Footnote for results.
    pub note: String,
    /// Expected video length in seconds.
    pub duration: f64,
    /// Video source, `None` for the canvas mock.
    pub video: Option<VideoSource>,
    /// Text overrides.
    pub ui: UiText,
}

impl Worksheet {
    /// Looks up a field by id.
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Number of pause points.
    #[must_use]
    pub fn total_steps(&self) -> u32 {
        self.timeline.len()
    }

    /// Local storage key for this course's snapshot.
    #[must_use]
    pub fn storage_key(&self) -> String {
        persist::storage_key(&self.slug)
    }

    /// Heading for results and outbound summaries, falling back through the
    /// worksheet title to the course name.
    #[must_use]
    pub fn result_heading(&self) -> &str {
        [&self.ui.result_title, &self.ui.title, &self.name]
            .into_iter()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or("Results")
    }
}
