// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page launch parameters.
//!
//! `?course=<slug>` picks the course (the built-in budget course when
//! absent) and `preview=1` lets draft courses load. Slugs are limited to
//! ASCII letters, digits, `-`, and `_` so a course URL always stays inside
//! the course directory.

use url::{Url, form_urlencoded};

use crate::preset;

/// Parsed launch parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchParams {
    /// Requested course slug.
    pub course: String,
    /// Whether drafts may load.
    pub preview: bool,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            course: preset::BUDGET_SLUG.into(),
            preview: false,
        }
    }
}

impl LaunchParams {
    /// Parses a query string, with or without the leading `?`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "course" if !value.trim().is_empty() => {
                    let slug = value.trim();
                    if is_valid_slug(slug) {
                        slug.clone_into(&mut params.course);
                    } else {
                        tracing::warn!(slug, "ignoring malformed course slug");
                    }
                }
                "preview" => params.preview = value == "1",
                _ => {}
            }
        }
        params
    }

    /// URL of the course document under `base`, e.g.
    /// `https://host/courses/` + `budget.json`.
    ///
    /// A slug that is not a plain name is refused rather than resolved.
    pub fn course_url(&self, base: &Url) -> Result<Url, url::ParseError> {
        if !is_valid_slug(&self.course) {
            return Err(url::ParseError::RelativeUrlWithoutBase);
        }
        let mut url = base.join(&format!("{}.json", self.course))?;
        if self.preview {
            url.query_pairs_mut().append_pair("preview", "1");
        }
        Ok(url)
    }
}

/// Returns `true` for non-empty slugs made of `[A-Za-z0-9_-]`.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_budget_course() {
        assert_eq!(LaunchParams::from_query(""), LaunchParams::default());
        assert_eq!(LaunchParams::from_query("?course=").course, "budget");
    }

    #[test]
    fn reads_course_and_preview() {
        let params = LaunchParams::from_query("?course=first-home_2&preview=1&utm=x");
        assert_eq!(params.course, "first-home_2");
        assert!(params.preview);
        assert!(!LaunchParams::from_query("preview=true").preview);
    }

    #[test]
    fn course_url_is_relative_to_base() {
        let base = Url::parse("https://example.com/app/courses/").unwrap();
        let params = LaunchParams::from_query("course=starter&preview=1");
        assert_eq!(
            params.course_url(&base).unwrap().as_str(),
            "https://example.com/app/courses/starter.json?preview=1"
        );
    }

    #[test]
    fn slugs_cannot_leave_the_course_directory() {
        for query in [
            "course=https://evil.example/x",
            "course=//evil.example/x",
            "course=../../admin/secret",
            "course=first%20home",
            "course=a.b",
        ] {
            assert_eq!(LaunchParams::from_query(query).course, "budget", "{query}");
        }

        let base = Url::parse("https://app.example.com/courses/").unwrap();
        let forged = LaunchParams {
            course: "//evil.example/x".into(),
            preview: false,
        };
        assert!(forged.course_url(&base).is_err());
    }
}
