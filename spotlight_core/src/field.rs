// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Form field definitions and the values they hold.

use core::fmt;

use serde::{Deserialize, Serialize};

/// What kind of input a field accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// A finite number greater than zero.
    #[default]
    Number,
    /// Any non-blank text.
    Text,
}

impl FieldKind {
    /// Parses raw input into a value, or `None` when it fails the field's
    /// validation predicate.
    ///
    /// Numbers must parse to a finite value `> 0`; text must be non-empty
    /// after trimming.
    #[must_use]
    pub fn parse(self, raw: &str) -> Option<FieldValue> {
        let raw = raw.trim();
        match self {
            Self::Number => {
                let n: f64 = raw.parse().ok()?;
                (n.is_finite() && n > 0.0).then_some(FieldValue::Number(n))
            }
            Self::Text => (!raw.is_empty()).then(|| FieldValue::Text(raw.into())),
        }
    }

    /// Returns `true` if `value` is acceptable for this kind.
    #[must_use]
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (Self::Number, FieldValue::Number(n)) => n.is_finite() && *n > 0.0,
            (Self::Text, FieldValue::Text(s)) => !s.trim().is_empty(),
            _ => false,
        }
    }
}

/// A committed field value.
///
/// Serialized untagged, so numeric fields keep the plain
/// `{"income": 500}` snapshot shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric input.
    Number(f64),
    /// Text input.
    Text(String),
}

impl FieldValue {
    /// Numeric view used by the formula engine. Text reads as `0`.
    #[must_use]
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(_) => 0.0,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One input on the worksheet form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDefinition {
    /// Unique id, also the variable name formulas use.
    pub id: String,
    /// Label shown next to the input.
    pub label: String,
    /// Short label shown in the step header (e.g. "① Income").
    pub step_label: String,
    /// Input kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Unit suffix (e.g. "万円").
    pub unit: String,
    /// Placeholder text.
    pub placeholder: String,
    /// Display order, 1-based.
    pub order: u32,
}
