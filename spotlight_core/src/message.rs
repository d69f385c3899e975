// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outbound result summaries.

use crate::formula::Results;
use crate::state::AppState;
use crate::view::format_number;
use crate::worksheet::Worksheet;

const RULE: &str = "========================";

/// Plain-text summary of a completed worksheet.
///
/// Heading, each field as `label: value`, each displayed result as
/// `▶ label: value`, then the calculation note. Units follow the value with
/// no space (`12万円`), as on screen.
#[must_use]
pub fn compose_summary(sheet: &Worksheet, state: &AppState, results: &Results) -> String {
    let mut lines = vec![format!("=== {} ===", sheet.result_heading()), String::new()];
    for field in &sheet.fields {
        let value = state
            .value(&field.id)
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".into());
        lines.push(format!("{}: {value}{}", field.label, field.unit));
    }
    lines.push(String::new());
    for result in results.displayed() {
        lines.push(format!(
            "▶ {}: {}{}",
            result.label,
            format_number(result.value),
            result.unit
        ));
    }
    if !sheet.note.trim().is_empty() {
        lines.push(String::new());
        lines.push(format!("※ {}", sheet.note));
    }
    lines.push(RULE.into());
    lines.join("\n")
}

/// How a send attempt ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Delivered to the chat.
    Sent,
    /// Not running inside the messaging client; the text is shown instead.
    NotEmbedded {
        /// The summary to copy by hand.
        text: String,
    },
    /// The messaging API refused.
    Failed {
        /// The summary to copy by hand.
        text: String,
        /// Error reported by the API.
        reason: String,
    },
}

impl SendOutcome {
    /// The alert text for this outcome.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Sent => "Your results were sent to the chat.".into(),
            Self::NotEmbedded { text } => {
                format!("Open this page in the LINE app to send your results to the chat.\n\n{text}")
            }
            Self::Failed { text, .. } => {
                format!("Sending failed. Please try again, or copy your results:\n\n{text}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::formula::evaluate_steps;
    use crate::preset;

    #[test]
    fn summary_lists_inputs_results_and_note_with_units_attached() {
        let sheet = preset::budget_course().compile().unwrap();
        let mut state = AppState::fresh(&sheet.fields);
        for (id, v) in [("income", 500.0), ("rent", 10.0), ("savings", 5.0), ("reserve", 3.0)] {
            state.inputs.insert(id.into(), Some(FieldValue::Number(v)));
        }
        let results = evaluate_steps(&sheet.steps, &state.environment());
        let text = compose_summary(&sheet, &state, &results);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=== Your housing budget ===");
        assert!(lines.contains(&"Current rent per month: 10万円"), "{text}");
        assert!(lines.contains(&"▶ Safe monthly payment: 12万円"), "{text}");
        assert!(lines.contains(&"▶ Estimated housing budget: 3,919万円"), "{text}");
        assert!(lines.contains(&"※ 35-year loan at 1.5% interest"), "{text}");
    }

    #[test]
    fn notices_carry_the_text_when_not_sent() {
        let failed = SendOutcome::Failed {
            text: "summary".into(),
            reason: "403".into(),
        };
        assert!(failed.notice().ends_with("summary"));
        assert!(SendOutcome::NotEmbedded { text: "s".into() }.notice().contains("LINE"));
        assert!(!SendOutcome::Sent.notice().is_empty());
    }
}
