// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in courses, available without a course database.

use crate::course::{Calculation, Course, CourseStatus, FormulaStep, TimelineCue, UiText};
use crate::field::{FieldDefinition, FieldKind};

/// Slug of [`budget_course`].
pub const BUDGET_SLUG: &str = "budget";

/// Looks up a built-in course by slug.
#[must_use]
pub fn by_slug(slug: &str) -> Option<Course> {
    (slug == BUDGET_SLUG).then(budget_course)
}

/// The housing budget simulator.
///
/// A 20 second mock video pauses four times to collect income, rent,
/// savings, and a reserve (all in 万円), then estimates the loan principal a
/// safe monthly payment supports over 35 years at 1.5%.
#[must_use]
pub fn budget_course() -> Course {
    let fields = [
        ("income", "Annual income (before tax)", "e.g. 500"),
        ("rent", "Current rent per month", "e.g. 10"),
        ("savings", "Monthly savings", "e.g. 5"),
        ("reserve", "Monthly reserve to keep aside", "e.g. 3"),
    ];
    let prompts = [
        (3.0, "Enter your annual income before tax"),
        (8.0, "Enter your current monthly rent"),
        (13.0, "Enter how much you save each month"),
        (18.0, "Enter the reserve you want to keep each month"),
    ];

    Course {
        name: "Housing budget simulator".into(),
        slug: BUDGET_SLUG.into(),
        description: "Estimate a safe housing budget while watching a short video.".into(),
        liff_id: String::new(),
        status: CourseStatus::Published,
        fields: fields
            .iter()
            .zip(1_u32..)
            .map(|(&(id, label, placeholder), order)| FieldDefinition {
                id: id.into(),
                label: label.into(),
                step_label: format!("Step {order}"),
                kind: FieldKind::Number,
                unit: "万円".into(),
                placeholder: placeholder.into(),
                order,
            })
            .collect(),
        timeline: fields
            .iter()
            .zip(prompts)
            .map(|(&(id, ..), (pause_at, prompt))| TimelineCue {
                pause_at,
                field_id: id.into(),
                prompt: prompt.into(),
            })
            .collect(),
        calculation: Calculation {
            steps: vec![
                FormulaStep {
                    id: "safeMonthlyPayment".into(),
                    label: "Safe monthly payment".into(),
                    formula: "(rent + savings) - reserve".into(),
                    unit: "万円".into(),
                    ..FormulaStep::default()
                },
                FormulaStep {
                    id: "totalBudget".into(),
                    label: "Estimated housing budget".into(),
                    formula: "round(loanReverse(safeMonthlyPayment, 1.5, 35))".into(),
                    unit: "万円".into(),
                    is_main: true,
                    ..FormulaStep::default()
                },
            ],
            note: "35-year loan at 1.5% interest".into(),
        },
        video: None,
        ui: UiText {
            start_screen_title: "Find your housing budget".into(),
            start_screen_description: "Watch the video and answer four quick questions.".into(),
            title: "Housing budget simulator".into(),
            result_title: "Your housing budget".into(),
            primary_color: "#e8673c".into(),
        },
    }
}
