// src/attempt/presenter.rs

//! Pure display shaping for the countdown and the final score.

use crate::models::{result::ScoreResult, view::ScoreBreakdown};

/// Turns a backend score into display data. No side effects.
pub fn present(result: &ScoreResult) -> ScoreBreakdown {
    let percentage = if result.percentage.is_finite() {
        (result.percentage.clamp(0.0, 100.0) * 100.0).round() / 100.0
    } else {
        0.0
    };

    ScoreBreakdown {
        obtained_score: result.obtained_score,
        total_possible: result.total_possible,
        percentage,
        percentage_label: format!("{:.2}%", percentage),
        correct_count: result.correct_count,
        wrong_count: result.wrong_count,
        graded_count: result.correct_count.saturating_add(result.wrong_count),
    }
}

/// `MM:SS` rendering of the remaining time. Minutes are not capped at 59.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
