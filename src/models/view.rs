// src/models/view.rs

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::definition::{AssessmentKind, OptionKey};

/// Lifecycle of an attempt. Transitions only move forward, except the
/// manual retry path ERROR(SubmissionFailure) -> SUBMITTING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Loading,
    Active,
    Submitting,
    Submitted,
    Error,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Submitted | AttemptStatus::Error)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptStatus::Loading => "LOADING",
            AttemptStatus::Active => "ACTIVE",
            AttemptStatus::Submitting => "SUBMITTING",
            AttemptStatus::Submitted => "SUBMITTED",
            AttemptStatus::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Why an attempt ended in ERROR. Serialized as `{"kind": ..., "reason": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptFailure {
    LoadFailure(String),
    SubmissionFailure(String),
}

impl AttemptFailure {
    pub fn reason(&self) -> &str {
        match self {
            AttemptFailure::LoadFailure(reason) | AttemptFailure::SubmissionFailure(reason) => reason,
        }
    }
}

/// Display data derived from a backend score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub obtained_score: u32,
    pub total_possible: u32,
    pub percentage: f64,
    pub percentage_label: String,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub graded_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub question_number: u32,
    pub question_text: String,
    pub options: BTreeMap<OptionKey, String>,
    pub points: u32,
    pub selected_option: Option<OptionKey>,
}

/// Everything the host UI needs to render the attempt screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptView {
    pub attempt_id: String,
    pub kind: Option<AssessmentKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: AttemptStatus,
    pub failure: Option<AttemptFailure>,
    pub time_limit_seconds: u32,
    pub time_remaining_seconds: u32,
    pub clock: String,
    pub low_time: bool,
    pub progress_percent: u8,
    pub answered_count: usize,
    pub total_questions: usize,
    pub max_attempts: Option<u32>,
    pub questions: Vec<QuestionView>,
    pub submitted_at: Option<DateTime<Utc>>,
    /// Present once SUBMITTED, unless the definition hides results.
    pub result: Option<ScoreBreakdown>,
}
