// src/models/definition.rs

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Option key of a multiple-choice question. Every question carries all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(alias = "d")]
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        };
        f.write_str(key)
    }
}

/// Whether the attempt screen is a quiz or a daily assignment. Both run the same flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Quiz,
    Assignment,
}

/// A student-facing question. The correct option is never part of this payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Question {
    /// 1-based, dense and unique within a definition.
    #[validate(range(min = 1))]
    pub question_number: u32,

    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,

    /// Option key to option text. Exactly A, B, C and D.
    #[validate(custom(function = validate_options))]
    pub options: BTreeMap<OptionKey, String>,

    #[validate(range(min = 1))]
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizSettings {
    #[validate(range(min = 1, max = 1440))]
    pub time_limit_minutes: u32,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_show_results")]
    pub show_results: bool,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_show_results() -> bool {
    true
}

impl QuizSettings {
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }
}

/// Quiz or assignment definition. Immutable once loaded into a running attempt.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizDefinition {
    pub id: String,

    #[validate(length(min = 1, max = 300))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,

    pub questions: Vec<Question>,

    pub settings: QuizSettings,
}

impl QuizDefinition {
    /// Full validation of a freshly fetched definition.
    ///
    /// * Field-level rules via `validator` on the definition, its settings and every question.
    /// * Question numbers must run 1, 2, 3, ... in payload order.
    pub fn validate_for_attempt(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        self.settings.validate().map_err(|e| e.to_string())?;

        for (index, question) in self.questions.iter().enumerate() {
            question
                .validate()
                .map_err(|e| format!("question {}: {}", question.question_number, e))?;

            let expected = index as u32 + 1;
            if question.question_number != expected {
                return Err(format!(
                    "question numbers must be dense and ordered: expected {}, found {}",
                    expected, question.question_number
                ));
            }
        }
        Ok(())
    }

    pub fn question_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.questions.iter().map(|q| q.question_number)
    }
}

fn validate_options(options: &BTreeMap<OptionKey, String>) -> Result<(), validator::ValidationError> {
    if options.len() != OptionKey::ALL.len() {
        return Err(validator::ValidationError::new("options_must_be_a_to_d"));
    }
    for text in options.values() {
        if text.trim().is_empty() {
            return Err(validator::ValidationError::new("option_text_empty"));
        }
        if text.len() > 1000 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Body of `GET /attempt/{attempt_id}` on the remote backend.
/// The definition arrives under `quiz` or `assignment` depending on the screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptEnvelope {
    pub attempt_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<QuizDefinition>,
}

impl AttemptEnvelope {
    pub fn quiz(attempt_id: impl Into<String>, definition: QuizDefinition) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            quiz: Some(definition),
            assignment: None,
        }
    }

    pub fn assignment(attempt_id: impl Into<String>, definition: QuizDefinition) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            quiz: None,
            assignment: Some(definition),
        }
    }

    /// Splits the envelope, checking it is for the attempt that was requested.
    pub fn into_definition(
        self,
        expected_attempt_id: &str,
    ) -> Result<(AssessmentKind, QuizDefinition), String> {
        if self.attempt_id != expected_attempt_id {
            return Err(format!(
                "backend returned attempt {} for {}",
                self.attempt_id, expected_attempt_id
            ));
        }
        match (self.quiz, self.assignment) {
            (Some(quiz), None) => Ok((AssessmentKind::Quiz, quiz)),
            (None, Some(assignment)) => Ok((AssessmentKind::Assignment, assignment)),
            (Some(_), Some(_)) => Err("envelope carries both a quiz and an assignment".to_string()),
            (None, None) => Err("envelope carries no definition".to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn question(number: u32) -> Question {
        Question {
            question_number: number,
            question_text: format!("Question {}", number),
            options: OptionKey::ALL
                .iter()
                .map(|k| (*k, format!("Option {}", k)))
                .collect(),
            points: 1,
        }
    }

    /// Definition with `count` questions and a time limit in minutes.
    pub fn definition(count: u32, minutes: u32) -> QuizDefinition {
        QuizDefinition {
            id: "quiz-1".to_string(),
            title: "Rust basics".to_string(),
            description: "Ownership and borrowing".to_string(),
            questions: (1..=count).map(question).collect(),
            settings: QuizSettings {
                time_limit_minutes: minutes,
                max_attempts: 1,
                show_results: true,
            },
        }
    }
}
