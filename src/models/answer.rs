// src/models/answer.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::definition::OptionKey;

/// One ledger slot. `selected_option` serializes as `null` while unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_number: u32,
    pub selected_option: Option<OptionKey>,
}

/// Body of `POST /attempt/{attempt_id}/submit` on the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerEntry>,
    pub time_taken_seconds: u32,
}

/// A submission captured at the ACTIVE -> SUBMITTING transition.
/// Manual retries resend exactly this value.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub attempt_id: String,
    pub body: SubmitAttemptRequest,
}

/// DTO for a host UI answer selection.
#[derive(Debug, Deserialize, Validate)]
pub struct SelectAnswerRequest {
    pub question_number: u32,

    #[validate(custom(function = validate_option_key))]
    pub option: String,
}

impl SelectAnswerRequest {
    pub fn option_key(&self) -> Option<OptionKey> {
        parse_option_key(&self.option)
    }
}

pub fn parse_option_key(raw: &str) -> Option<OptionKey> {
    match raw.trim() {
        "A" | "a" => Some(OptionKey::A),
        "B" | "b" => Some(OptionKey::B),
        "C" | "c" => Some(OptionKey::C),
        "D" | "d" => Some(OptionKey::D),
        _ => None,
    }
}

fn validate_option_key(option: &str) -> Result<(), validator::ValidationError> {
    if parse_option_key(option).is_none() {
        return Err(validator::ValidationError::new("option_must_be_a_to_d"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_answer_serializes_as_null() {
        let body = SubmitAttemptRequest {
            answers: vec![
                AnswerEntry {
                    question_number: 1,
                    selected_option: Some(OptionKey::B),
                },
                AnswerEntry {
                    question_number: 2,
                    selected_option: None,
                },
            ],
            time_taken_seconds: 42,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "answers": [
                    { "question_number": 1, "selected_option": "B" },
                    { "question_number": 2, "selected_option": null }
                ],
                "time_taken_seconds": 42
            })
        );
    }

    #[test]
    fn test_select_request_validation() {
        let ok = SelectAnswerRequest {
            question_number: 3,
            option: "c".to_string(),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.option_key(), Some(OptionKey::C));

        let bad = SelectAnswerRequest {
            question_number: 3,
            option: "E".to_string(),
        };
        assert!(bad.validate().is_err());
        assert_eq!(bad.option_key(), None);
    }
}
