// src/models/result.rs

use serde::{Deserialize, Serialize};

/// Score computed by the remote backend. The client never derives it from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(rename = "obtained")]
    pub obtained_score: u32,

    #[serde(rename = "total")]
    pub total_possible: u32,

    pub percentage: f64,

    #[serde(rename = "correct")]
    pub correct_count: u32,

    #[serde(rename = "wrong")]
    pub wrong_count: u32,
}

impl ScoreResult {
    /// Rejects scores that cannot be right whatever the answer key was.
    pub fn check(&self) -> Result<(), String> {
        if self.obtained_score > self.total_possible {
            return Err(format!(
                "obtained score {} exceeds total {}",
                self.obtained_score, self.total_possible
            ));
        }
        if !self.percentage.is_finite() || !(0.0..=100.0).contains(&self.percentage) {
            return Err(format!("percentage {} is out of range", self.percentage));
        }
        Ok(())
    }
}

/// Body returned by `POST /attempt/{attempt_id}/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub score: ScoreResult,
}
