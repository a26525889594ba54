// tests/attempt_flow_tests.rs

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use quiz_attempt::{
    attempt::{AttemptRunner, SelectOutcome},
    error::GatewayError,
    gateway::AttemptBackend,
    models::{
        answer::{AnswerEntry, SubmissionRequest, SubmitAttemptRequest},
        definition::{AttemptEnvelope, OptionKey, Question, QuizDefinition, QuizSettings},
        result::ScoreResult,
        view::{AttemptFailure, AttemptStatus},
    },
};
use tokio::time::sleep;

const TOKEN: &str = "learner-token";

/// In-memory backend. Grades every answer against the key "A".
#[derive(Default)]
struct ScriptedBackend {
    envelope: Option<AttemptEnvelope>,
    fetch_error: Option<GatewayError>,
    submit_errors: Mutex<VecDeque<GatewayError>>,
    submissions: Mutex<Vec<SubmissionRequest>>,
    tokens: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn serving(envelope: AttemptEnvelope) -> Self {
        Self {
            envelope: Some(envelope),
            ..Default::default()
        }
    }

    fn failing_fetch(error: GatewayError) -> Self {
        Self {
            fetch_error: Some(error),
            ..Default::default()
        }
    }

    fn fail_next_submit(&self, error: GatewayError) {
        self.submit_errors.lock().unwrap().push_back(error);
    }

    fn submissions(&self) -> Vec<SubmissionRequest> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttemptBackend for ScriptedBackend {
    async fn fetch_attempt(
        &self,
        attempt_id: &str,
        token: &str,
    ) -> Result<AttemptEnvelope, GatewayError> {
        self.tokens.lock().unwrap().push(token.to_string());
        if let Some(error) = &self.fetch_error {
            return Err(error.clone());
        }
        self.envelope
            .clone()
            .ok_or_else(|| GatewayError::Status(404, format!("attempt {} not found", attempt_id)))
    }

    async fn submit_attempt(
        &self,
        request: &SubmissionRequest,
        token: &str,
    ) -> Result<ScoreResult, GatewayError> {
        self.tokens.lock().unwrap().push(token.to_string());
        self.submissions.lock().unwrap().push(request.clone());
        if let Some(error) = self.submit_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        let total = request.body.answers.len() as u32;
        let correct = request
            .body
            .answers
            .iter()
            .filter(|a| a.selected_option == Some(OptionKey::A))
            .count() as u32;
        Ok(ScoreResult {
            obtained_score: correct,
            total_possible: total,
            percentage: if total == 0 {
                0.0
            } else {
                correct as f64 * 100.0 / total as f64
            },
            correct_count: correct,
            wrong_count: total - correct,
        })
    }
}

fn definition(questions: u32, minutes: u32) -> QuizDefinition {
    QuizDefinition {
        id: "quiz-7".to_string(),
        title: "Closures and iterators".to_string(),
        description: String::new(),
        questions: (1..=questions)
            .map(|n| Question {
                question_number: n,
                question_text: format!("Question {}", n),
                options: OptionKey::ALL
                    .iter()
                    .map(|k| (*k, format!("Choice {}", k)))
                    .collect(),
                points: 1,
            })
            .collect(),
        settings: QuizSettings {
            time_limit_minutes: minutes,
            max_attempts: 2,
            show_results: true,
        },
    }
}

async fn loaded_runner(questions: u32, minutes: u32) -> (Arc<ScriptedBackend>, AttemptRunner) {
    let backend = Arc::new(ScriptedBackend::serving(AttemptEnvelope::quiz(
        "attempt-1",
        definition(questions, minutes),
    )));
    let runner = AttemptRunner::new("attempt-1", backend.clone(), TOKEN);
    assert_eq!(runner.load().await, AttemptStatus::Active);
    (backend, runner)
}

fn answer(question_number: u32, selected_option: Option<OptionKey>) -> AnswerEntry {
    AnswerEntry {
        question_number,
        selected_option,
    }
}

#[tokio::test(start_paused = true)]
async fn manual_submit_sends_answers_and_elapsed_time() {
    let (backend, runner) = loaded_runner(3, 1).await;

    assert_eq!(runner.select(1, OptionKey::B), SelectOutcome::Recorded);
    assert_eq!(runner.select(2, OptionKey::A), SelectOutcome::Recorded);

    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(runner.time_remaining_seconds(), 50);

    assert!(runner.submit().await);
    assert_eq!(runner.status(), AttemptStatus::Submitted);

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0],
        SubmissionRequest {
            attempt_id: "attempt-1".to_string(),
            body: SubmitAttemptRequest {
                answers: vec![
                    answer(1, Some(OptionKey::B)),
                    answer(2, Some(OptionKey::A)),
                    answer(3, None),
                ],
                time_taken_seconds: 10,
            },
        }
    );
    assert!(backend.tokens.lock().unwrap().iter().all(|t| t == TOKEN));

    let result = runner.result().unwrap().unwrap();
    assert_eq!(result.correct_count, 1);
    assert_eq!(result.wrong_count, 2);
    assert_eq!(result.percentage_label, "33.33%");
}

#[tokio::test(start_paused = true)]
async fn expiry_auto_submits_with_full_time() {
    let (backend, runner) = loaded_runner(3, 1).await;
    runner.select(3, OptionKey::C);

    sleep(Duration::from_millis(59_500)).await;
    assert_eq!(runner.status(), AttemptStatus::Active);
    assert!(backend.submissions().is_empty());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(runner.status(), AttemptStatus::Submitted);
    assert_eq!(runner.time_remaining_seconds(), 0);
    assert!(!runner.timer_running());

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].body.time_taken_seconds, 60);
    assert_eq!(
        submissions[0].body.answers,
        vec![answer(1, None), answer(2, None), answer(3, Some(OptionKey::C))]
    );

    // A late click is a no-op.
    assert!(!runner.submit().await);
    assert_eq!(backend.submissions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn submit_racing_expiry_calls_backend_once() {
    let (backend, runner) = loaded_runner(3, 1).await;
    runner.select(1, OptionKey::A);

    // Wakes at the same instant as the 60th tick.
    sleep(Duration::from_secs(60)).await;
    runner.submit().await;
    sleep(Duration::from_secs(2)).await;

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    assert!((59..=60).contains(&submissions[0].body.time_taken_seconds));
    assert_eq!(runner.status(), AttemptStatus::Submitted);
}

#[tokio::test(start_paused = true)]
async fn concurrent_manual_submits_call_backend_once() {
    let (backend, runner) = loaded_runner(2, 1).await;

    let (first, second) = tokio::join!(runner.submit(), runner.submit());
    assert!(first ^ second);
    assert_eq!(backend.submissions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn submission_failure_freezes_attempt_until_manual_retry() {
    let (backend, runner) = loaded_runner(3, 1).await;
    backend.fail_next_submit(GatewayError::Status(502, "scoring unavailable".to_string()));

    runner.select(1, OptionKey::A);
    runner.select(2, OptionKey::D);
    sleep(Duration::from_millis(5_500)).await;

    assert!(runner.submit().await);
    assert_eq!(runner.status(), AttemptStatus::Error);
    let view = runner.snapshot(60);
    match view.failure {
        Some(AttemptFailure::SubmissionFailure(reason)) => assert!(reason.contains("502")),
        other => panic!("unexpected failure: {:?}", other),
    }
    assert!(view.result.is_none());
    assert_eq!(
        runner.answers(),
        vec![
            answer(1, Some(OptionKey::A)),
            answer(2, Some(OptionKey::D)),
            answer(3, None)
        ]
    );
    assert!(!runner.timer_running());

    // The clock is frozen; no expiry fires later and answers stay locked.
    sleep(Duration::from_secs(120)).await;
    assert_eq!(runner.status(), AttemptStatus::Error);
    assert_eq!(runner.time_remaining_seconds(), 55);
    assert_eq!(
        runner.select(3, OptionKey::B),
        SelectOutcome::Rejected(AttemptStatus::Error)
    );
    assert_eq!(backend.submissions().len(), 1);

    runner.retry().await.unwrap();
    assert_eq!(runner.status(), AttemptStatus::Submitted);

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0], submissions[1]);
    assert_eq!(submissions[1].body.time_taken_seconds, 5);

    assert!(runner.retry().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn unknown_question_is_ignored() {
    let (_backend, runner) = loaded_runner(3, 1).await;
    runner.select(2, OptionKey::B);
    let before = runner.answers();

    assert_eq!(runner.select(99, OptionKey::A), SelectOutcome::UnknownQuestion);
    assert_eq!(runner.answers(), before);
    assert_eq!(runner.status(), AttemptStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn countdown_never_goes_backwards_or_below_zero() {
    let (_backend, runner) = loaded_runner(1, 1).await;

    let mut last = runner.time_remaining_seconds();
    assert_eq!(last, 60);
    for _ in 0..70 {
        sleep(Duration::from_secs(1)).await;
        let now = runner.time_remaining_seconds();
        assert!(now <= last);
        last = now;
    }
    assert_eq!(last, 0);
    assert_eq!(runner.status(), AttemptStatus::Submitted);
}

#[tokio::test(start_paused = true)]
async fn load_failure_is_terminal() {
    let backend = Arc::new(ScriptedBackend::failing_fetch(GatewayError::Status(
        404,
        "Attempt not found".to_string(),
    )));
    let runner = AttemptRunner::new("attempt-404", backend.clone(), TOKEN);

    assert_eq!(runner.load().await, AttemptStatus::Error);
    assert!(runner.load_failed());
    match runner.snapshot(60).failure {
        Some(AttemptFailure::LoadFailure(reason)) => assert!(reason.contains("Attempt not found")),
        other => panic!("unexpected failure: {:?}", other),
    }

    assert!(!runner.submit().await);
    assert!(runner.retry().await.is_err());
    assert!(!runner.timer_running());
    assert!(backend.submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn envelope_for_another_attempt_is_a_load_failure() {
    let backend = Arc::new(ScriptedBackend::serving(AttemptEnvelope::quiz(
        "attempt-2",
        definition(2, 1),
    )));
    let runner = AttemptRunner::new("attempt-1", backend, TOKEN);

    assert_eq!(runner.load().await, AttemptStatus::Error);
    assert!(runner.load_failed());
}

#[tokio::test(start_paused = true)]
async fn unmount_stops_the_countdown() {
    let (backend, runner) = loaded_runner(2, 1).await;
    sleep(Duration::from_millis(3_500)).await;

    runner.unmount();
    assert!(!runner.timer_running());

    sleep(Duration::from_secs(120)).await;
    assert_eq!(runner.time_remaining_seconds(), 57);
    assert_eq!(runner.status(), AttemptStatus::Active);
    assert!(backend.submissions().is_empty());
}
