// src/attempt/controller.rs

use chrono::{DateTime, Utc};

use crate::{
    attempt::{
        ledger::AnswerLedger,
        presenter::{format_clock, present},
        timer::Timer,
    },
    error::AttemptError,
    models::{
        answer::{SubmissionRequest, SubmitAttemptRequest},
        definition::{AssessmentKind, OptionKey, QuizDefinition},
        result::ScoreResult,
        view::{AttemptFailure, AttemptStatus, AttemptView, QuestionView},
    },
    utils::html::clean_html,
};

/// What started a submission. Not part of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Expiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Recorded,
    /// Question number not in the loaded definition. Ignored.
    UnknownQuestion,
    /// The attempt is no longer ACTIVE.
    Rejected(AttemptStatus),
}

/// State machine for one learner's attempt.
///
/// ```text
/// LOADING -> ACTIVE -> SUBMITTING -> SUBMITTED
///    |                    |    ^
///    v                    v    | manual retry
///  ERROR(load)      ERROR(submission)
/// ```
///
/// All mutation goes through the transition methods. The submit latch is set
/// synchronously in [`AttemptController::begin_submit`], so whichever trigger
/// arrives second gets `None` back and issues no request.
#[derive(Debug)]
pub struct AttemptController {
    attempt_id: String,
    status: AttemptStatus,
    kind: Option<AssessmentKind>,
    definition: Option<QuizDefinition>,
    ledger: AnswerLedger,
    time_limit_seconds: u32,
    time_remaining_seconds: u32,
    submit_latch: bool,
    trigger: Option<SubmitTrigger>,
    captured: Option<SubmissionRequest>,
    timer: Option<Timer>,
    failure: Option<AttemptFailure>,
    result: Option<ScoreResult>,
    submitted_at: Option<DateTime<Utc>>,
}

impl AttemptController {
    pub fn new(attempt_id: impl Into<String>) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            status: AttemptStatus::Loading,
            kind: None,
            definition: None,
            ledger: AnswerLedger::new(),
            time_limit_seconds: 0,
            time_remaining_seconds: 0,
            submit_latch: false,
            trigger: None,
            captured: None,
            timer: None,
            failure: None,
            result: None,
            submitted_at: None,
        }
    }

    /// LOADING -> ACTIVE. Returns the number of seconds the timer must start from.
    ///
    /// An invalid definition moves the attempt to ERROR(LoadFailure) instead.
    pub fn activate(
        &mut self,
        kind: AssessmentKind,
        definition: QuizDefinition,
    ) -> Result<u32, AttemptError> {
        self.expect_status(AttemptStatus::Loading, "activate")?;

        if let Err(reason) = definition.validate_for_attempt() {
            self.enter_error(AttemptFailure::LoadFailure(format!(
                "invalid definition: {}",
                reason
            )));
            return Err(AttemptError::InvalidDefinition(reason));
        }

        let limit = definition.settings.time_limit_seconds();
        self.ledger.initialize(definition.question_numbers());
        self.time_limit_seconds = limit;
        self.time_remaining_seconds = limit;
        self.kind = Some(kind);
        self.definition = Some(definition);
        self.status = AttemptStatus::Active;

        tracing::info!(
            attempt_id = %self.attempt_id,
            questions = self.ledger.total_count(),
            time_limit_seconds = limit,
            "Attempt active"
        );
        Ok(limit)
    }

    /// LOADING -> ERROR(LoadFailure).
    pub fn fail_load(&mut self, reason: impl Into<String>) -> Result<(), AttemptError> {
        self.expect_status(AttemptStatus::Loading, "fail load")?;
        let reason = reason.into();
        tracing::warn!(attempt_id = %self.attempt_id, "Attempt failed to load: {}", reason);
        self.enter_error(AttemptFailure::LoadFailure(reason));
        Ok(())
    }

    /// Hands the running timer to the controller so leaving ACTIVE can stop it.
    /// A timer attached outside ACTIVE is stopped immediately.
    pub fn attach_timer(&mut self, timer: Timer) {
        if self.status == AttemptStatus::Active {
            self.timer = Some(timer);
        } else {
            let mut timer = timer;
            timer.stop();
        }
    }

    /// Applies a countdown tick. Ignored outside ACTIVE and for values that would
    /// move the clock backwards.
    pub fn record_tick(&mut self, remaining: u32) -> bool {
        if self.status != AttemptStatus::Active || remaining > self.time_remaining_seconds {
            return false;
        }
        self.time_remaining_seconds = remaining;
        true
    }

    pub fn select(&mut self, question_number: u32, option: OptionKey) -> SelectOutcome {
        if self.status != AttemptStatus::Active {
            return SelectOutcome::Rejected(self.status);
        }
        if self.ledger.select(question_number, option) {
            SelectOutcome::Recorded
        } else {
            tracing::debug!(
                attempt_id = %self.attempt_id,
                question_number,
                "Ignoring selection for unknown question"
            );
            SelectOutcome::UnknownQuestion
        }
    }

    /// ACTIVE -> SUBMITTING, guarded by the single-fire latch.
    ///
    /// Captures the payload and the time taken at this moment, stops the timer,
    /// and returns the request to send. Returns `None` for every later call.
    pub fn begin_submit(&mut self, trigger: SubmitTrigger) -> Option<SubmissionRequest> {
        if self.submit_latch || self.status != AttemptStatus::Active {
            tracing::debug!(
                attempt_id = %self.attempt_id,
                ?trigger,
                status = %self.status,
                "Submit trigger ignored"
            );
            return None;
        }
        self.submit_latch = true;
        self.trigger = Some(trigger);
        self.stop_timer();
        self.status = AttemptStatus::Submitting;

        let request = SubmissionRequest {
            attempt_id: self.attempt_id.clone(),
            body: SubmitAttemptRequest {
                answers: self.ledger.to_submission_payload(),
                time_taken_seconds: self
                    .time_limit_seconds
                    .saturating_sub(self.time_remaining_seconds),
            },
        };
        self.captured = Some(request.clone());

        tracing::info!(
            attempt_id = %self.attempt_id,
            ?trigger,
            answered = self.ledger.answered_count(),
            time_taken_seconds = request.body.time_taken_seconds,
            "Submitting attempt"
        );
        Some(request)
    }

    /// ERROR(SubmissionFailure) -> SUBMITTING, resending the captured request.
    /// The latch stays set; nothing else can start a submission.
    pub fn retry_submission(&mut self) -> Result<SubmissionRequest, AttemptError> {
        let retryable = self.status == AttemptStatus::Error
            && matches!(self.failure, Some(AttemptFailure::SubmissionFailure(_)));
        let request = match (&self.captured, retryable) {
            (Some(request), true) => request.clone(),
            _ => {
                return Err(AttemptError::InvalidTransition {
                    from: self.status,
                    action: "retry submission",
                });
            }
        };

        self.failure = None;
        self.status = AttemptStatus::Submitting;
        tracing::info!(attempt_id = %self.attempt_id, "Retrying submission");
        Ok(request)
    }

    /// SUBMITTING -> SUBMITTED.
    pub fn complete(&mut self, result: ScoreResult) -> Result<(), AttemptError> {
        self.expect_status(AttemptStatus::Submitting, "complete submission")?;
        tracing::info!(
            attempt_id = %self.attempt_id,
            obtained = result.obtained_score,
            total = result.total_possible,
            "Attempt submitted"
        );
        self.result = Some(result);
        self.submitted_at.get_or_insert_with(Utc::now);
        self.status = AttemptStatus::Submitted;
        Ok(())
    }

    /// SUBMITTING -> ERROR(SubmissionFailure). The ledger stays as it was.
    pub fn fail_submission(&mut self, reason: impl Into<String>) -> Result<(), AttemptError> {
        self.expect_status(AttemptStatus::Submitting, "fail submission")?;
        let reason = reason.into();
        tracing::warn!(attempt_id = %self.attempt_id, "Submission failed: {}", reason);
        self.enter_error(AttemptFailure::SubmissionFailure(reason));
        Ok(())
    }

    /// Stops the timer when the host navigates away.
    pub fn unmount(&mut self) {
        self.stop_timer();
    }

    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn failure(&self) -> Option<&AttemptFailure> {
        self.failure.as_ref()
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    pub fn definition(&self) -> Option<&QuizDefinition> {
        self.definition.as_ref()
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    pub fn time_remaining_seconds(&self) -> u32 {
        self.time_remaining_seconds
    }

    pub fn trigger(&self) -> Option<SubmitTrigger> {
        self.trigger
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(Timer::is_running)
    }

    /// Whether the definition allows showing the score breakdown.
    pub fn shows_results(&self) -> bool {
        self.definition
            .as_ref()
            .is_none_or(|d| d.settings.show_results)
    }

    /// Host-facing snapshot. Display text is sanitized here.
    pub fn snapshot(&self, low_time_threshold_secs: u32) -> AttemptView {
        let questions = self
            .definition
            .iter()
            .flat_map(|d| d.questions.iter())
            .map(|q| QuestionView {
                question_number: q.question_number,
                question_text: clean_html(&q.question_text),
                options: q
                    .options
                    .iter()
                    .map(|(key, text)| (*key, clean_html(text)))
                    .collect(),
                points: q.points,
                selected_option: self.ledger.selected(q.question_number),
            })
            .collect();

        let result = match (&self.result, self.shows_results()) {
            (Some(result), true) => Some(present(result)),
            _ => None,
        };

        AttemptView {
            attempt_id: self.attempt_id.clone(),
            kind: self.kind,
            title: self.definition.as_ref().map(|d| clean_html(&d.title)),
            description: self.definition.as_ref().map(|d| clean_html(&d.description)),
            status: self.status,
            failure: self.failure.clone(),
            time_limit_seconds: self.time_limit_seconds,
            time_remaining_seconds: self.time_remaining_seconds,
            clock: format_clock(self.time_remaining_seconds),
            low_time: self.status == AttemptStatus::Active
                && self.time_remaining_seconds <= low_time_threshold_secs,
            progress_percent: self.ledger.progress_percent(),
            answered_count: self.ledger.answered_count(),
            total_questions: self.ledger.total_count(),
            max_attempts: self.definition.as_ref().map(|d| d.settings.max_attempts),
            questions,
            submitted_at: self.submitted_at,
            result,
        }
    }

    fn expect_status(
        &self,
        expected: AttemptStatus,
        action: &'static str,
    ) -> Result<(), AttemptError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(AttemptError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    fn enter_error(&mut self, failure: AttemptFailure) {
        self.stop_timer();
        self.failure = Some(failure);
        self.status = AttemptStatus::Error;
    }

    fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
    }
}
