// src/attempt/runner.rs

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::{
    attempt::{
        controller::{AttemptController, SelectOutcome, SubmitTrigger},
        presenter::present,
        timer::Timer,
    },
    error::{AttemptError, GatewayError},
    gateway::AttemptBackend,
    models::{
        answer::{AnswerEntry, SubmissionRequest},
        definition::{AttemptEnvelope, OptionKey},
        result::ScoreResult,
        view::{AttemptFailure, AttemptStatus, AttemptView, ScoreBreakdown},
    },
};

/// Async driver around one [`AttemptController`].
///
/// Owns the wiring between the countdown task, the host's calls and the backend.
/// The controller sits behind a `std::sync::Mutex` that is never held across an
/// `.await`, so every transition is applied atomically with respect to both
/// trigger sources.
#[derive(Clone)]
pub struct AttemptRunner {
    controller: Arc<Mutex<AttemptController>>,
    backend: Arc<dyn AttemptBackend>,
    token: Arc<str>,
}

fn lock(controller: &Mutex<AttemptController>) -> MutexGuard<'_, AttemptController> {
    controller
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AttemptRunner {
    pub fn new(
        attempt_id: impl Into<String>,
        backend: Arc<dyn AttemptBackend>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            controller: Arc::new(Mutex::new(AttemptController::new(attempt_id))),
            backend,
            token: Arc::from(token.into()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AttemptController> {
        lock(&self.controller)
    }

    pub fn attempt_id(&self) -> String {
        self.lock().attempt_id().to_string()
    }

    /// Fetches the attempt and moves LOADING -> ACTIVE (timer started) or ERROR.
    /// Called once per runner. The fetch runs on its own task so a dropped
    /// caller cannot leave the attempt stuck in LOADING.
    pub async fn load(&self) -> AttemptStatus {
        let runner = self.clone();
        let task = tokio::spawn(async move {
            let attempt_id = runner.attempt_id();
            let fetched = runner.backend.fetch_attempt(&attempt_id, &runner.token).await;
            runner.apply_loaded(&attempt_id, fetched)
        });

        match task.await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Load task failed: {}", e);
                let mut controller = self.lock();
                let _ = controller.fail_load(format!("load task failed: {}", e));
                controller.status()
            }
        }
    }

    fn apply_loaded(
        &self,
        attempt_id: &str,
        fetched: Result<AttemptEnvelope, GatewayError>,
    ) -> AttemptStatus {
        let mut controller = self.lock();
        let loaded = fetched
            .map_err(|e| e.to_string())
            .and_then(|envelope| envelope.into_definition(attempt_id));

        match loaded {
            Ok((kind, definition)) => match controller.activate(kind, definition) {
                Ok(seconds) => {
                    let timer = self.start_timer(seconds);
                    controller.attach_timer(timer);
                }
                Err(e) => tracing::warn!(attempt_id, "Rejected attempt definition: {}", e),
            },
            Err(reason) => {
                if let Err(e) = controller.fail_load(reason) {
                    tracing::error!(attempt_id, "Could not record load failure: {}", e);
                }
            }
        }
        controller.status()
    }

    /// The countdown only holds weak references, so an unmounted attempt is
    /// freed even if its timer task is still winding down.
    fn start_timer(&self, seconds: u32) -> Timer {
        let on_tick = {
            let controller = Arc::downgrade(&self.controller);
            move |remaining: u32| {
                if let Some(controller) = controller.upgrade() {
                    lock(&controller).record_tick(remaining);
                }
            }
        };

        let on_expire = {
            let controller: Weak<Mutex<AttemptController>> = Arc::downgrade(&self.controller);
            let backend = self.backend.clone();
            let token = self.token.clone();
            move || {
                let Some(controller) = controller.upgrade() else {
                    return;
                };
                let runner = AttemptRunner {
                    controller,
                    backend,
                    token,
                };
                if let Some(request) = runner.begin(SubmitTrigger::Expiry) {
                    tokio::spawn(async move { runner.deliver(request).await });
                }
            }
        };

        Timer::start(seconds, on_tick, on_expire)
    }

    pub fn select(&self, question_number: u32, option: OptionKey) -> SelectOutcome {
        self.lock().select(question_number, option)
    }

    /// Manual submit. Returns `false` when the latch was already set and the
    /// call did nothing; otherwise returns once the backend has answered.
    pub async fn submit(&self) -> bool {
        match self.begin(SubmitTrigger::Manual) {
            Some(request) => {
                self.dispatch(request).await;
                true
            }
            None => false,
        }
    }

    /// Resends the captured submission after a SubmissionFailure.
    pub async fn retry(&self) -> Result<(), AttemptError> {
        let request = self.lock().retry_submission()?;
        self.dispatch(request).await;
        Ok(())
    }

    fn begin(&self, trigger: SubmitTrigger) -> Option<SubmissionRequest> {
        self.lock().begin_submit(trigger)
    }

    /// In-flight submissions are never cancelled: the call runs on its own task
    /// and the caller only waits for it.
    async fn dispatch(&self, request: SubmissionRequest) {
        let runner = self.clone();
        let delivery = tokio::spawn(async move { runner.deliver(request).await });
        if let Err(e) = delivery.await {
            tracing::error!("Submission task failed: {}", e);
        }
    }

    async fn deliver(&self, request: SubmissionRequest) {
        let outcome = self.backend.submit_attempt(&request, &self.token).await;
        self.apply_submission(outcome);
    }

    fn apply_submission(&self, outcome: Result<ScoreResult, GatewayError>) {
        let mut controller = self.lock();
        let applied = match outcome {
            Ok(score) => controller.complete(score),
            Err(e) => controller.fail_submission(e.to_string()),
        };
        if let Err(e) = applied {
            tracing::error!(
                attempt_id = controller.attempt_id(),
                "Could not record submission outcome: {}",
                e
            );
        }
    }

    pub fn status(&self) -> AttemptStatus {
        self.lock().status()
    }

    pub fn time_remaining_seconds(&self) -> u32 {
        self.lock().time_remaining_seconds()
    }

    /// Current ledger contents in submission order.
    pub fn answers(&self) -> Vec<AnswerEntry> {
        self.lock().ledger().to_submission_payload()
    }

    /// True when the attempt ended with a LoadFailure; the host may mount it again.
    pub fn load_failed(&self) -> bool {
        matches!(
            self.lock().failure(),
            Some(AttemptFailure::LoadFailure(_))
        )
    }

    pub fn timer_running(&self) -> bool {
        self.lock().timer_running()
    }

    pub fn snapshot(&self, low_time_threshold_secs: u32) -> AttemptView {
        self.lock().snapshot(low_time_threshold_secs)
    }

    /// Presenter output for a SUBMITTED attempt. `Ok(None)` when the
    /// definition hides results.
    pub fn result(&self) -> Result<Option<ScoreBreakdown>, AttemptError> {
        let controller = self.lock();
        match (controller.status(), controller.result()) {
            (AttemptStatus::Submitted, Some(result)) => {
                Ok(controller.shows_results().then(|| present(result)))
            }
            (status, _) => Err(AttemptError::InvalidTransition {
                from: status,
                action: "read result",
            }),
        }
    }

    pub fn unmount(&self) {
        self.lock().unmount();
    }
}
