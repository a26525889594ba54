// src/handlers/attempt.rs

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    attempt::{AttemptRunner, SelectOutcome},
    config::Config,
    error::AppError,
    models::{answer::SelectAnswerRequest, view::AttemptStatus},
    state::{AppState, AttemptRegistry},
    utils::auth::bearer_token,
};

/// Mounts an attempt screen.
///
/// * Requires the learner's bearer token; it is forwarded to the backend as-is.
/// * Creates the session in LOADING and fetches the definition.
/// * Returns the view: ACTIVE with the countdown running, or ERROR with a LoadFailure.
pub async fn mount_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;

    let runner = AttemptRunner::new(attempt_id.clone(), state.backend.clone(), token);
    state.attempts.mount(runner.clone())?;

    let status = runner.load().await;
    tracing::info!(%attempt_id, %status, "Attempt mounted");

    Ok((
        StatusCode::CREATED,
        Json(runner.snapshot(state.config.low_time_threshold_secs)),
    ))
}

/// Current state of a mounted attempt.
pub async fn get_attempt(
    State(attempts): State<AttemptRegistry>,
    State(config): State<Config>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let runner = attempts.get(&attempt_id)?;
    Ok(Json(runner.snapshot(config.low_time_threshold_secs)))
}

/// Records the learner's choice for one question.
/// Unknown question numbers are ignored; answers are locked once the attempt leaves ACTIVE.
pub async fn select_answer(
    State(attempts): State<AttemptRegistry>,
    State(config): State<Config>,
    Path(attempt_id): Path<String>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let option = req
        .option_key()
        .ok_or_else(|| AppError::BadRequest("Option must be one of A, B, C, D".to_string()))?;

    let runner = attempts.get(&attempt_id)?;
    match runner.select(req.question_number, option) {
        SelectOutcome::Recorded | SelectOutcome::UnknownQuestion => {
            Ok(Json(runner.snapshot(config.low_time_threshold_secs)))
        }
        SelectOutcome::Rejected(status) => Err(AppError::Conflict(format!(
            "Answers are locked while the attempt is {}",
            status
        ))),
    }
}

/// Manual submit. A second submit (or one racing the timer's expiry) is a no-op;
/// either way the response reflects the state once the submission settled.
pub async fn submit_attempt(
    State(attempts): State<AttemptRegistry>,
    State(config): State<Config>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let runner = attempts.get(&attempt_id)?;

    if runner.status() == AttemptStatus::Loading {
        return Err(AppError::Conflict("Attempt is still loading".to_string()));
    }

    if !runner.submit().await {
        tracing::debug!(%attempt_id, "Submit ignored, submission already started");
    }

    Ok(Json(runner.snapshot(config.low_time_threshold_secs)))
}

/// Resends the captured answers and time taken after a failed submission.
pub async fn retry_submission(
    State(attempts): State<AttemptRegistry>,
    State(config): State<Config>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let runner = attempts.get(&attempt_id)?;
    runner.retry().await?;
    Ok(Json(runner.snapshot(config.low_time_threshold_secs)))
}

/// Score breakdown of a submitted attempt.
pub async fn get_result(
    State(attempts): State<AttemptRegistry>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let runner = attempts.get(&attempt_id)?;
    let result = runner.result()?;

    Ok(Json(serde_json::json!({
        "attempt_id": attempt_id,
        "results_hidden": result.is_none(),
        "result": result,
    })))
}

/// Leaves the attempt screen: stops the countdown and forgets the session.
pub async fn unmount_attempt(
    State(attempts): State<AttemptRegistry>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let runner = attempts.unmount(&attempt_id)?;
    tracing::info!(%attempt_id, status = %runner.status(), "Attempt unmounted");
    Ok(StatusCode::NO_CONTENT)
}
