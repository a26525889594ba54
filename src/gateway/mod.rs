// src/gateway/mod.rs

//! Boundary to the remote learning backend.

mod remote;

use async_trait::async_trait;

use crate::{
    error::GatewayError,
    models::{answer::SubmissionRequest, definition::AttemptEnvelope, result::ScoreResult},
};

pub use remote::RemoteGateway;

/// The two calls the attempt core makes. The bearer token is opaque and is
/// attached to both as-is.
#[async_trait]
pub trait AttemptBackend: Send + Sync {
    /// `GET /attempt/{attempt_id}`.
    async fn fetch_attempt(
        &self,
        attempt_id: &str,
        token: &str,
    ) -> Result<AttemptEnvelope, GatewayError>;

    /// `POST /attempt/{attempt_id}/submit`. Exactly one network call; no retries here.
    async fn submit_attempt(
        &self,
        request: &SubmissionRequest,
        token: &str,
    ) -> Result<ScoreResult, GatewayError>;
}
