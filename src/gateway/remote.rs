// src/gateway/remote.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, redirect::Policy};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::Config,
    error::GatewayError,
    gateway::AttemptBackend,
    models::{
        answer::SubmissionRequest,
        definition::AttemptEnvelope,
        result::{ScoreResult, SubmitResponse},
    },
};

/// reqwest client for the remote backend.
#[derive(Clone, Debug)]
pub struct RemoteGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteGateway {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// `{base}/attempt/{attempt_id}[/submit]`, with the id percent-encoded as one segment.
    fn attempt_url(&self, attempt_id: &str, submit: bool) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GatewayError::Network("base URL cannot carry a path".to_string()))?;
            segments.pop_if_empty().push("attempt").push(attempt_id);
            if submit {
                segments.push("submit");
            }
        }
        Ok(url)
    }
}

/// Decodes a success body, or turns a non-success status into `GatewayError::Status`
/// using the backend's `{"error": ...}` message when there is one.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(GatewayError::Status(status.as_u16(), message));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::Malformed(e.to_string()))
}

#[async_trait]
impl AttemptBackend for RemoteGateway {
    async fn fetch_attempt(
        &self,
        attempt_id: &str,
        token: &str,
    ) -> Result<AttemptEnvelope, GatewayError> {
        let url = self.attempt_url(attempt_id, false)?;
        tracing::debug!(%url, "Fetching attempt");

        let response = self.client.get(url).bearer_auth(token).send().await?;
        read_json(response).await
    }

    async fn submit_attempt(
        &self,
        request: &SubmissionRequest,
        token: &str,
    ) -> Result<ScoreResult, GatewayError> {
        let url = self.attempt_url(&request.attempt_id, true)?;
        tracing::debug!(%url, answers = request.body.answers.len(), "Submitting attempt");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request.body)
            .send()
            .await?;

        let SubmitResponse { score } = read_json(response).await?;
        score.check().map_err(GatewayError::Malformed)?;
        Ok(score)
    }
}
