use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use axum::extract::FromRef;

use crate::{attempt::AttemptRunner, config::Config, error::AppError, gateway::AttemptBackend};

/// Mounted attempts keyed by attempt id. One session per mount; an attempt
/// that failed to load may be mounted again.
#[derive(Clone, Default)]
pub struct AttemptRegistry {
    attempts: Arc<RwLock<HashMap<String, AttemptRunner>>>,
}

impl AttemptRegistry {
    pub fn mount(&self, runner: AttemptRunner) -> Result<(), AppError> {
        let mut attempts = self
            .attempts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let attempt_id = runner.attempt_id();
        let replacing = match attempts.get(&attempt_id) {
            Some(existing) if existing.load_failed() => {
                existing.unmount();
                true
            }
            Some(_) => {
                return Err(AppError::Conflict(format!(
                    "Attempt {} is already mounted",
                    attempt_id
                )));
            }
            None => false,
        };
        if replacing {
            tracing::info!(%attempt_id, "Replacing attempt that failed to load");
        }
        attempts.insert(attempt_id, runner);
        Ok(())
    }

    pub fn get(&self, attempt_id: &str) -> Result<AttemptRunner, AppError> {
        self.attempts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(attempt_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} is not mounted", attempt_id)))
    }

    /// Removes the attempt and stops its timer.
    pub fn unmount(&self, attempt_id: &str) -> Result<AttemptRunner, AppError> {
        let runner = self
            .attempts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(attempt_id)
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} is not mounted", attempt_id)))?;
        runner.unmount();
        Ok(runner)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn AttemptBackend>,
    pub attempts: AttemptRegistry,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn AttemptBackend>) -> Self {
        Self {
            config,
            backend,
            attempts: AttemptRegistry::default(),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for AttemptRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}
