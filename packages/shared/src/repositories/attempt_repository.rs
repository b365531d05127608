use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::PracticeAttempt;
use crate::repositories::errors::AttemptRepositoryError;

/// Write-only sink for single-player attempt records. The engine treats it
/// as fire-and-forget; the match flow never calls it.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn record_attempt(&self, attempt: &PracticeAttempt)
        -> Result<(), AttemptRepositoryError>;
}

#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts: Mutex<Vec<PracticeAttempt>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<PracticeAttempt> {
        self.attempts
            .lock()
            .expect("attempt log poisoned")
            .clone()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn record_attempt(
        &self,
        attempt: &PracticeAttempt,
    ) -> Result<(), AttemptRepositoryError> {
        let mut attempts = self
            .attempts
            .lock()
            .map_err(|e| AttemptRepositoryError::Storage(e.to_string()))?;
        attempts.push(attempt.clone());
        Ok(())
    }
}
