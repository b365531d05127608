use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use shared::models::{PracticeAttempt, Question};
use shared::repositories::{AttemptRepository, ProfileRepository};

use crate::errors::EngineError;
use crate::scoring;

/// Single-player practice flow. Unrelated to the match flow; it is the one
/// consumer of the attempt sink, written fire-and-forget.
#[derive(Clone)]
pub struct PracticeService {
    profiles: Arc<dyn ProfileRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl PracticeService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        PracticeService { profiles, attempts }
    }

    /// Scores one practice answer and records the attempt. The record write
    /// happens on a spawned task; a failed write is logged and never
    /// surfaced to the player.
    pub async fn submit_answer(
        &self,
        player_id: &str,
        question: &Question,
        correct: bool,
        elapsed_secs: f64,
    ) -> Result<f64, EngineError> {
        let profile = self
            .profiles
            .fetch_profile(player_id)
            .await?
            .ok_or_else(|| EngineError::ProfileNotFound(player_id.to_string()))?;

        let reward = scoring::answer_reward(
            correct,
            question.xp_gain,
            elapsed_secs,
            profile.level,
            profile.xp,
            profile.xp_to_next,
        );
        info!(
            "Practice answer from {} on question {}: correct={}, reward={}",
            player_id, question.question_id, correct, reward
        );

        let attempt = PracticeAttempt {
            player_id: player_id.to_string(),
            question_id: question.question_id.clone(),
            correct,
            elapsed_secs,
            xp_earned: reward,
            attempted_at: Utc::now(),
        };
        let attempts = Arc::clone(&self.attempts);
        tokio::spawn(async move {
            if let Err(e) = attempts.record_attempt(&attempt).await {
                error!(
                    "Failed to record practice attempt for {}: {}",
                    attempt.player_id, e
                );
            }
        });

        Ok(reward)
    }
}
