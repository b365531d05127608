use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered question inside a submitted result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub elapsed_secs: f64,
}

/// One participant's raw submitted performance for a session. Submitted once
/// per session and never mutated afterward; XP is derived from it
/// server-side, it carries no score of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResult {
    pub answers: Vec<AnswerOutcome>,
    pub total_time_secs: f64,
}

/// Derived result of a completed match. Computed exactly once, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub xp_side_one: f64,
    pub xp_side_two: f64,
    pub side_one_won: bool,
    pub combined_xp: f64,
}

/// A recorded single-player attempt, written fire-and-forget by the
/// practice flow. Not used by the match flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeAttempt {
    pub player_id: String,
    pub question_id: String,
    pub correct: bool,
    pub elapsed_secs: f64,
    pub xp_earned: f64,
    pub attempted_at: DateTime<Utc>,
}
