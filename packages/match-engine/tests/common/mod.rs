#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use match_engine::{
    ConnectionId, ConnectionSender, EngineConfig, MatchOrchestrator, Notifier, ServerEvent,
};
use shared::models::{AnswerKey, AnswerOutcome, PlayerProfile, Question, RawResult};
use shared::repositories::errors::QuestionRepositoryError;
use shared::repositories::{
    InMemoryProfileRepository, InMemoryQuestionRepository, QuestionRepository,
};

/// Records every event the engine sends, per connection.
#[derive(Default)]
pub struct CapturingSender {
    sent: Mutex<Vec<(ConnectionId, ServerEvent)>>,
}

impl CapturingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_for(&self, connection_id: &ConnectionId) -> Vec<ServerEvent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == connection_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn event_names_for(&self, connection_id: &ConnectionId) -> Vec<&'static str> {
        self.events_for(connection_id)
            .iter()
            .map(|e| match e {
                ServerEvent::StartGame { .. } => "startGame",
                ServerEvent::GameReady { .. } => "gameReady",
                ServerEvent::GameError { .. } => "gameError",
                ServerEvent::MatchEnd { .. } => "matchEnd",
                ServerEvent::SaveMatchData { .. } => "saveMatchData",
            })
            .collect()
    }
}

#[async_trait]
impl ConnectionSender for CapturingSender {
    async fn send(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent
            .lock()
            .unwrap()
            .push((connection_id.clone(), event.clone()));
        Ok(())
    }
}

/// Question repository whose fetches always fail, for provider-failure
/// scenarios.
pub struct FailingQuestionRepository;

#[async_trait]
impl QuestionRepository for FailingQuestionRepository {
    async fn fetch_questions(
        &self,
        _level: u32,
    ) -> Result<Vec<Question>, QuestionRepositoryError> {
        Err(QuestionRepositoryError::Storage("backend down".to_string()))
    }

    async fn fetch_answers(
        &self,
        _question_ids: &[String],
    ) -> Result<Vec<AnswerKey>, QuestionRepositoryError> {
        Err(QuestionRepositoryError::Storage("backend down".to_string()))
    }
}

pub fn profile(player_id: &str, rating: i32) -> PlayerProfile {
    PlayerProfile {
        player_id: player_id.to_string(),
        display_name: format!("{}-name", player_id),
        avatar_url: None,
        rating,
        rank: "Silver".to_string(),
        level: 4,
        xp: 200.0,
        xp_to_next: 400.0,
    }
}

pub fn question_bank(level: u32, count: usize) -> (Vec<Question>, Vec<AnswerKey>) {
    let questions = (0..count)
        .map(|i| Question {
            question_id: format!("q{}", i),
            prompt: format!("prompt {}", i),
            choices: vec!["a".to_string(), "b".to_string()],
            level,
            xp_gain: 20.0,
        })
        .collect();
    let answers = (0..count)
        .map(|i| AnswerKey {
            question_id: format!("q{}", i),
            answer: "a".to_string(),
        })
        .collect();
    (questions, answers)
}

pub fn all_correct_result(answers: usize, total_time_secs: f64) -> RawResult {
    RawResult {
        answers: (0..answers)
            .map(|_| AnswerOutcome {
                correct: true,
                elapsed_secs: 5.0,
            })
            .collect(),
        total_time_secs,
    }
}

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        sweep_interval: Duration::from_millis(20),
        questions_per_match: 6,
        save_delay: Duration::from_millis(10),
        teardown_delay: Duration::from_millis(10),
    }
}

/// Test log output; repeated calls are fine.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

/// Orchestrator wired to capturing transport and seeded in-memory stores.
pub fn engine_with(
    profiles: Vec<PlayerProfile>,
    questions: Vec<Question>,
    answers: Vec<AnswerKey>,
) -> (Arc<MatchOrchestrator>, Arc<CapturingSender>) {
    init_tracing();
    let sender = Arc::new(CapturingSender::new());
    let orchestrator = Arc::new(MatchOrchestrator::with_config(
        Notifier::new(sender.clone()),
        Arc::new(InMemoryProfileRepository::with_profiles(profiles)),
        Arc::new(InMemoryQuestionRepository::with_bank(questions, answers)),
        fast_config(),
    ));
    (orchestrator, sender)
}

/// Like [`engine_with`] but with a caller-supplied question repository.
pub fn engine_with_question_repo(
    profiles: Vec<PlayerProfile>,
    questions: Arc<dyn QuestionRepository>,
) -> (Arc<MatchOrchestrator>, Arc<CapturingSender>) {
    init_tracing();
    let sender = Arc::new(CapturingSender::new());
    let orchestrator = Arc::new(MatchOrchestrator::with_config(
        Notifier::new(sender.clone()),
        Arc::new(InMemoryProfileRepository::with_profiles(profiles)),
        questions,
        fast_config(),
    ));
    (orchestrator, sender)
}

pub fn conn(id: &str) -> ConnectionId {
    ConnectionId::new(id)
}
