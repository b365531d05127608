use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{AnswerKey, Question};
use crate::repositories::errors::QuestionRepositoryError;

/// Read-only access to the question bank. Called once per session, after
/// both readiness submissions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions at the given difficulty level. An empty vec means no
    /// questions exist for that level; that is not a storage error.
    async fn fetch_questions(&self, level: u32) -> Result<Vec<Question>, QuestionRepositoryError>;

    async fn fetch_answers(
        &self,
        question_ids: &[String],
    ) -> Result<Vec<AnswerKey>, QuestionRepositoryError>;
}

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: Mutex<Vec<Question>>,
    answers: Mutex<HashMap<String, AnswerKey>>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bank(questions: Vec<Question>, answers: Vec<AnswerKey>) -> Self {
        let answer_map = answers
            .into_iter()
            .map(|a| (a.question_id.clone(), a))
            .collect();
        InMemoryQuestionRepository {
            questions: Mutex::new(questions),
            answers: Mutex::new(answer_map),
        }
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn fetch_questions(&self, level: u32) -> Result<Vec<Question>, QuestionRepositoryError> {
        let questions = self
            .questions
            .lock()
            .map_err(|e| QuestionRepositoryError::Storage(e.to_string()))?;
        Ok(questions.iter().filter(|q| q.level == level).cloned().collect())
    }

    async fn fetch_answers(
        &self,
        question_ids: &[String],
    ) -> Result<Vec<AnswerKey>, QuestionRepositoryError> {
        let answers = self
            .answers
            .lock()
            .map_err(|e| QuestionRepositoryError::Storage(e.to_string()))?;
        Ok(question_ids
            .iter()
            .filter_map(|id| answers.get(id).cloned())
            .collect())
    }
}
