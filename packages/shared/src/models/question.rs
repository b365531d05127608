use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question_id: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub level: u32,
    /// Base XP awarded for a correct answer, before the scoring modifiers.
    pub xp_gain: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    pub question_id: String,
    pub answer: String,
}

/// A question with its answer key attached, as broadcast to both sides of a
/// match so clients can grade locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub answer: String,
}

impl MatchQuestion {
    pub fn new(question: Question, key: &AnswerKey) -> Self {
        MatchQuestion {
            question,
            answer: key.answer.clone(),
        }
    }
}
