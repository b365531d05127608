use shared::repositories::errors::{ProfileRepositoryError, QuestionRepositoryError};

#[derive(Debug)]
pub enum EngineError {
    Profile(ProfileRepositoryError),
    Question(QuestionRepositoryError),
    ProfileNotFound(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Profile(err) => write!(f, "Profile repository error: {}", err),
            EngineError::Question(err) => write!(f, "Question repository error: {}", err),
            EngineError::ProfileNotFound(player_id) => {
                write!(f, "No profile found for player {}", player_id)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ProfileRepositoryError> for EngineError {
    fn from(err: ProfileRepositoryError) -> Self {
        EngineError::Profile(err)
    }
}

impl From<QuestionRepositoryError> for EngineError {
    fn from(err: QuestionRepositoryError) -> Self {
        EngineError::Question(err)
    }
}
