#[derive(Debug)]
pub enum AttemptRepositoryError {
    Storage(String),
}

impl std::fmt::Display for AttemptRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptRepositoryError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for AttemptRepositoryError {}
