#[derive(Debug)]
pub enum ProfileRepositoryError {
    NotFound,
    Storage(String),
}

impl std::fmt::Display for ProfileRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileRepositoryError::NotFound => write!(f, "Profile not found"),
            ProfileRepositoryError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ProfileRepositoryError {}
