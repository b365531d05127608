pub mod attempt_repository_errors;
pub mod profile_repository_errors;
pub mod question_repository_errors;

pub use attempt_repository_errors::AttemptRepositoryError;
pub use profile_repository_errors::ProfileRepositoryError;
pub use question_repository_errors::QuestionRepositoryError;
