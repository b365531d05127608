pub mod attempt_repository;
pub mod errors;
pub mod profile_repository;
pub mod question_repository;

pub use attempt_repository::{AttemptRepository, InMemoryAttemptRepository};
pub use profile_repository::{InMemoryProfileRepository, ProfileRepository};
pub use question_repository::{InMemoryQuestionRepository, QuestionRepository};
