pub mod outcome;
pub mod profile;
pub mod question;

pub use outcome::{AnswerOutcome, PracticeAttempt, RawResult, ScoreOutcome};
pub use profile::PlayerProfile;
pub use question::{AnswerKey, MatchQuestion, Question};
