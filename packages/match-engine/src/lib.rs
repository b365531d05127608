pub mod connections;
pub mod errors;
pub mod notifications;
pub mod orchestrator;
pub mod pool;
pub mod practice;
pub mod scoring;
pub mod session;

pub use connections::{ConnectionId, ConnectionSender};
pub use errors::EngineError;
pub use notifications::{Notifier, ServerEvent};
pub use orchestrator::{ClientCommand, EngineConfig, MatchOrchestrator};
pub use pool::{WaitingEntry, WaitingPool};
pub use practice::PracticeService;
pub use session::{MatchSession, SessionState, SessionStore};
