use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shared::models::{MatchQuestion, PlayerProfile, ScoreOutcome};

use crate::connections::{ConnectionId, ConnectionSender};

/// Outbound logical events toward connected participants. The wire names
/// match the client protocol (`startGame`, `gameReady`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    StartGame {
        session_id: String,
        opponent: PlayerProfile,
    },
    #[serde(rename_all = "camelCase")]
    GameReady {
        session_id: String,
        questions: Vec<MatchQuestion>,
        match_level: u32,
    },
    #[serde(rename_all = "camelCase")]
    GameError { reason: String },
    #[serde(rename_all = "camelCase")]
    MatchEnd {
        outcome: ScoreOutcome,
        is_winner: bool,
    },
    #[serde(rename_all = "camelCase")]
    SaveMatchData { outcome: ScoreOutcome },
}

impl ServerEvent {
    fn name(&self) -> &'static str {
        match self {
            ServerEvent::StartGame { .. } => "startGame",
            ServerEvent::GameReady { .. } => "gameReady",
            ServerEvent::GameError { .. } => "gameError",
            ServerEvent::MatchEnd { .. } => "matchEnd",
            ServerEvent::SaveMatchData { .. } => "saveMatchData",
        }
    }
}

/// Delivers events to participants. Send failures are logged and swallowed:
/// a dead connection must not abort delivery to the live one, and the
/// session-level disconnect handling is where departures are dealt with.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn ConnectionSender>,
}

impl Notifier {
    pub fn new(sender: Arc<dyn ConnectionSender>) -> Self {
        Self { sender }
    }

    pub async fn notify(&self, connection_id: &ConnectionId, event: &ServerEvent) {
        info!(
            "Sending {} to connection {}",
            event.name(),
            connection_id
        );
        if let Err(e) = self.sender.send(connection_id, event).await {
            warn!(
                "Failed to send {} to connection {}: {}",
                event.name(),
                connection_id,
                e
            );
        }
    }

    pub async fn notify_all(&self, connection_ids: &[ConnectionId], event: &ServerEvent) {
        for connection_id in connection_ids {
            self.notify(connection_id, event).await;
        }
    }
}
