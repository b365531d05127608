use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::notifications::ServerEvent;

/// Opaque handle to one connected participant. The engine only ever uses it
/// as a map key and as the address for outbound events; what it resolves to
/// is the transport layer's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        ConnectionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The engine's single outward seam toward the transport layer: deliver one
/// event to one connection.
#[async_trait]
pub trait ConnectionSender: Send + Sync {
    async fn send(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
