use serde::{Deserialize, Serialize};

/// Snapshot of a player taken when they enter the waiting pool.
/// Carried unchanged through the session; never re-fetched mid-match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub rating: i32,
    pub rank: String,
    pub level: u32,
    pub xp: f64,
    pub xp_to_next: f64,
}

impl PlayerProfile {
    /// Merges client-supplied display data with the authoritative profile,
    /// preferring the store's rating and rank. One-time read at enqueue.
    pub fn merged(client: &PlayerProfile, authoritative: &PlayerProfile) -> Self {
        PlayerProfile {
            player_id: client.player_id.clone(),
            display_name: client.display_name.clone(),
            avatar_url: client.avatar_url.clone(),
            rating: authoritative.rating,
            rank: authoritative.rank.clone(),
            level: authoritative.level,
            xp: authoritative.xp,
            xp_to_next: authoritative.xp_to_next,
        }
    }
}
