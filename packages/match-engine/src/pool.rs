use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::info;

use shared::models::PlayerProfile;

use crate::connections::ConnectionId;

const TOLERANCE_BASE: i64 = 50;
const TOLERANCE_STEP: i64 = 50;
const TOLERANCE_STEP_MS: i64 = 5000;
const TOLERANCE_CAP: i64 = 1000;

/// One participant waiting for an opponent.
#[derive(Debug, Clone)]
pub struct WaitingEntry {
    pub connection_id: ConnectionId,
    pub profile: PlayerProfile,
    pub joined_at: DateTime<Utc>,
}

impl WaitingEntry {
    pub fn new(connection_id: ConnectionId, profile: PlayerProfile) -> Self {
        WaitingEntry {
            connection_id,
            profile,
            joined_at: Utc::now(),
        }
    }
}

/// Allowed rating difference after waiting `wait_ms`: starts at ±50 and
/// widens by 50 every 5 seconds, capped at ±1000.
pub fn rating_tolerance(wait_ms: i64) -> i32 {
    let wait_ms = wait_ms.max(0);
    let tolerance = TOLERANCE_BASE + TOLERANCE_STEP * (wait_ms / TOLERANCE_STEP_MS);
    tolerance.min(TOLERANCE_CAP) as i32
}

/// The set of participants not yet paired. All mutation runs under one
/// mutex, each operation completing entirely within a single lock hold, so
/// two concurrent matching passes can never claim the same entry.
#[derive(Default)]
pub struct WaitingPool {
    entries: Mutex<Vec<WaitingEntry>>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant. Idempotent: a second enqueue for the same
    /// connection is a no-op and returns false.
    pub fn enqueue(&self, entry: WaitingEntry) -> bool {
        let mut entries = self.entries.lock().expect("waiting pool poisoned");
        if entries
            .iter()
            .any(|e| e.connection_id == entry.connection_id)
        {
            info!(
                "Connection {} already in waiting pool, ignoring enqueue",
                entry.connection_id
            );
            return false;
        }
        info!(
            "Enqueued {} (rating {}) into waiting pool",
            entry.connection_id, entry.profile.rating
        );
        entries.push(entry);
        true
    }

    /// Removes a still-waiting entry. No-op if absent.
    pub fn cancel(&self, connection_id: &ConnectionId) -> bool {
        let mut entries = self.entries.lock().expect("waiting pool poisoned");
        let before = entries.len();
        entries.retain(|e| &e.connection_id != connection_id);
        let removed = entries.len() < before;
        if removed {
            info!("Removed {} from waiting pool", connection_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("waiting pool poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.entries
            .lock()
            .expect("waiting pool poisoned")
            .iter()
            .any(|e| &e.connection_id == connection_id)
    }

    /// Attempts to match the given waiting participant against the rest of
    /// the pool, evaluating only the initiator's current tolerance. The
    /// first compatible entry in pool order wins; on success both entries
    /// are removed within the same lock hold. Returns (initiator, opponent).
    pub fn claim_match(
        &self,
        connection_id: &ConnectionId,
        now: DateTime<Utc>,
    ) -> Option<(WaitingEntry, WaitingEntry)> {
        let mut entries = self.entries.lock().expect("waiting pool poisoned");
        let initiator_idx = entries
            .iter()
            .position(|e| &e.connection_id == connection_id)?;

        let initiator_rating = entries[initiator_idx].profile.rating;
        let wait_ms = (now - entries[initiator_idx].joined_at).num_milliseconds();
        let tolerance = rating_tolerance(wait_ms);

        let opponent_idx = entries.iter().position(|e| {
            e.connection_id != *connection_id
                && (e.profile.rating - initiator_rating).abs() <= tolerance
        })?;

        // Remove the higher index first so the lower one stays valid.
        let (first, second) = if initiator_idx > opponent_idx {
            (initiator_idx, opponent_idx)
        } else {
            (opponent_idx, initiator_idx)
        };
        let a = entries.remove(first);
        let b = entries.remove(second);
        let (initiator, opponent) = if a.connection_id == *connection_id {
            (a, b)
        } else {
            (b, a)
        };

        info!(
            "Matched {} (rating {}) with {} (rating {}) at tolerance ±{}",
            initiator.connection_id,
            initiator.profile.rating,
            opponent.connection_id,
            opponent.profile.rating,
            tolerance
        );
        Some((initiator, opponent))
    }

    /// One bounded sweep pass: tries each still-waiting entry as the
    /// initiator, in pool order, and returns the first pair found. At most
    /// one pair per call.
    pub fn claim_any_pair(&self, now: DateTime<Utc>) -> Option<(WaitingEntry, WaitingEntry)> {
        let candidates: Vec<ConnectionId> = {
            let entries = self.entries.lock().expect("waiting pool poisoned");
            entries.iter().map(|e| e.connection_id.clone()).collect()
        };
        for connection_id in candidates {
            if let Some(pair) = self.claim_match(&connection_id, now) {
                return Some(pair);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn profile(player_id: &str, rating: i32) -> PlayerProfile {
        PlayerProfile {
            player_id: player_id.to_string(),
            display_name: player_id.to_string(),
            avatar_url: None,
            rating,
            rank: "Silver".to_string(),
            level: 4,
            xp: 200.0,
            xp_to_next: 400.0,
        }
    }

    fn entry(conn: &str, rating: i32) -> WaitingEntry {
        WaitingEntry::new(ConnectionId::new(conn), profile(conn, rating))
    }

    #[test]
    fn test_tolerance_values() {
        assert_eq!(rating_tolerance(0), 50);
        assert_eq!(rating_tolerance(4999), 50);
        assert_eq!(rating_tolerance(5000), 100);
        assert_eq!(rating_tolerance(14_999), 150);
        assert_eq!(rating_tolerance(95_000), 1000);
        assert_eq!(rating_tolerance(10_000_000), 1000);
    }

    #[test]
    fn test_tolerance_negative_wait_clamps_to_base() {
        assert_eq!(rating_tolerance(-500), 50);
    }

    proptest! {
        #[test]
        fn prop_tolerance_monotonic_and_capped(w1 in 0i64..10_000_000, delta in 0i64..10_000_000) {
            let t1 = rating_tolerance(w1);
            let t2 = rating_tolerance(w1 + delta);
            prop_assert!(t1 <= t2);
            prop_assert!(t1 >= 50);
            prop_assert!(t2 <= 1000);
        }
    }

    #[test]
    fn test_enqueue_is_idempotent_per_connection() {
        let pool = WaitingPool::new();

        assert!(pool.enqueue(entry("c1", 1200)));
        assert!(!pool.enqueue(entry("c1", 1300)));

        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_cancel_removes_entry() {
        let pool = WaitingPool::new();
        pool.enqueue(entry("c1", 1200));

        assert!(pool.cancel(&ConnectionId::new("c1")));
        assert!(!pool.cancel(&ConnectionId::new("c1")));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_claim_match_within_base_tolerance() {
        let pool = WaitingPool::new();
        pool.enqueue(entry("c1", 1200));
        pool.enqueue(entry("c2", 1240));

        let (initiator, opponent) = pool.claim_match(&ConnectionId::new("c2"), Utc::now()).unwrap();

        assert_eq!(initiator.connection_id, ConnectionId::new("c2"));
        assert_eq!(opponent.connection_id, ConnectionId::new("c1"));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_claim_match_rejects_outside_tolerance() {
        let pool = WaitingPool::new();
        pool.enqueue(entry("c1", 1200));
        pool.enqueue(entry("c2", 1300));

        let matched = pool.claim_match(&ConnectionId::new("c2"), Utc::now());

        assert!(matched.is_none());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_claim_match_widens_with_wait_time() {
        let pool = WaitingPool::new();
        let mut old = entry("c1", 1200);
        old.joined_at = Utc::now() - Duration::seconds(11);
        pool.enqueue(old);
        pool.enqueue(entry("c2", 1340));

        // c2 just arrived: ±50, no match from its side.
        assert!(pool.claim_match(&ConnectionId::new("c2"), Utc::now()).is_none());

        // c1 has waited 11s: ±150 covers the 140 gap.
        let (initiator, opponent) = pool.claim_match(&ConnectionId::new("c1"), Utc::now()).unwrap();
        assert_eq!(initiator.connection_id, ConnectionId::new("c1"));
        assert_eq!(opponent.connection_id, ConnectionId::new("c2"));
    }

    #[test]
    fn test_claim_match_takes_first_in_pool_order() {
        let pool = WaitingPool::new();
        pool.enqueue(entry("c1", 1210));
        pool.enqueue(entry("c2", 1190));
        pool.enqueue(entry("c3", 1200));

        let (_, opponent) = pool.claim_match(&ConnectionId::new("c3"), Utc::now()).unwrap();

        assert_eq!(opponent.connection_id, ConnectionId::new("c1"));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&ConnectionId::new("c2")));
    }

    #[test]
    fn test_claim_match_unknown_connection_is_none() {
        let pool = WaitingPool::new();
        pool.enqueue(entry("c1", 1200));

        assert!(pool.claim_match(&ConnectionId::new("ghost"), Utc::now()).is_none());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_claim_any_pair_stops_after_first_pair() {
        let pool = WaitingPool::new();
        pool.enqueue(entry("c1", 1200));
        pool.enqueue(entry("c2", 1210));
        pool.enqueue(entry("c3", 1500));
        pool.enqueue(entry("c4", 1510));

        let pair = pool.claim_any_pair(Utc::now()).unwrap();

        let ids = [pair.0.connection_id.clone(), pair.1.connection_id.clone()];
        assert!(ids.contains(&ConnectionId::new("c1")));
        assert!(ids.contains(&ConnectionId::new("c2")));
        // Second compatible pair is left for the next sweep.
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_claim_any_pair_empty_pool() {
        let pool = WaitingPool::new();
        assert!(pool.claim_any_pair(Utc::now()).is_none());
    }
}
