use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use shared::models::{MatchQuestion, PlayerProfile, RawResult};

use crate::connections::ConnectionId;

/// Life cycle of a paired contest. Teardown is represented by removal from
/// the [`SessionStore`], not by a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Just paired; opponents are being introduced.
    Paired,
    /// Waiting for both sides to submit a proficiency level.
    ReadyWait,
    /// Questions delivered; waiting for both results.
    InProgress,
    /// Both results in, outcome broadcast; awaiting grace-delay teardown.
    Completed,
    /// Fatal data error or abandonment; no score will ever be computed.
    Aborted,
}

/// One paired two-party contest. Membership (`participants`) is the source
/// of truth for who is in the session; transport-level grouping is a
/// derived effect. Index 0 of the creation order is "side one" for scoring.
///
/// A session with one remaining member and no submissions stays in the
/// store until that member leaves — there is deliberately no idle expiry.
#[derive(Debug, Clone)]
pub struct MatchSession {
    pub session_id: String,
    /// Creation order, fixed at pairing; `participants` shrinks as members
    /// leave but `side_one`/`side_two` keep their scoring identity.
    pub side_one: ConnectionId,
    pub side_two: ConnectionId,
    pub participants: Vec<ConnectionId>,
    pub profiles: HashMap<ConnectionId, PlayerProfile>,
    /// Submitted proficiency level per connection; the key set doubles as
    /// the readiness set.
    pub levels: HashMap<ConnectionId, u32>,
    pub questions: Vec<MatchQuestion>,
    pub match_level: Option<u32>,
    pub results: HashMap<ConnectionId, RawResult>,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
}

impl MatchSession {
    pub fn new(
        side_one: ConnectionId,
        one_profile: PlayerProfile,
        side_two: ConnectionId,
        two_profile: PlayerProfile,
    ) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(side_one.clone(), one_profile);
        profiles.insert(side_two.clone(), two_profile);

        MatchSession {
            session_id: Uuid::new_v4().to_string(),
            participants: vec![side_one.clone(), side_two.clone()],
            side_one,
            side_two,
            profiles,
            levels: HashMap::new(),
            questions: Vec::new(),
            match_level: None,
            results: HashMap::new(),
            state: SessionState::Paired,
            created_at: Utc::now(),
        }
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.participants.contains(connection_id)
    }

    pub fn opponent_of(&self, connection_id: &ConnectionId) -> Option<&ConnectionId> {
        self.participants.iter().find(|c| *c != connection_id)
    }

    /// Records a readiness submission. Returns the shared difficulty when
    /// this was the second distinct submission; duplicates and submissions
    /// in the wrong state are ignored (None).
    pub fn submit_level(&mut self, connection_id: &ConnectionId, level: u32) -> Option<u32> {
        if !matches!(self.state, SessionState::Paired | SessionState::ReadyWait) {
            return None;
        }
        if !self.is_member(connection_id) || self.levels.contains_key(connection_id) {
            return None;
        }
        self.levels.insert(connection_id.clone(), level);
        // Both sides must still be present: a level from a departed member
        // must never arm the transition.
        if self.levels.len() == 2 && self.participants.len() == 2 {
            let sum: u32 = self.levels.values().sum();
            Some((f64::from(sum) / 2.0).round() as u32)
        } else {
            None
        }
    }

    /// Records a submitted result. Returns true when this was the second
    /// distinct submission; duplicates, non-members, and submissions
    /// outside IN_PROGRESS are ignored.
    pub fn submit_result(&mut self, connection_id: &ConnectionId, result: RawResult) -> bool {
        if self.state != SessionState::InProgress {
            return false;
        }
        if !self.is_member(connection_id) || self.results.contains_key(connection_id) {
            return false;
        }
        self.results.insert(connection_id.clone(), result);
        self.results.len() == 2 && self.participants.len() == 2
    }

    /// Removes a departed member. Returns true when the session is now
    /// empty and should be torn down.
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        self.participants.retain(|c| c != connection_id);
        self.participants.is_empty()
    }
}

/// Exclusive owner of all live [`MatchSession`]s. All access goes through
/// the lock; callers never hold a session reference across an await.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, MatchSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: MatchSession) {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        info!(
            "Created session {} for {} vs {}",
            session.session_id, session.side_one, session.side_two
        );
        sessions.insert(session.session_id.clone(), session);
    }

    pub fn remove(&self, session_id: &str) -> Option<MatchSession> {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        let removed = sessions.remove(session_id);
        if removed.is_some() {
            info!("Removed session {}", session_id);
        }
        removed
    }

    /// Runs a closure against the named session under the store lock.
    /// Returns None if the session does not exist.
    pub fn with_session<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut MatchSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.get_mut(session_id).map(f)
    }

    pub fn find_for_connection(&self, connection_id: &ConnectionId) -> Option<String> {
        let sessions = self.sessions.lock().expect("session store poisoned");
        sessions
            .values()
            .find(|s| s.is_member(connection_id))
            .map(|s| s.session_id.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
