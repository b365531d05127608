use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use shared::models::{MatchQuestion, PlayerProfile, RawResult};
use shared::repositories::{ProfileRepository, QuestionRepository};

use crate::connections::ConnectionId;
use crate::errors::EngineError;
use crate::notifications::{Notifier, ServerEvent};
use crate::pool::{WaitingEntry, WaitingPool};
use crate::scoring;
use crate::session::{MatchSession, SessionState, SessionStore};

/// Engine tunables. Tests shrink the delays; production keeps the defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the background sweep retries pairing still-waiting entries.
    pub sweep_interval: Duration,
    /// Number of questions drawn (without replacement) per match.
    pub questions_per_match: usize,
    /// Delay before the `saveMatchData` follow-up, so the primary result
    /// notification renders first. Carries no server-side state.
    pub save_delay: Duration,
    /// Grace delay between the follow-up and removing the session from the
    /// store, so both messages are delivered.
    pub teardown_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sweep_interval: Duration::from_secs(2),
            questions_per_match: 6,
            save_delay: Duration::from_secs(1),
            teardown_delay: Duration::from_secs(2),
        }
    }
}

/// Inbound signals from a connected participant, as a transport layer would
/// decode them off the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientCommand {
    Queue {
        profile: PlayerProfile,
    },
    CancelQueue,
    #[serde(rename_all = "camelCase")]
    StartMatch {
        session_id: String,
        level: u32,
    },
    #[serde(rename_all = "camelCase")]
    MatchComplete {
        session_id: String,
        result: RawResult,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom {
        session_id: String,
    },
    Disconnect,
}

/// Drives a session through its life cycle: pairing, readiness, question
/// delivery, result aggregation, teardown. Owns the waiting pool and the
/// session store; everything else is reached through trait seams.
pub struct MatchOrchestrator {
    pool: WaitingPool,
    sessions: SessionStore,
    notifier: Notifier,
    profiles: Arc<dyn ProfileRepository>,
    questions: Arc<dyn QuestionRepository>,
    config: EngineConfig,
}

impl MatchOrchestrator {
    pub fn new(
        notifier: Notifier,
        profiles: Arc<dyn ProfileRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self::with_config(notifier, profiles, questions, EngineConfig::default())
    }

    pub fn with_config(
        notifier: Notifier,
        profiles: Arc<dyn ProfileRepository>,
        questions: Arc<dyn QuestionRepository>,
        config: EngineConfig,
    ) -> Self {
        MatchOrchestrator {
            pool: WaitingPool::new(),
            sessions: SessionStore::new(),
            notifier,
            profiles,
            questions,
            config,
        }
    }

    pub fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Dispatches one decoded client signal.
    pub async fn handle(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        command: ClientCommand,
    ) -> Result<(), EngineError> {
        match command {
            ClientCommand::Queue { profile } => self.queue(connection_id, profile).await,
            ClientCommand::CancelQueue => {
                self.cancel_queue(&connection_id);
                Ok(())
            }
            ClientCommand::StartMatch { session_id, level } => {
                self.start_match(&connection_id, &session_id, level).await
            }
            ClientCommand::MatchComplete { session_id, result } => {
                self.match_complete(&connection_id, &session_id, result).await
            }
            ClientCommand::LeaveRoom { session_id } => {
                self.leave_room(&connection_id, &session_id).await;
                Ok(())
            }
            ClientCommand::Disconnect => {
                self.disconnect(&connection_id).await;
                Ok(())
            }
        }
    }

    /// Enqueues a participant: enriches the client-supplied profile from
    /// the authoritative store (one-time read), adds them to the waiting
    /// pool, then opportunistically attempts a match.
    pub async fn queue(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        client_profile: PlayerProfile,
    ) -> Result<(), EngineError> {
        info!(
            "Queue request from connection {} (player {})",
            connection_id, client_profile.player_id
        );

        let authoritative = match self.profiles.fetch_profile(&client_profile.player_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!("No profile for player {}", client_profile.player_id);
                self.notifier
                    .notify(
                        &connection_id,
                        &ServerEvent::GameError {
                            reason: "profile unavailable".to_string(),
                        },
                    )
                    .await;
                return Err(EngineError::ProfileNotFound(client_profile.player_id));
            }
            Err(e) => {
                error!(
                    "Profile fetch failed for player {}: {}",
                    client_profile.player_id, e
                );
                self.notifier
                    .notify(
                        &connection_id,
                        &ServerEvent::GameError {
                            reason: "profile unavailable".to_string(),
                        },
                    )
                    .await;
                return Err(e.into());
            }
        };

        let merged = PlayerProfile::merged(&client_profile, &authoritative);
        if !self.pool.enqueue(WaitingEntry::new(connection_id.clone(), merged)) {
            // Duplicate enqueue for a live connection is a no-op.
            return Ok(());
        }

        if let Some((initiator, opponent)) = self.pool.claim_match(&connection_id, Utc::now()) {
            self.create_session(initiator, opponent).await;
        }
        Ok(())
    }

    pub fn cancel_queue(&self, connection_id: &ConnectionId) {
        self.pool.cancel(connection_id);
    }

    /// Pairs two claimed entries into a session, introduces the opponents
    /// to each other, and opens the readiness window.
    async fn create_session(&self, initiator: WaitingEntry, opponent: WaitingEntry) {
        let session = MatchSession::new(
            initiator.connection_id.clone(),
            initiator.profile.clone(),
            opponent.connection_id.clone(),
            opponent.profile.clone(),
        );
        let session_id = session.session_id.clone();
        self.sessions.insert(session);

        self.notifier
            .notify(
                &initiator.connection_id,
                &ServerEvent::StartGame {
                    session_id: session_id.clone(),
                    opponent: opponent.profile.clone(),
                },
            )
            .await;
        self.notifier
            .notify(
                &opponent.connection_id,
                &ServerEvent::StartGame {
                    session_id: session_id.clone(),
                    opponent: initiator.profile.clone(),
                },
            )
            .await;

        self.sessions.with_session(&session_id, |s| {
            if s.state == SessionState::Paired {
                s.state = SessionState::ReadyWait;
            }
        });
    }

    /// Records one side's chosen proficiency level. The second distinct
    /// submission fires the READY_WAIT → IN_PROGRESS transition exactly
    /// once; the question fetch happens outside any lock and the session is
    /// re-validated afterward.
    pub async fn start_match(
        self: &Arc<Self>,
        connection_id: &ConnectionId,
        session_id: &str,
        level: u32,
    ) -> Result<(), EngineError> {
        let fired = self.sessions.with_session(session_id, |s| {
            let match_level = s.submit_level(connection_id, level)?;
            s.state = SessionState::InProgress;
            s.match_level = Some(match_level);
            Some(match_level)
        });

        let match_level = match fired {
            None => {
                warn!(
                    "startMatch from {} for unknown session {}, ignoring",
                    connection_id, session_id
                );
                return Ok(());
            }
            Some(None) => return Ok(()), // waiting for the opponent, or a duplicate
            Some(Some(match_level)) => match_level,
        };

        info!(
            "Session {} ready on both sides, fetching questions at level {}",
            session_id, match_level
        );
        self.deliver_questions(session_id, match_level).await
    }

    async fn deliver_questions(
        self: &Arc<Self>,
        session_id: &str,
        match_level: u32,
    ) -> Result<(), EngineError> {
        let bank = match self.questions.fetch_questions(match_level).await {
            Ok(bank) => bank,
            Err(e) => {
                error!("Question fetch failed for session {}: {}", session_id, e);
                self.abort_session(session_id, "question data unavailable").await;
                return Err(e.into());
            }
        };
        if bank.is_empty() {
            warn!(
                "No questions exist at level {} for session {}",
                match_level, session_id
            );
            self.abort_session(session_id, "no questions available for this level")
                .await;
            return Ok(());
        }

        let selected: Vec<_> = {
            let mut rng = rand::thread_rng();
            bank.choose_multiple(&mut rng, self.config.questions_per_match)
                .cloned()
                .collect()
        };
        let question_ids: Vec<String> =
            selected.iter().map(|q| q.question_id.clone()).collect();

        let keys = match self.questions.fetch_answers(&question_ids).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Answer fetch failed for session {}: {}", session_id, e);
                self.abort_session(session_id, "question data unavailable").await;
                return Err(e.into());
            }
        };

        let questions: Vec<MatchQuestion> = selected
            .into_iter()
            .filter_map(|question| {
                keys.iter()
                    .find(|k| k.question_id == question.question_id)
                    .map(|key| MatchQuestion::new(question, key))
            })
            .collect();
        if questions.is_empty() {
            warn!("No answer keys at level {} for session {}", match_level, session_id);
            self.abort_session(session_id, "no questions available for this level")
                .await;
            return Ok(());
        }

        // The session may have been abandoned while the fetch was in
        // flight; only a still-intact IN_PROGRESS session gets questions.
        let recipients = self.sessions.with_session(session_id, |s| {
            if s.state == SessionState::InProgress && s.participants.len() == 2 {
                s.questions = questions.clone();
                Some(s.participants.clone())
            } else {
                None
            }
        });

        match recipients.flatten() {
            Some(recipients) => {
                info!(
                    "Broadcasting {} questions for session {}",
                    questions.len(),
                    session_id
                );
                self.notifier
                    .notify_all(
                        &recipients,
                        &ServerEvent::GameReady {
                            session_id: session_id.to_string(),
                            questions,
                            match_level,
                        },
                    )
                    .await;
            }
            None => {
                info!(
                    "Session {} no longer intact after question fetch, dropping broadcast",
                    session_id
                );
            }
        }
        Ok(())
    }

    /// Fatal data error: both sides are told why and the session is removed.
    async fn abort_session(&self, session_id: &str, reason: &str) {
        let participants = self.sessions.with_session(session_id, |s| {
            s.state = SessionState::Aborted;
            s.participants.clone()
        });
        if let Some(participants) = participants {
            warn!("Aborting session {}: {}", session_id, reason);
            self.notifier
                .notify_all(
                    &participants,
                    &ServerEvent::GameError {
                        reason: reason.to_string(),
                    },
                )
                .await;
            self.sessions.remove(session_id);
        }
    }

    /// Records one side's submitted result. The second distinct submission
    /// fires scoring and the result broadcast; a repeat submission from the
    /// same connection is ignored.
    pub async fn match_complete(
        self: &Arc<Self>,
        connection_id: &ConnectionId,
        session_id: &str,
        result: RawResult,
    ) -> Result<(), EngineError> {
        let completed = self.sessions.with_session(session_id, |s| {
            if !s.submit_result(connection_id, result) {
                return None;
            }
            s.state = SessionState::Completed;
            Some(s.clone())
        });

        let session = match completed {
            None => {
                warn!(
                    "matchComplete from {} for unknown session {}, ignoring",
                    connection_id, session_id
                );
                return Ok(());
            }
            Some(None) => return Ok(()),
            Some(Some(session)) => session,
        };

        let (Some(result_one), Some(result_two)) = (
            session.results.get(&session.side_one),
            session.results.get(&session.side_two),
        ) else {
            error!("Session {} completed without both results", session_id);
            return Ok(());
        };
        let (Some(profile_one), Some(profile_two)) = (
            session.profiles.get(&session.side_one),
            session.profiles.get(&session.side_two),
        ) else {
            error!("Session {} completed without both profiles", session_id);
            return Ok(());
        };

        let xp_one = scoring::session_reward(result_one, &session.questions, profile_one);
        let xp_two = scoring::session_reward(result_two, &session.questions, profile_two);
        let outcome = scoring::match_outcome(
            xp_one,
            result_one.total_time_secs,
            xp_two,
            result_two.total_time_secs,
        );
        info!(
            "Session {} scored: side one {} XP, side two {} XP, side one won: {}",
            session_id, outcome.xp_side_one, outcome.xp_side_two, outcome.side_one_won
        );

        self.notifier
            .notify(
                &session.side_one,
                &ServerEvent::MatchEnd {
                    outcome: outcome.clone(),
                    is_winner: outcome.side_one_won,
                },
            )
            .await;
        self.notifier
            .notify(
                &session.side_two,
                &ServerEvent::MatchEnd {
                    outcome: outcome.clone(),
                    is_winner: !outcome.side_one_won,
                },
            )
            .await;

        // Delayed follow-up for client-side persistence, then the grace
        // teardown. Neither carries new server-side state.
        let orchestrator = Arc::clone(self);
        let session_id = session_id.to_string();
        let recipients = vec![session.side_one.clone(), session.side_two.clone()];
        tokio::spawn(async move {
            tokio::time::sleep(orchestrator.config.save_delay).await;
            orchestrator
                .notifier
                .notify_all(&recipients, &ServerEvent::SaveMatchData { outcome })
                .await;
            tokio::time::sleep(orchestrator.config.teardown_delay).await;
            orchestrator.sessions.remove(&session_id);
        });
        Ok(())
    }

    /// Explicit departure from a session.
    pub async fn leave_room(&self, connection_id: &ConnectionId, session_id: &str) {
        self.leave(connection_id, session_id).await;
    }

    /// Transport-level disconnect: drops any queue entry and leaves
    /// whatever session the connection was part of.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        info!("Connection {} disconnected", connection_id);
        self.pool.cancel(connection_id);
        if let Some(session_id) = self.sessions.find_for_connection(connection_id) {
            self.leave(connection_id, &session_id).await;
        }
    }

    async fn leave(&self, connection_id: &ConnectionId, session_id: &str) {
        let departure = self.sessions.with_session(session_id, |s| {
            if !s.is_member(connection_id) {
                return None;
            }
            let empty = s.remove_member(connection_id);
            let was_completed = s.state == SessionState::Completed;
            if !empty && !was_completed {
                // No partial score for an abandoned session.
                s.state = SessionState::Aborted;
            }
            Some((empty, was_completed, s.participants.clone()))
        });

        match departure {
            None => {
                warn!(
                    "Leave from {} for unknown session {}, ignoring",
                    connection_id, session_id
                );
            }
            Some(None) => {}
            Some(Some((true, _, _))) => {
                info!("Session {} is empty, tearing down", session_id);
                self.sessions.remove(session_id);
            }
            Some(Some((false, was_completed, remaining))) => {
                info!(
                    "Connection {} left session {}, {} participant(s) remain",
                    connection_id,
                    session_id,
                    remaining.len()
                );
                if !was_completed {
                    self.notifier
                        .notify_all(
                            &remaining,
                            &ServerEvent::GameError {
                                reason: "opponent left the match".to_string(),
                            },
                        )
                        .await;
                }
            }
        }
    }

    /// Periodic sweep pairing entries that were not matched synchronously
    /// on enqueue. At most one pair per tick keeps each pass bounded.
    pub fn spawn_sweep(self: &Arc<Self>) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(orchestrator.config.sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Some((initiator, opponent)) =
                    orchestrator.pool.claim_any_pair(Utc::now())
                {
                    orchestrator.create_session(initiator, opponent).await;
                }
            }
        })
    }
}
