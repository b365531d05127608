use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::PlayerProfile;
use crate::repositories::errors::ProfileRepositoryError;

/// Read-only access to the authoritative user store. Called once per
/// participant, at enqueue time.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn fetch_profile(
        &self,
        player_id: &str,
    ) -> Result<Option<PlayerProfile>, ProfileRepositoryError>;
}

/// Mutex-guarded map of profiles, for tests and self-contained embedders.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<String, PlayerProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<PlayerProfile>) -> Self {
        let map = profiles
            .into_iter()
            .map(|p| (p.player_id.clone(), p))
            .collect();
        InMemoryProfileRepository {
            profiles: Mutex::new(map),
        }
    }

    pub fn upsert(&self, profile: PlayerProfile) {
        self.profiles
            .lock()
            .expect("profile map poisoned")
            .insert(profile.player_id.clone(), profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn fetch_profile(
        &self,
        player_id: &str,
    ) -> Result<Option<PlayerProfile>, ProfileRepositoryError> {
        let profiles = self
            .profiles
            .lock()
            .map_err(|e| ProfileRepositoryError::Storage(e.to_string()))?;
        Ok(profiles.get(player_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn test_fetch_profile_returns_stored_profile() {
        let repository = InMemoryProfileRepository::with_profiles(vec![profile("p1", 1200)]);

        let fetched = repository.fetch_profile("p1").await.unwrap();

        assert_eq!(fetched.unwrap().rating, 1200);
    }

    #[tokio::test]
    async fn test_fetch_profile_unknown_player_is_none() {
        let repository = InMemoryProfileRepository::new();

        let fetched = repository.fetch_profile("ghost").await.unwrap();

        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_profile() {
        let repository = InMemoryProfileRepository::with_profiles(vec![profile("p1", 1200)]);
        repository.upsert(profile("p1", 1450));

        let fetched = repository.fetch_profile("p1").await.unwrap();

        assert_eq!(fetched.unwrap().rating, 1450);
    }
}
