//! `ProfileStore`: typed access to user profiles, plus the per-turn draft
//! that dialog steps mutate before anything is written.

use std::sync::Arc;

use crate::error::DatabaseError;
use crate::store::{KeyValueStore, StateWrite, scopes};

use super::model::UserProfile;

/// Typed wrapper over the `user` scope of a [`KeyValueStore`].
///
/// No optimistic concurrency: the last writer for a user wins.
#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load a profile, or `None` if nothing is stored for this user.
    pub async fn find(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        match self.store.get(scopes::USER, user_id).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(format!("user profile {user_id}: {e}"))),
            None => Ok(None),
        }
    }

    /// Load a profile, falling back to an empty one. Never fails for a
    /// missing key.
    pub async fn get(&self, user_id: &str) -> Result<UserProfile, DatabaseError> {
        Ok(self.find(user_id).await?.unwrap_or_default())
    }

    pub async fn set(&self, user_id: &str, profile: &UserProfile) -> Result<(), DatabaseError> {
        let value = serde_json::to_value(profile)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.store.set(scopes::USER, user_id, &value).await
    }

    pub async fn delete(&self, user_id: &str) -> Result<bool, DatabaseError> {
        self.store.delete(scopes::USER, user_id).await
    }

    /// Load a draft for one turn.
    pub async fn draft(&self, user_id: &str) -> Result<ProfileDraft, DatabaseError> {
        Ok(ProfileDraft::new(self.get(user_id).await?))
    }

    /// The write needed to persist a draft, if it changed.
    pub fn staged_write(
        &self,
        user_id: &str,
        draft: &ProfileDraft,
    ) -> Result<Option<StateWrite>, DatabaseError> {
        match draft.change() {
            ProfileChange::Unchanged => Ok(None),
            ProfileChange::Deleted => Ok(Some(StateWrite::delete(scopes::USER, user_id))),
            ProfileChange::Updated => {
                let value = serde_json::to_value(draft.profile())
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
                Ok(Some(StateWrite::set(scopes::USER, user_id, value)))
            }
        }
    }
}

/// What a turn did to the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileChange {
    Unchanged,
    Updated,
    Deleted,
}

/// In-memory copy of a profile for the duration of one turn.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    profile: UserProfile,
    change: ProfileChange,
}

impl ProfileDraft {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            change: ProfileChange::Unchanged,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn change(&self) -> ProfileChange {
        self.change
    }

    /// Mutate the profile. A profile deleted earlier in the turn is recreated.
    pub fn update(&mut self, f: impl FnOnce(&mut UserProfile)) {
        f(&mut self.profile);
        self.change = ProfileChange::Updated;
    }

    /// Forget the profile entirely.
    pub fn delete(&mut self) {
        self.profile = UserProfile::default();
        self.change = ProfileChange::Deleted;
    }
}
