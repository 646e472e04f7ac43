//! `KeyValueStore` trait: the single async interface for state persistence.
//!
//! State is stored as JSON blobs addressed by `(scope, key)`. The bot uses two
//! scopes: conversation state keyed by conversation id, and user profiles keyed
//! by user id.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Scope names used by the bot.
pub mod scopes {
    /// Dialog state, keyed by conversation id.
    pub const CONVERSATION: &str = "conversation";
    /// User profiles, keyed by user id.
    pub const USER: &str = "user";
}

/// One pending write in a commit batch.
#[derive(Debug, Clone, PartialEq)]
pub enum StateWrite {
    Set {
        scope: String,
        key: String,
        value: serde_json::Value,
    },
    Delete {
        scope: String,
        key: String,
    },
}

impl StateWrite {
    pub fn set(scope: &str, key: &str, value: serde_json::Value) -> Self {
        Self::Set {
            scope: scope.to_string(),
            key: key.to_string(),
            value,
        }
    }

    pub fn delete(scope: &str, key: &str) -> Self {
        Self::Delete {
            scope: scope.to_string(),
            key: key.to_string(),
        }
    }

    /// The `(scope, key)` this write targets.
    pub fn target(&self) -> (&str, &str) {
        match self {
            Self::Set { scope, key, .. } | Self::Delete { scope, key } => (scope, key),
        }
    }
}

/// Backend-agnostic key/value store.
///
/// Implementations must give read-your-writes consistency per key and apply
/// `commit` batches all-or-nothing, in order.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value, or `None` if the key is absent.
    async fn get(&self, scope: &str, key: &str) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or overwrite a value.
    async fn set(
        &self,
        scope: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Remove a value. Returns whether anything was removed.
    async fn delete(&self, scope: &str, key: &str) -> Result<bool, DatabaseError>;

    /// Apply a batch of writes atomically.
    async fn commit(&self, writes: &[StateWrite]) -> Result<(), DatabaseError>;
}
