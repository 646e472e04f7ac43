//! Per-conversation turn serialization.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async lock per conversation id so turns for the same
/// conversation never interleave. Different conversations do not contend.
#[derive(Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a conversation. Held until the guard drops.
    pub async fn acquire(&self, conversation_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                locks
                    .entry(conversation_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Number of conversations currently tracked.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
