//! TurnDispatcher: runs one inbound event through the dialog and commits
//! the turn's state changes in a single batch.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::channels::{EventKind, InboundEvent};
use crate::dialog::{ConversationState, DETAILS, DialogStateMachine, DialogStatus};
use crate::error::Result;
use crate::profile::ProfileStore;
use crate::store::{KeyValueStore, StateWrite, scopes};

use super::locks::ConversationLocks;

/// Entry point for every inbound event.
pub struct TurnDispatcher {
    store: Arc<dyn KeyValueStore>,
    profiles: ProfileStore,
    machine: DialogStateMachine,
    locks: ConversationLocks,
}

impl TurnDispatcher {
    pub fn new(store: Arc<dyn KeyValueStore>, machine: DialogStateMachine) -> Self {
        Self {
            profiles: ProfileStore::new(Arc::clone(&store)),
            store,
            machine,
            locks: ConversationLocks::new(),
        }
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Handle an event, turning any failure into the generic apology.
    ///
    /// Failures are logged with full context and never leak to the user.
    pub async fn respond(&self, event: &InboundEvent) -> Vec<String> {
        match self.handle_event(event).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(
                    conversation_id = %event.conversation_id,
                    user_id = %event.user_id,
                    kind = %event.kind,
                    error = %e,
                    "Turn failed"
                );
                vec![self.machine.catalog().apology()]
            }
        }
    }

    /// Handle one inbound event.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<Vec<String>> {
        info!(
            conversation_id = %event.conversation_id,
            kind = %event.kind,
            "handle_event started"
        );
        let result = match &event.kind {
            EventKind::Message => {
                let text = event.text.as_deref().unwrap_or_default();
                self.handle_message(&event.conversation_id, &event.user_id, text)
                    .await
            }
            EventKind::Other(kind) => Ok(vec![self.machine.catalog().event_detected(kind)]),
        };
        info!(conversation_id = %event.conversation_id, "handle_event ended");
        result
    }

    /// Advance the conversation's dialog with one message.
    ///
    /// Nothing is written unless the whole turn succeeds. The profile write is
    /// ordered before the conversation write inside the commit batch.
    pub async fn handle_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<Vec<String>> {
        let _turn = self.locks.acquire(conversation_id).await;

        let mut state = self.load_conversation(conversation_id).await?;
        let mut profile = self.profiles.draft(user_id).await?;

        let mut turn = self.machine.continue_dialog(&mut state, text, &mut profile)?;
        if turn.status == DialogStatus::Empty {
            debug!(conversation_id, "No active dialog, starting {DETAILS}");
            turn = self.machine.begin(&mut state, DETAILS, &mut profile)?;
        }

        let mut writes = Vec::with_capacity(2);
        if let Some(write) = self.profiles.staged_write(user_id, &profile)? {
            writes.push(write);
        }
        writes.push(StateWrite::set(
            scopes::CONVERSATION,
            conversation_id,
            state.to_stored()?,
        ));
        self.store.commit(&writes).await?;

        debug!(
            conversation_id,
            user_id,
            status = ?turn.status,
            step = state.active().map(|f| f.step_index),
            profile_change = ?profile.change(),
            "Turn committed"
        );
        Ok(turn.messages)
    }

    /// Clear a conversation's dialog state. Returns whether any was stored.
    pub async fn reset_conversation(&self, conversation_id: &str) -> Result<bool> {
        let _turn = self.locks.acquire(conversation_id).await;
        let removed = self
            .store
            .delete(scopes::CONVERSATION, conversation_id)
            .await?;
        info!(conversation_id, removed, "Conversation state reset");
        Ok(removed)
    }

    async fn load_conversation(&self, conversation_id: &str) -> Result<ConversationState> {
        let stored = self
            .store
            .get(scopes::CONVERSATION, conversation_id)
            .await?;
        Ok(ConversationState::from_stored(stored)?)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::dialog::{DialogFrame, Locale};
    use crate::error::{DatabaseError, DialogError, Error};
    use crate::profile::UserProfile;
    use crate::store::MemoryStore;

    fn dispatcher() -> (Arc<MemoryStore>, TurnDispatcher) {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = TurnDispatcher::new(
            store.clone(),
            DialogStateMachine::with_details(Locale::English),
        );
        (store, dispatcher)
    }

    async fn say(d: &TurnDispatcher, text: &str) -> Vec<String> {
        d.handle_message("conv-1", "user-1", text).await.unwrap()
    }

    /// Start a conversation, then send each input.
    async fn converse(d: &TurnDispatcher, inputs: &[&str]) -> Vec<Vec<String>> {
        let mut replies = vec![say(d, "hi").await];
        for input in inputs {
            replies.push(say(d, input).await);
        }
        replies
    }

    #[tokio::test]
    async fn fresh_conversation_gets_name_prompt() {
        let (_, d) = dispatcher();
        assert_eq!(say(&d, "anything at all").await, vec!["What's your name?"]);
    }

    #[tokio::test]
    async fn full_dialog_persists_profile() {
        let (_, d) = dispatcher();
        converse(&d, &["Ken", "yes", "5", "yes"]).await;

        let profile = d.profiles().get("user-1").await.unwrap();
        assert_eq!(
            profile,
            UserProfile {
                name: Some("Ken".to_string()),
                age: Some(5)
            }
        );
    }

    #[tokio::test]
    async fn declined_age_scenario() {
        let (_, d) = dispatcher();
        let replies = converse(&d, &["Aki", "no", "yes"]).await;
        let all: Vec<&String> = replies.iter().flatten().collect();

        assert!(all.iter().any(|m| m.as_str() == "How mysterious!"));
        assert!(!all.iter().any(|m| m.contains("enter your age")));
        let summary = replies.last().unwrap().last().unwrap();
        assert!(summary.contains("Aki"));
        assert!(!summary.chars().any(|c| c.is_ascii_digit()));

        let profile = d.profiles().get("user-1").await.unwrap();
        assert_eq!(profile.age, Some(-1));
        assert_eq!(profile.name.as_deref(), Some("Aki"));
    }

    #[tokio::test]
    async fn declined_confirmation_deletes_profile() {
        let (_, d) = dispatcher();
        let replies = converse(&d, &["Mio", "yes", "30", "no"]).await;

        assert_eq!(
            replies.last().unwrap().last().unwrap(),
            "Then I'll forget about you instead of remembering!"
        );
        assert!(d.profiles().find("user-1").await.unwrap().is_none());
        assert_eq!(d.profiles().get("user-1").await.unwrap(), UserProfile::default());
    }

    #[tokio::test]
    async fn decline_removes_previously_stored_profile() {
        let (_, d) = dispatcher();
        converse(&d, &["Ken", "yes", "5", "yes"]).await;
        assert!(d.profiles().find("user-1").await.unwrap().is_some());

        // Second run of the dialog in the same conversation, declined at the end.
        converse(&d, &["Ken", "no", "no"]).await;
        assert!(d.profiles().find("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_input_is_idempotent() {
        let (store, d) = dispatcher();
        converse(&d, &["Ken", "yes"]).await;
        let before = store.get(scopes::CONVERSATION, "conv-1").await.unwrap();

        for _ in 0..3 {
            let replies = say(&d, "five").await;
            assert_eq!(replies.last().unwrap(), "Thank you! Please enter your age.");
            assert_eq!(store.get(scopes::CONVERSATION, "conv-1").await.unwrap(), before);
        }

        // A valid answer still moves on afterwards.
        assert_eq!(say(&d, "5").await, vec!["So you're 5 years old!", "Is this correct?"]);
    }

    #[tokio::test]
    async fn completed_dialog_restarts_on_next_message() {
        let (store, d) = dispatcher();
        converse(&d, &["Ken", "yes", "5", "yes"]).await;

        // State persisted even though the dialog is idle.
        let idle = store.get(scopes::CONVERSATION, "conv-1").await.unwrap().unwrap();
        assert_eq!(idle["dialog_stack"], serde_json::json!([]));

        assert_eq!(say(&d, "hello again").await, vec!["What's your name?"]);
    }

    #[tokio::test]
    async fn non_message_event_bypasses_dialog() {
        let (store, d) = dispatcher();
        let event = InboundEvent::other("conv-1", "user-1", "conversationUpdate");
        assert_eq!(
            d.handle_event(&event).await.unwrap(),
            vec!["conversationUpdate event detected"]
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn conversations_are_independent() {
        let (_, d) = dispatcher();
        d.handle_message("a", "ua", "hi").await.unwrap();
        d.handle_message("b", "ub", "hi").await.unwrap();
        d.handle_message("a", "ua", "Ken").await.unwrap();

        let b = d.handle_message("b", "ub", "Mio").await.unwrap();
        assert_eq!(b, vec!["Thanks, Mio!", "Would you tell me your age?"]);
        assert_eq!(
            d.profiles().get("ua").await.unwrap().name.as_deref(),
            Some("Ken")
        );
    }

    #[tokio::test]
    async fn corrupt_state_surfaces_and_reset_recovers() {
        let (store, d) = dispatcher();
        let mut frame = DialogFrame::new(DETAILS);
        frame.step_index = 99;
        let corrupt = ConversationState {
            dialog_stack: vec![frame],
        };
        store
            .set(scopes::CONVERSATION, "conv-1", &corrupt.to_stored().unwrap())
            .await
            .unwrap();

        let err = d.handle_message("conv-1", "user-1", "Ken").await.unwrap_err();
        assert!(matches!(err, Error::Dialog(DialogError::StateCorruption { .. })));

        let apology = d.respond(&InboundEvent::message("conv-1", "user-1", "Ken")).await;
        assert_eq!(apology, vec!["Sorry, it looks like something went wrong."]);

        assert!(d.reset_conversation("conv-1").await.unwrap());
        assert_eq!(say(&d, "Ken").await, vec!["What's your name?"]);
    }

    /// Store whose commits always fail.
    struct BrokenCommitStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for BrokenCommitStore {
        async fn get(
            &self,
            scope: &str,
            key: &str,
        ) -> std::result::Result<Option<serde_json::Value>, DatabaseError> {
            self.inner.get(scope, key).await
        }

        async fn set(
            &self,
            scope: &str,
            key: &str,
            value: &serde_json::Value,
        ) -> std::result::Result<(), DatabaseError> {
            self.inner.set(scope, key, value).await
        }

        async fn delete(&self, scope: &str, key: &str) -> std::result::Result<bool, DatabaseError> {
            self.inner.delete(scope, key).await
        }

        async fn commit(&self, _writes: &[StateWrite]) -> std::result::Result<(), DatabaseError> {
            Err(DatabaseError::Transaction("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_commit_applies_nothing() {
        let store = Arc::new(BrokenCommitStore {
            inner: MemoryStore::new(),
        });
        let d = TurnDispatcher::new(
            store.clone(),
            DialogStateMachine::with_details(Locale::English),
        );

        let err = d.handle_message("conv-1", "user-1", "hi").await.unwrap_err();
        assert!(matches!(err, Error::Database(DatabaseError::Transaction(_))));
        assert!(store.inner.is_empty().await);

        assert_eq!(
            d.respond(&InboundEvent::message("conv-1", "user-1", "hi")).await,
            vec!["Sorry, it looks like something went wrong."]
        );
    }
}
