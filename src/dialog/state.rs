//! Persisted per-conversation dialog state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DialogError;

/// A prompt a paused dialog is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Registered prompt name used to validate the next input.
    pub prompt: String,
    /// The question shown to the user, re-sent when input is rejected.
    pub question: String,
}

impl PromptRequest {
    pub fn new(prompt: &str, question: impl Into<String>) -> Self {
        Self {
            prompt: prompt.to_string(),
            question: question.into(),
        }
    }
}

/// One entry of the dialog stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogFrame {
    pub dialog_id: String,
    /// Index of the step that last ran (and, if `awaiting` is set, asked the
    /// pending question).
    pub step_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<PromptRequest>,
    /// Step-private values carried between turns.
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl DialogFrame {
    pub fn new(dialog_id: &str) -> Self {
        Self {
            dialog_id: dialog_id.to_string(),
            step_index: 0,
            awaiting: None,
            values: BTreeMap::new(),
        }
    }
}

/// Dialog state for one conversation.
///
/// Stored under the `conversation` scope, keyed by conversation id. Holds at
/// most one frame; an empty stack means no dialog is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    pub dialog_stack: Vec<DialogFrame>,
}

impl ConversationState {
    /// Decode a stored blob; `None` yields a fresh state.
    pub fn from_stored(value: Option<serde_json::Value>) -> Result<Self, DialogError> {
        match value {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| DialogError::corruption(format!("undecodable conversation state: {e}"))),
            None => Ok(Self::default()),
        }
    }

    pub fn to_stored(&self) -> Result<serde_json::Value, DialogError> {
        serde_json::to_value(self)
            .map_err(|e| DialogError::corruption(format!("unencodable conversation state: {e}")))
    }

    pub fn active(&self) -> Option<&DialogFrame> {
        self.dialog_stack.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut DialogFrame> {
        self.dialog_stack.last_mut()
    }

    pub fn has_active_dialog(&self) -> bool {
        !self.dialog_stack.is_empty()
    }

    pub fn push(&mut self, frame: DialogFrame) {
        self.dialog_stack.push(frame);
    }

    pub fn pop(&mut self) -> Option<DialogFrame> {
        self.dialog_stack.pop()
    }
}
