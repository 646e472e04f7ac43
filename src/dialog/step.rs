//! Step definitions: what a step sees and what it may ask the machine to do.

use std::collections::BTreeMap;

use crate::error::DialogError;
use crate::profile::ProfileDraft;

use super::catalog::Catalog;
use super::prompts::PromptValue;
use super::state::PromptRequest;

/// What happens after a step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Pause until the user answers this prompt.
    AwaitInput(PromptRequest),
    /// Run `to_step` right away with a synthesized answer.
    Advance { to_step: usize, value: PromptValue },
    /// Finish the dialog.
    End,
}

/// Messages a step emits plus the transition it chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub messages: Vec<String>,
    pub next: Next,
}

impl StepOutcome {
    pub fn await_input(prompt: &str, question: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            next: Next::AwaitInput(PromptRequest::new(prompt, question)),
        }
    }

    pub fn advance(to_step: usize, value: PromptValue) -> Self {
        Self {
            messages: Vec::new(),
            next: Next::Advance { to_step, value },
        }
    }

    pub fn end() -> Self {
        Self {
            messages: Vec::new(),
            next: Next::End,
        }
    }

    /// Emit a message before the transition takes effect.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

/// Everything a step may read or mutate.
pub struct StepContext<'a> {
    pub catalog: &'a Catalog,
    pub profile: &'a mut ProfileDraft,
    pub values: &'a mut BTreeMap<String, serde_json::Value>,
}

/// A step in a dialog. Receives `None` only when it is the first step.
pub type StepFn = fn(&mut StepContext<'_>, Option<PromptValue>) -> Result<StepOutcome, DialogError>;

/// A named, ordered sequence of steps.
pub struct Dialog {
    id: String,
    steps: Vec<StepFn>,
}

impl Dialog {
    pub fn new(id: &str, steps: Vec<StepFn>) -> Self {
        Self {
            id: id.to_string(),
            steps,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Result<StepFn, DialogError> {
        self.steps
            .get(index)
            .copied()
            .ok_or_else(|| DialogError::StepOutOfRange {
                dialog_id: self.id.clone(),
                step: index,
                len: self.steps.len(),
            })
    }
}

/// Pull the text answer out of a step's input.
pub fn expect_text(value: Option<PromptValue>) -> Result<String, DialogError> {
    match value {
        Some(PromptValue::Text(s)) => Ok(s),
        other => Err(mismatch("text", other)),
    }
}

/// Pull the integer answer out of a step's input.
pub fn expect_integer(value: Option<PromptValue>) -> Result<i64, DialogError> {
    match value {
        Some(PromptValue::Integer(n)) => Ok(n),
        other => Err(mismatch("integer", other)),
    }
}

/// Pull the yes/no answer out of a step's input.
pub fn expect_confirm(value: Option<PromptValue>) -> Result<bool, DialogError> {
    match value {
        Some(PromptValue::Confirm(b)) => Ok(b),
        other => Err(mismatch("confirm", other)),
    }
}

fn mismatch(expected: &str, got: Option<PromptValue>) -> DialogError {
    DialogError::corruption(format!("step expected a {expected} answer, got {got:?}"))
}
