//! Prompt registry: named input validators.
//!
//! A prompt turns raw user text into a typed [`PromptValue`], or reports why
//! the input was rejected so the dialog can ask again.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DialogError;

use super::catalog::Catalog;

/// Names of the built-in prompts.
pub mod names {
    pub const TEXT: &str = "text";
    pub const INTEGER: &str = "integer";
    pub const CONFIRM: &str = "confirm";
}

/// How a prompt interprets input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Any non-empty text.
    Text,
    /// A base-10 integer.
    Integer,
    /// A yes/no answer from the locale's vocabulary.
    Confirm,
}

/// A successfully validated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PromptValue {
    Text(String),
    Integer(i64),
    Confirm(bool),
}

/// Result of validating raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Valid(PromptValue),
    /// Input rejected; `reprompt` tells the user what is accepted.
    Invalid { reprompt: String },
}

/// Registry of named prompts for one locale.
pub struct PromptRegistry {
    catalog: Catalog,
    prompts: HashMap<String, PromptKind>,
}

impl PromptRegistry {
    /// Create an empty registry.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            prompts: HashMap::new(),
        }
    }

    /// Create a registry with the `text`, `integer` and `confirm` prompts.
    pub fn with_defaults(catalog: Catalog) -> Self {
        let mut registry = Self::new(catalog);
        registry.register(names::TEXT, PromptKind::Text);
        registry.register(names::INTEGER, PromptKind::Integer);
        registry.register(names::CONFIRM, PromptKind::Confirm);
        registry
    }

    /// Register (or replace) a prompt.
    pub fn register(&mut self, name: &str, kind: PromptKind) {
        self.prompts.insert(name.to_string(), kind);
        tracing::debug!(prompt = name, ?kind, "Registered prompt");
    }

    pub fn get(&self, name: &str) -> Option<PromptKind> {
        self.prompts.get(name).copied()
    }

    pub fn has(&self, name: &str) -> bool {
        self.prompts.contains_key(name)
    }

    /// All registered prompt names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.prompts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate raw input against a named prompt. Pure.
    pub fn validate(&self, name: &str, raw: &str) -> Result<PromptOutcome, DialogError> {
        let kind = self.get(name).ok_or_else(|| DialogError::UnknownPrompt {
            name: name.to_string(),
        })?;
        let input = raw.trim();

        let outcome = match kind {
            PromptKind::Text => {
                if input.is_empty() {
                    self.invalid(self.catalog.reprompt_text())
                } else {
                    PromptOutcome::Valid(PromptValue::Text(input.to_string()))
                }
            }
            PromptKind::Integer => match input.parse::<i64>() {
                Ok(n) => PromptOutcome::Valid(PromptValue::Integer(n)),
                Err(_) => self.invalid(self.catalog.reprompt_integer()),
            },
            PromptKind::Confirm => match self.parse_confirm(input) {
                Some(answer) => PromptOutcome::Valid(PromptValue::Confirm(answer)),
                None => {
                    let (yes, no) = self.catalog.confirm_vocabulary();
                    self.invalid(self.catalog.reprompt_confirm(yes, no))
                }
            },
        };
        Ok(outcome)
    }

    fn parse_confirm(&self, input: &str) -> Option<bool> {
        let lower = input.to_lowercase();
        let (yes, no) = self.catalog.confirm_vocabulary();
        if yes.contains(&lower.as_str()) {
            Some(true)
        } else if no.contains(&lower.as_str()) {
            Some(false)
        } else {
            None
        }
    }

    fn invalid(&self, reprompt: String) -> PromptOutcome {
        PromptOutcome::Invalid { reprompt }
    }
}
