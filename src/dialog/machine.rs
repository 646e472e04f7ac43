//! DialogStateMachine: drives a conversation's dialog frame through its
//! step table, one turn at a time.
//!
//! The machine is synchronous and does no I/O. Profile mutations go into the
//! caller's [`ProfileDraft`]; the caller decides whether to persist them.

use std::collections::HashMap;

use crate::error::DialogError;
use crate::profile::ProfileDraft;

use super::catalog::{Catalog, Locale};
use super::details::details_dialog;
use super::prompts::{PromptOutcome, PromptRegistry, PromptValue};
use super::state::{ConversationState, DialogFrame};
use super::step::{Dialog, Next, StepContext};

/// Where the dialog stands after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogStatus {
    /// No dialog was active; nothing happened.
    Empty,
    /// The dialog is paused on a prompt.
    Waiting,
    /// The dialog ended this turn.
    Complete,
}

/// Result of `begin` / `continue_dialog`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogTurn {
    pub status: DialogStatus,
    pub messages: Vec<String>,
}

impl DialogTurn {
    fn empty() -> Self {
        Self {
            status: DialogStatus::Empty,
            messages: Vec::new(),
        }
    }
}

/// Step sequencer holding the registered dialogs and prompts.
pub struct DialogStateMachine {
    catalog: Catalog,
    prompts: PromptRegistry,
    dialogs: HashMap<String, Dialog>,
}

impl DialogStateMachine {
    /// Create a machine with the default prompts and no dialogs.
    pub fn new(locale: Locale) -> Self {
        let catalog = Catalog::new(locale);
        Self {
            catalog,
            prompts: PromptRegistry::with_defaults(catalog),
            dialogs: HashMap::new(),
        }
    }

    /// Create a machine with the `details` dialog registered.
    pub fn with_details(locale: Locale) -> Self {
        let mut machine = Self::new(locale);
        machine.add_dialog(details_dialog());
        machine
    }

    pub fn add_dialog(&mut self, dialog: Dialog) {
        tracing::debug!(dialog = dialog.id(), steps = dialog.len(), "Registered dialog");
        self.dialogs.insert(dialog.id().to_string(), dialog);
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Push a new dialog and run its first step.
    pub fn begin(
        &self,
        state: &mut ConversationState,
        dialog_id: &str,
        profile: &mut ProfileDraft,
    ) -> Result<DialogTurn, DialogError> {
        let dialog = self
            .dialogs
            .get(dialog_id)
            .ok_or_else(|| DialogError::UnknownDialog {
                dialog_id: dialog_id.to_string(),
            })?;
        if let Some(active) = state.active() {
            return Err(DialogError::corruption(format!(
                "cannot begin {dialog_id}: {} is already active",
                active.dialog_id
            )));
        }

        state.push(DialogFrame::new(dialog_id));
        self.run_steps(state, dialog, 0, None, profile)
    }

    /// Feed one user input to the active dialog.
    ///
    /// Returns [`DialogStatus::Empty`] without touching anything when no
    /// dialog is active. Invalid input re-asks the pending question and leaves
    /// the state as it was.
    pub fn continue_dialog(
        &self,
        state: &mut ConversationState,
        input: &str,
        profile: &mut ProfileDraft,
    ) -> Result<DialogTurn, DialogError> {
        if state.dialog_stack.len() > 1 {
            return Err(DialogError::corruption(format!(
                "{} dialogs stacked, at most one may be active",
                state.dialog_stack.len()
            )));
        }
        let Some(frame) = state.active() else {
            return Ok(DialogTurn::empty());
        };

        let dialog = self.dialogs.get(&frame.dialog_id).ok_or_else(|| {
            DialogError::corruption(format!("unknown dialog id {}", frame.dialog_id))
        })?;
        // A paused step and the step that will take its answer must both exist.
        if frame.step_index + 1 >= dialog.len() {
            return Err(DialogError::corruption(format!(
                "{} cannot resume after step {} ({} steps)",
                frame.dialog_id,
                frame.step_index,
                dialog.len()
            )));
        }
        let awaiting = frame.awaiting.clone().ok_or_else(|| {
            DialogError::corruption(format!(
                "{} step {} is active but not awaiting input",
                frame.dialog_id, frame.step_index
            ))
        })?;

        match self.prompts.validate(&awaiting.prompt, input)? {
            PromptOutcome::Invalid { reprompt } => {
                tracing::debug!(
                    dialog = %frame.dialog_id,
                    step = frame.step_index,
                    prompt = %awaiting.prompt,
                    "Input rejected, asking again"
                );
                Ok(DialogTurn {
                    status: DialogStatus::Waiting,
                    messages: vec![reprompt, awaiting.question],
                })
            }
            PromptOutcome::Valid(value) => {
                let next = frame.step_index + 1;
                self.run_steps(state, dialog, next, Some(value), profile)
            }
        }
    }

    /// Run steps starting at `step` until one pauses or ends the dialog.
    fn run_steps(
        &self,
        state: &mut ConversationState,
        dialog: &Dialog,
        mut step: usize,
        mut value: Option<PromptValue>,
        profile: &mut ProfileDraft,
    ) -> Result<DialogTurn, DialogError> {
        let mut messages = Vec::new();

        // Each step can advance at most once per step in the table.
        for _ in 0..=dialog.len() {
            let step_fn = dialog.step(step)?;
            let frame = state
                .active_mut()
                .ok_or_else(|| DialogError::corruption("dialog frame vanished mid-turn"))?;
            frame.step_index = step;
            frame.awaiting = None;

            let mut ctx = StepContext {
                catalog: &self.catalog,
                profile: &mut *profile,
                values: &mut frame.values,
            };
            let outcome = step_fn(&mut ctx, value.take())?;
            messages.extend(outcome.messages);

            match outcome.next {
                Next::AwaitInput(request) => {
                    if !self.prompts.has(&request.prompt) {
                        return Err(DialogError::UnknownPrompt {
                            name: request.prompt,
                        });
                    }
                    tracing::debug!(
                        dialog = dialog.id(),
                        step,
                        prompt = %request.prompt,
                        "Dialog waiting for input"
                    );
                    messages.push(request.question.clone());
                    frame.awaiting = Some(request);
                    return Ok(DialogTurn {
                        status: DialogStatus::Waiting,
                        messages,
                    });
                }
                Next::Advance { to_step, value: v } => {
                    tracing::debug!(dialog = dialog.id(), from = step, to = to_step, "Advancing without input");
                    step = to_step;
                    value = Some(v);
                }
                Next::End => {
                    state.pop();
                    tracing::debug!(dialog = dialog.id(), "Dialog ended");
                    return Ok(DialogTurn {
                        status: DialogStatus::Complete,
                        messages,
                    });
                }
            }
        }

        Err(DialogError::corruption(format!(
            "{} kept advancing without settling",
            dialog.id()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::details::DETAILS;
    use crate::dialog::prompts::names;
    use crate::dialog::state::PromptRequest;
    use crate::dialog::step::{StepFn, StepOutcome};
    use crate::profile::{ProfileChange, UserProfile};

    fn machine() -> DialogStateMachine {
        DialogStateMachine::with_details(Locale::English)
    }

    /// Begin the details dialog, then feed each input in turn.
    fn drive(
        m: &DialogStateMachine,
        inputs: &[&str],
    ) -> (ConversationState, ProfileDraft, Vec<DialogTurn>) {
        let mut state = ConversationState::default();
        let mut profile = ProfileDraft::new(UserProfile::default());
        let mut turns = vec![m.begin(&mut state, DETAILS, &mut profile).unwrap()];
        for input in inputs {
            turns.push(m.continue_dialog(&mut state, input, &mut profile).unwrap());
        }
        (state, profile, turns)
    }

    #[test]
    fn idle_conversation_is_empty() {
        let m = machine();
        let mut state = ConversationState::default();
        let mut profile = ProfileDraft::new(UserProfile::default());
        let turn = m.continue_dialog(&mut state, "hello", &mut profile).unwrap();
        assert_eq!(turn.status, DialogStatus::Empty);
        assert!(turn.messages.is_empty());
        assert_eq!(state, ConversationState::default());
    }

    #[test]
    fn begin_emits_only_name_prompt() {
        let (state, _, turns) = drive(&machine(), &[]);
        assert_eq!(turns[0].status, DialogStatus::Waiting);
        assert_eq!(turns[0].messages, vec!["What's your name?"]);
        let frame = state.active().unwrap();
        assert_eq!(frame.step_index, 0);
        assert_eq!(frame.awaiting.as_ref().unwrap().prompt, names::TEXT);
    }

    #[test]
    fn full_run_records_literal_inputs() {
        let (state, profile, turns) = drive(&machine(), &["Ken", "yes", "5", "yes"]);
        assert_eq!(
            profile.profile(),
            &UserProfile {
                name: Some("Ken".to_string()),
                age: Some(5)
            }
        );
        assert_eq!(profile.change(), ProfileChange::Updated);
        assert!(!state.has_active_dialog());
        let last = turns.last().unwrap();
        assert_eq!(last.status, DialogStatus::Complete);
        assert_eq!(last.messages, vec!["You're Ken, 5 years old!"]);
    }

    #[test]
    fn declining_age_skips_age_prompt_in_same_turn() {
        let (state, profile, turns) = drive(&machine(), &["Aki", "no"]);
        assert_eq!(
            turns[2].messages,
            vec!["How mysterious!", "Is this correct?"]
        );
        assert_eq!(profile.profile().age, Some(-1));
        let frame = state.active().unwrap();
        assert_eq!(frame.step_index, 3);
        assert_eq!(frame.awaiting.as_ref().unwrap().prompt, names::CONFIRM);
    }

    #[test]
    fn invalid_input_repeats_question_without_advancing() {
        let m = machine();
        let (mut state, mut profile, _) = drive(&m, &["Ken", "yes"]);
        let before = state.clone();

        for _ in 0..3 {
            let turn = m.continue_dialog(&mut state, "old", &mut profile).unwrap();
            assert_eq!(turn.status, DialogStatus::Waiting);
            assert_eq!(
                turn.messages,
                vec!["Please enter a whole number.", "Thank you! Please enter your age."]
            );
            assert_eq!(state, before);
        }
        assert_eq!(profile.profile().age, None);
    }

    #[test]
    fn declining_confirmation_forgets_profile() {
        let (_, profile, turns) = drive(&machine(), &["Mio", "yes", "30", "no"]);
        assert_eq!(profile.change(), ProfileChange::Deleted);
        assert!(profile.profile().is_empty());
        assert_eq!(
            turns.last().unwrap().messages.last().unwrap(),
            "Then I'll forget about you instead of remembering!"
        );
    }

    #[test]
    fn begin_while_active_is_rejected() {
        let m = machine();
        let (mut state, mut profile, _) = drive(&m, &[]);
        assert!(matches!(
            m.begin(&mut state, DETAILS, &mut profile),
            Err(DialogError::StateCorruption { .. })
        ));
    }

    #[test]
    fn begin_unknown_dialog() {
        let m = machine();
        let mut state = ConversationState::default();
        let mut profile = ProfileDraft::new(UserProfile::default());
        assert!(matches!(
            m.begin(&mut state, "survey", &mut profile),
            Err(DialogError::UnknownDialog { .. })
        ));
        assert!(!state.has_active_dialog());
    }

    #[test]
    fn corrupt_step_index_is_reported() {
        let m = machine();
        let mut state = ConversationState::default();
        let mut frame = DialogFrame::new(DETAILS);
        frame.step_index = 42;
        frame.awaiting = Some(PromptRequest::new(names::TEXT, "?"));
        state.push(frame);
        let mut profile = ProfileDraft::new(UserProfile::default());

        let err = m.continue_dialog(&mut state, "Ken", &mut profile).unwrap_err();
        assert!(matches!(err, DialogError::StateCorruption { .. }));
        assert!(err.to_string().contains("after step 42"));
    }

    #[test]
    fn waiting_on_last_step_is_corrupt() {
        let m = machine();
        let mut state = ConversationState::default();
        let mut frame = DialogFrame::new(DETAILS);
        frame.step_index = 4;
        frame.awaiting = Some(PromptRequest::new(names::CONFIRM, "Is this correct?"));
        state.push(frame);
        let mut profile = ProfileDraft::new(UserProfile::default());
        let before = state.clone();

        let err = m.continue_dialog(&mut state, "yes", &mut profile).unwrap_err();
        assert!(matches!(err, DialogError::StateCorruption { .. }));
        assert_eq!(state, before);
        assert_eq!(profile.change(), ProfileChange::Unchanged);
    }

    #[test]
    fn stacked_frames_are_corrupt() {
        let m = machine();
        let (mut state, mut profile, _) = drive(&m, &[]);
        let mut second = DialogFrame::new(DETAILS);
        second.awaiting = Some(PromptRequest::new(names::TEXT, "What's your name?"));
        state.push(second);
        let before = state.clone();

        let err = m.continue_dialog(&mut state, "Ken", &mut profile).unwrap_err();
        assert!(matches!(err, DialogError::StateCorruption { .. }));
        assert!(err.to_string().contains("2 dialogs stacked"));
        assert_eq!(state, before);
    }

    #[test]
    fn corrupt_dialog_id_is_reported() {
        let m = machine();
        let mut state = ConversationState::default();
        state.push(DialogFrame::new("gone"));
        let mut profile = ProfileDraft::new(UserProfile::default());

        assert!(matches!(
            m.continue_dialog(&mut state, "Ken", &mut profile),
            Err(DialogError::StateCorruption { .. })
        ));
    }

    #[test]
    fn frame_without_awaiting_prompt_is_corrupt() {
        let m = machine();
        let mut state = ConversationState::default();
        state.push(DialogFrame::new(DETAILS));
        let mut profile = ProfileDraft::new(UserProfile::default());

        assert!(matches!(
            m.continue_dialog(&mut state, "Ken", &mut profile),
            Err(DialogError::StateCorruption { .. })
        ));
    }

    fn loop_forever(
        _: &mut StepContext<'_>,
        _: Option<PromptValue>,
    ) -> Result<StepOutcome, DialogError> {
        Ok(StepOutcome::advance(0, PromptValue::Confirm(true)))
    }

    #[test]
    fn runaway_advance_chain_is_stopped() {
        let mut m = DialogStateMachine::new(Locale::English);
        m.add_dialog(Dialog::new("loop", vec![loop_forever as StepFn]));
        let mut state = ConversationState::default();
        let mut profile = ProfileDraft::new(UserProfile::default());

        assert!(matches!(
            m.begin(&mut state, "loop", &mut profile),
            Err(DialogError::StateCorruption { .. })
        ));
    }
}
