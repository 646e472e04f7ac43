//! Dialog system: prompts, step tables, and the state machine that walks a
//! conversation through them.
//!
//! A dialog is an ordered list of steps. Each step receives the answer to the
//! previous step's prompt and either asks a new question, jumps straight to
//! another step with a synthesized answer, or ends the dialog. The state
//! between turns is a [`ConversationState`] persisted by the caller.

pub mod catalog;
pub mod details;
pub mod machine;
pub mod prompts;
pub mod state;
pub mod step;

pub use catalog::{Catalog, Locale};
pub use details::{DETAILS, details_dialog};
pub use machine::{DialogStateMachine, DialogStatus, DialogTurn};
pub use prompts::{PromptKind, PromptOutcome, PromptRegistry, PromptValue};
pub use state::{ConversationState, DialogFrame, PromptRequest};
pub use step::{Dialog, Next, StepContext, StepFn, StepOutcome};
