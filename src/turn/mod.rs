//! Turn handling: one inbound event in, the bot's replies out.

pub mod dispatcher;
pub mod locks;

pub use dispatcher::TurnDispatcher;
pub use locks::ConversationLocks;
