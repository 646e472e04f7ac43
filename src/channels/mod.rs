//! Channel abstraction for inbound events and replies.

pub mod channel;
pub mod cli;
pub mod http;
pub mod runner;

pub use channel::*;
pub use cli::CliChannel;
pub use http::{RouteState, TurnReply, bot_routes, with_static_files};
pub use runner::run_channel;
