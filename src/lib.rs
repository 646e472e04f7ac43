//! Details bot: a turn-based conversational bot that collects a user's name
//! and age through a short guided dialog.

pub mod channels;
pub mod config;
pub mod dialog;
pub mod error;
pub mod profile;
pub mod store;
pub mod turn;
