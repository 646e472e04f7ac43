//! Error types for the details bot.

/// Top-level error type for a turn.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Key/value store errors. Any of these means the turn was not applied.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),
}

/// Dialog errors. These are fatal for the conversation they occur in; the
/// conversation recovers once its state is reset.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("Conversation state is corrupt: {reason}")]
    StateCorruption { reason: String },

    #[error("Unknown dialog: {dialog_id}")]
    UnknownDialog { dialog_id: String },

    #[error("Unknown prompt: {name}")]
    UnknownPrompt { name: String },

    #[error("Step {step} out of range for dialog {dialog_id} ({len} steps)")]
    StepOutOfRange {
        dialog_id: String,
        step: usize,
        len: usize,
    },
}

impl DialogError {
    pub fn corruption(reason: impl Into<String>) -> Self {
        Self::StateCorruption {
            reason: reason.into(),
        }
    }
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
