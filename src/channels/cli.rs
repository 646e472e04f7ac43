//! CLI channel: stdin/stdout REPL for local testing.

use std::io::Write;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::channels::{Channel, EventStream, InboundEvent};
use crate::error::ChannelError;

/// Reads lines from stdin as messages in a single conversation and prints
/// replies to stdout.
pub struct CliChannel {
    conversation_id: String,
    user_id: String,
}

impl CliChannel {
    /// A channel with a fresh conversation id per process.
    pub fn new() -> Self {
        Self {
            conversation_id: format!("cli-{}", Uuid::new_v4()),
            user_id: "local-user".to_string(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Event announcing the session, sent before any input is read.
    fn greeting(&self) -> InboundEvent {
        InboundEvent::other(&self.conversation_id, &self.user_id, "conversationUpdate")
    }

    /// Turn one stdin line into a message event. Blank lines are skipped.
    fn line_event(&self, line: &str) -> Option<InboundEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(InboundEvent::message(
            &self.conversation_id,
            &self.user_id,
            line,
        ))
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tx.send(self.greeting())
            .map_err(|e| ChannelError::StartupFailed {
                name: "cli".to_string(),
                reason: e.to_string(),
            })?;

        let channel = Self {
            conversation_id: self.conversation_id.clone(),
            user_id: self.user_id.clone(),
        };
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(event) = channel.line_event(&line) else {
                            eprint!("> ");
                            continue;
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(&self, _event: &InboundEvent, messages: &[String]) -> Result<(), ChannelError> {
        write_replies(&mut std::io::stdout().lock(), messages)?;
        eprint!("> ");
        Ok(())
    }
}

/// Write each reply on its own line and flush.
fn write_replies(out: &mut impl Write, messages: &[String]) -> Result<(), ChannelError> {
    let send_failed = |e: std::io::Error| ChannelError::SendFailed {
        name: "cli".to_string(),
        reason: e.to_string(),
    };
    for message in messages {
        writeln!(out, "{message}").map_err(send_failed)?;
    }
    out.flush().map_err(send_failed)
}
