//! Drives a streaming channel through the dispatcher until it ends.

use futures::StreamExt;

use crate::channels::Channel;
use crate::error::Error;
use crate::turn::TurnDispatcher;

/// Feed every event from `channel` to the dispatcher and deliver the replies.
///
/// Returns when the stream ends or Ctrl+C is received. Delivery failures are
/// logged and do not stop the loop.
pub async fn run_channel(channel: &dyn Channel, dispatcher: &TurnDispatcher) -> Result<(), Error> {
    let mut events = channel.start().await?;
    tracing::info!(channel = channel.name(), "Channel ready and listening");

    loop {
        let event = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down...");
                break;
            }
            event = events.next() => {
                match event {
                    Some(e) => e,
                    None => {
                        tracing::info!(channel = channel.name(), "Channel stream ended");
                        break;
                    }
                }
            }
        };

        let messages = dispatcher.respond(&event).await;
        if messages.is_empty() {
            continue;
        }
        if let Err(e) = channel.respond(&event, &messages).await {
            tracing::error!(channel = channel.name(), error = %e, "Failed to deliver replies");
        }
    }

    Ok(())
}
