use crate::{bot::message, event::events::Event};
use flume::Receiver;
use serenity::{http::Http, model::id::ChannelId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Posts background session events to the session's text channel until every
/// event sender is gone.
pub fn spawn(http: Arc<Http>, events: Receiver<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(event) = events.recv_async().await {
            debug!(guild = %event.guild(), ?event, "session_event");

            let Some(channel) = event.channel() else {
                continue;
            };
            let Some(text) = message::notification(&event) else {
                continue;
            };
            let text = message::fit(text);
            if let Err(err) = ChannelId::new(channel.0).say(&http, text).await {
                warn!(guild = %event.guild(), channel = %channel, error = %err, "notification_failed");
            }
        }
    })
}
