use crate::{
    audio::{
        controller::SessionHandle,
        error::{CommandError, PreconditionError},
        ids::{ChannelId, GuildId},
        registry::SessionRegistry,
        traits::TrackResolver,
    },
    bot::{command::Command, message},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub guild: GuildId,
    pub text_channel: ChannelId,
    /// Voice channel the invoking user currently sits in.
    pub user_voice: Option<ChannelId>,
}

/// Checks preconditions, drives the guild's session and renders exactly one
/// reply per command. Shared by the prefix and slash front ends.
pub struct CommandHandler {
    registry: Arc<SessionRegistry>,
    resolver: Arc<dyn TrackResolver>,
    prefix: String,
    queue_display_limit: usize,
}

impl CommandHandler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        resolver: Arc<dyn TrackResolver>,
        prefix: impl Into<String>,
        queue_display_limit: usize,
    ) -> Self {
        Self {
            registry,
            resolver,
            prefix: prefix.into(),
            queue_display_limit,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub async fn handle(&self, invocation: &Invocation, command: Command) -> String {
        let name = command.name();
        info!(guild = %invocation.guild, command = name, "command_received");

        let reply = match self.execute(invocation, command).await {
            Ok(reply) => reply,
            Err(err) => {
                match &err {
                    CommandError::Precondition(_) | CommandError::Index(_) => {
                        debug!(guild = %invocation.guild, command = name, error = %err, "command_rejected")
                    }
                    _ => warn!(guild = %invocation.guild, command = name, error = %err, "command_failed"),
                }
                message::error(&err)
            }
        };
        message::fit(reply)
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        command: Command,
    ) -> Result<String, CommandError> {
        match command {
            Command::Play(query) => {
                let voice = invocation
                    .user_voice
                    .ok_or(PreconditionError::NotInVoiceChannel)?;
                let track = self.resolver.resolve(&query).await?;

                let session = self.registry.get_or_create(invocation.guild).await;
                session.connect(voice, invocation.text_channel).await?;
                let result = session.enqueue(track).await?;
                Ok(message::enqueued(&result))
            }
            Command::PlaySkip(query) => {
                let voice = invocation
                    .user_voice
                    .ok_or(PreconditionError::NotInVoiceChannel)?;
                let track = self.resolver.resolve(&query).await?;

                let session = self.registry.get_or_create(invocation.guild).await;
                session.connect(voice, invocation.text_channel).await?;
                let outcome = session.play_next(track).await?;
                Ok(message::advanced(&outcome))
            }
            Command::Pause => {
                self.connected(invocation.guild).await?.pause().await?;
                Ok(message::PAUSED.to_string())
            }
            Command::Resume => {
                self.connected(invocation.guild).await?.resume().await?;
                Ok(message::RESUMED.to_string())
            }
            Command::Stop => {
                self.connected(invocation.guild).await?.stop().await?;
                Ok(message::STOPPED.to_string())
            }
            Command::Skip => {
                let outcome = self.connected(invocation.guild).await?.skip().await?;
                Ok(message::skipped(&outcome))
            }
            Command::Loop => {
                let enabled = self.connected(invocation.guild).await?.toggle_loop().await?;
                Ok(message::loop_status(enabled))
            }
            Command::Select(index) => {
                let track = self.connected(invocation.guild).await?.select(index).await?;
                Ok(message::selected(&track))
            }
            Command::Queue => {
                let entries = match self.registry.get(invocation.guild).await {
                    Some(session) => session.list().await?,
                    None => Vec::new(),
                };
                Ok(message::queue_listing(&entries, self.queue_display_limit))
            }
            Command::Help => Ok(message::help(&self.prefix)),
        }
    }

    /// The guild's session, provided the bot sits in a voice channel there.
    async fn connected(&self, guild: GuildId) -> Result<SessionHandle, CommandError> {
        let session = self
            .registry
            .get(guild)
            .await
            .ok_or(PreconditionError::NotConnected)?;
        if !session.status().await?.connected {
            return Err(PreconditionError::NotConnected.into());
        }
        Ok(session)
    }
}
