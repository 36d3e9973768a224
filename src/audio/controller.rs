use crate::audio::{
    commands::{Reply, SessionCommand},
    config::SessionConfig,
    error::CommandError,
    ids::{ChannelId, GuildId},
    state::{Advanced, EnqueueResult, QueueEntry, SessionStatus},
    system::Session,
    track::PlayableTrack,
    traits::VoiceSink,
};
use crate::event::events::{CloseReason, Event};
use flume::{Receiver, Sender};
use std::{ops::ControlFlow, sync::Arc};
use tokio::sync::oneshot;
use tracing::info;

/// Cloneable front door to a session actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    guild: GuildId,
    commands: Sender<SessionCommand>,
}

impl SessionHandle {
    /// Starts the actor task that owns the session for `guild`.
    pub fn spawn(
        guild: GuildId,
        sink: Arc<dyn VoiceSink>,
        events: Sender<Event>,
        config: SessionConfig,
    ) -> Self {
        let (commands, inbox) = flume::unbounded();
        let session = Session::new(guild, sink, events, commands.downgrade(), config);
        tokio::spawn(run(session, inbox));

        Self { guild, commands }
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    /// True once the actor has exited.
    pub fn is_closed(&self) -> bool {
        self.commands.is_disconnected()
    }

    pub async fn connect(&self, voice: ChannelId, text: ChannelId) -> Result<(), CommandError> {
        Ok(self
            .request(|reply| SessionCommand::Connect { voice, text, reply })
            .await??)
    }

    pub async fn enqueue(&self, track: PlayableTrack) -> Result<EnqueueResult, CommandError> {
        self.request(|reply| SessionCommand::Enqueue { track, reply })
            .await
    }

    pub async fn play_next(&self, track: PlayableTrack) -> Result<Advanced, CommandError> {
        self.request(|reply| SessionCommand::PlayNext { track, reply })
            .await
    }

    pub async fn skip(&self) -> Result<Advanced, CommandError> {
        Ok(self.request(|reply| SessionCommand::Skip { reply }).await??)
    }

    pub async fn pause(&self) -> Result<(), CommandError> {
        self.request(|reply| SessionCommand::Pause { reply }).await?
    }

    pub async fn resume(&self) -> Result<(), CommandError> {
        self.request(|reply| SessionCommand::Resume { reply }).await?
    }

    pub async fn stop(&self) -> Result<(), CommandError> {
        self.request(|reply| SessionCommand::Stop { reply }).await
    }

    pub async fn toggle_loop(&self) -> Result<bool, CommandError> {
        Ok(self
            .request(|reply| SessionCommand::SetLoop {
                enabled: None,
                reply,
            })
            .await??)
    }

    pub async fn set_loop(&self, enabled: bool) -> Result<bool, CommandError> {
        Ok(self
            .request(|reply| SessionCommand::SetLoop {
                enabled: Some(enabled),
                reply,
            })
            .await??)
    }

    pub async fn select(&self, index: i64) -> Result<PlayableTrack, CommandError> {
        self.request(|reply| SessionCommand::Select { index, reply })
            .await?
    }

    pub async fn list(&self) -> Result<Vec<QueueEntry>, CommandError> {
        self.request(|reply| SessionCommand::List { reply }).await
    }

    pub async fn status(&self) -> Result<SessionStatus, CommandError> {
        self.request(|reply| SessionCommand::Status { reply }).await
    }

    /// Stops playback, leaves the channel and ends the actor.
    pub async fn shutdown(&self) {
        let _ = self
            .request(|reply| SessionCommand::Shutdown { reply })
            .await;
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, CommandError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send_async(build(reply))
            .await
            .map_err(|_| CommandError::SessionClosed)?;
        response.await.map_err(|_| CommandError::SessionClosed)
    }
}

async fn run(mut session: Session, inbox: Receiver<SessionCommand>) {
    let guild = session.guild();
    info!(%guild, "session_started");

    loop {
        let idle_timeout = session.idle_timeout().filter(|_| session.is_idle());
        let command = match idle_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, inbox.recv_async()).await {
                Ok(Ok(command)) => command,
                Ok(Err(_)) => {
                    session.close(CloseReason::Shutdown).await;
                    break;
                }
                Err(_) => {
                    info!(%guild, "session_idle_timeout");
                    session.close(CloseReason::IdleTimeout).await;
                    break;
                }
            },
            None => match inbox.recv_async().await {
                Ok(command) => command,
                Err(_) => {
                    session.close(CloseReason::Shutdown).await;
                    break;
                }
            },
        };

        if let ControlFlow::Break(()) = session.handle(command).await {
            break;
        }
    }

    info!(%guild, "session_finished");
}
