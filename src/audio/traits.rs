use crate::audio::{
    commands::SessionCommand,
    error::{ResolveError, SinkError},
    ids::{ChannelId, GuildId},
    track::PlayableTrack,
};
use async_trait::async_trait;
use flume::WeakSender;
use std::sync::Arc;

#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// `query` is either a URL or free-text search terms.
    async fn resolve(&self, query: &str) -> Result<PlayableTrack, ResolveError>;
}

/// A single-stream audio output bound to one guild.
#[async_trait]
pub trait VoiceSink: Send + Sync {
    /// Joins `channel`, moving out of any other channel in the guild.
    async fn connect(&self, channel: ChannelId) -> Result<(), SinkError>;
    /// Starts `track`, replacing anything already playing. `on_end` must be
    /// notified when the track finishes, fails, or is stopped.
    async fn play(&self, track: &PlayableTrack, on_end: TrackEndNotifier) -> Result<(), SinkError>;
    fn pause(&self) -> Result<(), SinkError>;
    fn resume(&self) -> Result<(), SinkError>;
    fn stop(&self);
    async fn disconnect(&self);
    fn is_playing(&self) -> bool;
    fn is_paused(&self) -> bool;
    /// Voice channel the bot currently sits in. Goes back to `None` when the
    /// bot is disconnected from outside, such as being kicked.
    fn channel(&self) -> Option<ChannelId>;

    fn is_connected(&self) -> bool {
        self.channel().is_some()
    }
}

pub trait VoiceBackend: Send + Sync {
    fn sink_for(&self, guild: GuildId) -> Arc<dyn VoiceSink>;
}

/// Completion token handed to the sink with every `play`.
///
/// Consumed on use, so a single hand-off can report its end at most once.
/// Holds the session weakly: a track still playing does not keep a dropped
/// session alive.
pub struct TrackEndNotifier {
    guild: GuildId,
    generation: u64,
    commands: WeakSender<SessionCommand>,
}

impl std::fmt::Debug for TrackEndNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackEndNotifier")
            .field("guild", &self.guild)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl TrackEndNotifier {
    pub(crate) fn new(
        guild: GuildId,
        generation: u64,
        commands: WeakSender<SessionCommand>,
    ) -> Self {
        Self {
            guild,
            generation,
            commands,
        }
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn notify(self, error: Option<SinkError>) {
        if let Some(commands) = self.commands.upgrade() {
            let _ = commands.send(SessionCommand::TrackEnded {
                generation: self.generation,
                error,
            });
        }
    }
}
