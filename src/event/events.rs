use crate::audio::ids::{ChannelId, GuildId};

/// What caused a session to change track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A user command; the command's own response already reports it.
    Command,
    /// The previous track ended on its own.
    TrackEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    IdleTimeout,
    Shutdown,
}

/// Notifications published by sessions for observers.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NowPlaying {
        guild: GuildId,
        channel: Option<ChannelId>,
        title: String,
        trigger: Trigger,
    },
    Repeating {
        guild: GuildId,
        channel: Option<ChannelId>,
        title: String,
    },
    TrackFailed {
        guild: GuildId,
        channel: Option<ChannelId>,
        title: String,
        error: String,
        trigger: Trigger,
    },
    QueueEnded {
        guild: GuildId,
        channel: Option<ChannelId>,
    },
    SessionClosed {
        guild: GuildId,
        channel: Option<ChannelId>,
        reason: CloseReason,
    },
}

impl Event {
    pub fn guild(&self) -> GuildId {
        match self {
            Event::NowPlaying { guild, .. }
            | Event::Repeating { guild, .. }
            | Event::TrackFailed { guild, .. }
            | Event::QueueEnded { guild, .. }
            | Event::SessionClosed { guild, .. } => *guild,
        }
    }

    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            Event::NowPlaying { channel, .. }
            | Event::Repeating { channel, .. }
            | Event::TrackFailed { channel, .. }
            | Event::QueueEnded { channel, .. }
            | Event::SessionClosed { channel, .. } => *channel,
        }
    }
}
