use tokio::sync::oneshot;

use super::{
    error::{CommandError, PreconditionError, SinkError},
    ids::ChannelId,
    state::{Advanced, EnqueueResult, QueueEntry, SessionStatus},
    track::PlayableTrack,
};

pub type Reply<T> = oneshot::Sender<T>;

/// Everything that mutates or reads a session goes through one of these.
#[derive(Debug)]
pub enum SessionCommand {
    Connect {
        voice: ChannelId,
        text: ChannelId,
        reply: Reply<Result<(), SinkError>>,
    },
    Enqueue {
        track: PlayableTrack,
        reply: Reply<EnqueueResult>,
    },
    PlayNext {
        track: PlayableTrack,
        reply: Reply<Advanced>,
    },
    Skip {
        reply: Reply<Result<Advanced, PreconditionError>>,
    },
    Pause {
        reply: Reply<Result<(), CommandError>>,
    },
    Resume {
        reply: Reply<Result<(), CommandError>>,
    },
    Stop {
        reply: Reply<()>,
    },
    SetLoop {
        /// `None` toggles.
        enabled: Option<bool>,
        reply: Reply<Result<bool, PreconditionError>>,
    },
    Select {
        index: i64,
        reply: Reply<Result<PlayableTrack, CommandError>>,
    },
    List {
        reply: Reply<Vec<QueueEntry>>,
    },
    Status {
        reply: Reply<SessionStatus>,
    },
    Shutdown {
        reply: Reply<()>,
    },

    // Driver events
    TrackEnded {
        generation: u64,
        error: Option<SinkError>,
    },
    Repeat {
        generation: u64,
    },
}

