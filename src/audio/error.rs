use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Failed to launch {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("Resolver exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Invalid resolver output: {0}")]
    Parse(String),

    #[error("No results for: {0}")]
    NoResults(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to join voice channel: {0}")]
    Join(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Track control error: {0}")]
    Control(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("User is not in a voice channel")]
    NotInVoiceChannel,

    #[error("Bot is not connected to a voice channel")]
    NotConnected,

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Playback is not paused")]
    NotPaused,

    #[error("Nothing is playing to skip")]
    NothingToSkip,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Index {index} is out of range for a queue of {len}")]
pub struct IndexError {
    pub index: i64,
    pub len: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Session is closed")]
    SessionClosed,
}
