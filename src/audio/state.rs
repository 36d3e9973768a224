use super::track::PlayableTrack;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: PlaybackState,
    pub current: Option<PlayableTrack>,
    pub queue_len: usize,
    pub loop_enabled: bool,
    pub connected: bool,
    pub repeat_pending: bool,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueResult {
    Started(PlayableTrack),
    /// `position` is 1-based, matching `select`.
    Queued {
        track: PlayableTrack,
        position: usize,
    },
    Failed(PlayableTrack),
}

/// Outcome of moving the session to its next track.
#[derive(Debug, Clone, PartialEq)]
pub enum Advanced {
    Playing(PlayableTrack),
    Repeating(PlayableTrack),
    Idle,
    /// `track` could not start; `next` is where the session ended up.
    Failed {
        track: PlayableTrack,
        next: Box<Advanced>,
    },
}

impl Advanced {
    pub fn started(&self) -> Option<&PlayableTrack> {
        match self {
            Advanced::Playing(track) => Some(track),
            Advanced::Failed { next, .. } => next.started(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub index: usize,
    pub title: String,
    pub duration: Option<Duration>,
}
