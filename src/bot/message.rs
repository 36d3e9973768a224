use crate::{
    audio::{
        error::{CommandError, PreconditionError, ResolveError},
        state::{Advanced, EnqueueResult, QueueEntry},
        track::PlayableTrack,
    },
    bot::command::{COMMANDS, CommandParseError},
    event::events::{CloseReason, Event, Trigger},
    util::text::{format_duration, truncate_chars, truncate_to_width},
};
use std::{fmt::Write, time::Duration};

/// Discord rejects longer messages outright.
pub const MAX_MESSAGE_LEN: usize = 2000;

const TITLE_WIDTH: usize = 80;
const DETAIL_WIDTH: usize = 300;

fn title(text: &str) -> String {
    truncate_to_width(text, TITLE_WIDTH)
}

fn titled(text: &str, duration: Option<Duration>) -> String {
    match duration {
        Some(duration) => format!("{} ({})", title(text), format_duration(duration)),
        None => title(text),
    }
}

/// Last step for every outgoing message.
pub fn fit(text: String) -> String {
    truncate_chars(&text, MAX_MESSAGE_LEN)
}

pub fn now_playing(track_title: &str, duration: Option<Duration>) -> String {
    format!("Now playing: {}", titled(track_title, duration))
}

fn now_playing_track(track: &PlayableTrack) -> String {
    now_playing(&track.title, track.duration)
}

pub fn selected(track: &PlayableTrack) -> String {
    now_playing_track(track)
}

pub fn repeating(track_title: &str) -> String {
    format!("Repeating: {}", title(track_title))
}

pub fn play_failed(track_title: &str) -> String {
    format!("Could not play {}, moving on.", title(track_title))
}

pub fn enqueued(result: &EnqueueResult) -> String {
    match result {
        EnqueueResult::Started(track) => now_playing_track(track),
        EnqueueResult::Queued { track, position } => {
            format!(
                "Queued: {} (position {position})",
                titled(&track.title, track.duration)
            )
        }
        EnqueueResult::Failed(track) => play_failed(&track.title),
    }
}

pub fn advanced(outcome: &Advanced) -> String {
    match outcome {
        Advanced::Playing(track) => now_playing_track(track),
        Advanced::Repeating(track) => repeating(&track.title),
        Advanced::Idle => "The queue is empty.".to_string(),
        Advanced::Failed { track, next } => {
            format!("{} {}", play_failed(&track.title), advanced(next))
        }
    }
}

pub fn skipped(outcome: &Advanced) -> String {
    format!("Skipped. {}", advanced(outcome))
}

pub const PAUSED: &str = "Paused.";
pub const RESUMED: &str = "Resumed.";
pub const STOPPED: &str = "Stopped and cleared the queue.";

pub fn loop_status(enabled: bool) -> String {
    if enabled {
        "Loop enabled.".to_string()
    } else {
        "Loop disabled.".to_string()
    }
}

pub fn queue_listing(entries: &[QueueEntry], limit: usize) -> String {
    if entries.is_empty() {
        return "The queue is empty.".to_string();
    }

    let mut out = String::from("Queue:");
    for entry in entries.iter().take(limit) {
        let _ = write!(
            out,
            "\n{}. {}",
            entry.index,
            titled(&entry.title, entry.duration)
        );
    }
    if entries.len() > limit {
        let _ = write!(out, "\n...and {} more", entries.len() - limit);
    }
    out
}

pub fn help(prefix: &str) -> String {
    let mut out = String::from("Commands:");
    for spec in COMMANDS {
        let _ = write!(out, "\n{prefix}{} - {}", spec.usage(), spec.description);
    }
    out
}

pub fn error(err: &CommandError) -> String {
    match err {
        CommandError::Precondition(err) => precondition(*err).to_string(),
        CommandError::Index(err) => {
            if err.len == 0 {
                format!("There is no entry {}, the queue is empty.", err.index)
            } else {
                format!(
                    "There is no entry {}, pick a number from 1 to {}.",
                    err.index, err.len
                )
            }
        }
        CommandError::Resolve(ResolveError::EmptyQuery) => {
            "Tell me what to play.".to_string()
        }
        CommandError::Resolve(ResolveError::NoResults(query)) => {
            format!("Nothing found for {}.", title(query))
        }
        CommandError::Resolve(ResolveError::Failed { status, stderr }) => {
            // The full stderr is logged by the resolver.
            match stderr.lines().rev().map(str::trim).find(|line| !line.is_empty()) {
                Some(line) => format!(
                    "Could not look that up: {}",
                    truncate_to_width(line, DETAIL_WIDTH)
                ),
                None => format!("Could not look that up ({status})."),
            }
        }
        CommandError::Resolve(err) => format!(
            "Could not look that up: {}",
            truncate_to_width(&err.to_string(), DETAIL_WIDTH)
        ),
        CommandError::Sink(err) => format!(
            "Voice error: {}",
            truncate_to_width(&err.to_string(), DETAIL_WIDTH)
        ),
        CommandError::SessionClosed => {
            "The player for this server has shut down, try again.".to_string()
        }
    }
}

pub fn precondition(err: PreconditionError) -> &'static str {
    match err {
        PreconditionError::NotInVoiceChannel => "You need to be in a voice channel.",
        PreconditionError::NotConnected => "I am not in a voice channel.",
        PreconditionError::NothingPlaying => "Nothing is playing.",
        PreconditionError::NotPaused => "Nothing is paused.",
        PreconditionError::NothingToSkip => "Nothing to skip.",
    }
}

pub fn parse_error(err: &CommandParseError, prefix: &str) -> String {
    match err {
        CommandParseError::Unknown(verb) => {
            format!("Unknown command `{verb}`. Try `{prefix}help`.")
        }
        CommandParseError::MissingArgument(arg) => {
            format!("Missing <{arg}>. Try `{prefix}help`.")
        }
        CommandParseError::InvalidNumber(raw) => format!("`{raw}` is not a number."),
    }
}

pub const GUILD_ONLY: &str = "Commands only work inside a server.";

/// Text for a background event. Events caused by a command return `None`
/// since the command's reply already said it.
pub fn notification(event: &Event) -> Option<String> {
    match event {
        Event::NowPlaying {
            title,
            trigger: Trigger::TrackEnd,
            ..
        } => Some(now_playing(title, None)),
        Event::Repeating { title, .. } => Some(repeating(title)),
        Event::TrackFailed {
            title,
            trigger: Trigger::TrackEnd,
            ..
        } => Some(play_failed(title)),
        Event::QueueEnded { .. } => Some("Queue finished.".to_string()),
        Event::SessionClosed {
            reason: CloseReason::IdleTimeout,
            ..
        } => Some("Left the voice channel after being idle.".to_string()),
        _ => None,
    }
}
