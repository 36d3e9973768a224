//! In-memory collaborators for driving real session actors.
#![allow(dead_code)]

use async_trait::async_trait;
use flume::Receiver;
use jukebox::{
    audio::{
        config::SessionConfig,
        controller::SessionHandle,
        error::{ResolveError, SinkError},
        ids::{ChannelId, GuildId},
        track::PlayableTrack,
        traits::{TrackEndNotifier, TrackResolver, VoiceBackend, VoiceSink},
    },
    event::events::Event,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

pub const GUILD: GuildId = GuildId(1);
pub const VOICE: ChannelId = ChannelId(10);
pub const TEXT: ChannelId = ChannelId(20);

const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Connect(ChannelId),
    Play(String),
    Pause,
    Resume,
    Stop,
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Default)]
struct FakeState {
    channel: Option<ChannelId>,
    refuse_join: bool,
    mode: Mode,
    notifier: Option<TrackEndNotifier>,
    calls: Vec<SinkCall>,
    unplayable: HashSet<String>,
}

/// Records every call and behaves like a single-stream player: starting or
/// stopping a track reports the end of the previous one, as a real driver
/// would.
#[derive(Default)]
pub struct FakeSink {
    state: Mutex<FakeState>,
}

impl FakeSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn played(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Play(title) => Some(title),
                _ => None,
            })
            .collect()
    }

    /// Makes `play` fail for tracks titled `title`.
    pub fn fail_on(&self, title: &str) {
        self.state.lock().unwrap().unplayable.insert(title.to_string());
    }

    /// Ends the current track on its own. Returns false if nothing was
    /// playing.
    pub fn finish(&self, error: Option<SinkError>) -> bool {
        let notifier = {
            let mut state = self.state.lock().unwrap();
            state.mode = Mode::Stopped;
            state.notifier.take()
        };
        match notifier {
            Some(notifier) => {
                notifier.notify(error);
                true
            }
            None => false,
        }
    }

    /// Makes every following `connect` fail.
    pub fn refuse_join(&self) {
        self.state.lock().unwrap().refuse_join = true;
    }

    /// Drops the bot from voice without the session asking, as a moderator
    /// kick would. The playing track ends with it.
    pub fn kick(&self) {
        let notifier = {
            let mut state = self.state.lock().unwrap();
            state.channel = None;
            state.mode = Mode::Stopped;
            state.notifier.take()
        };
        if let Some(notifier) = notifier {
            notifier.notify(None);
        }
    }

    fn halt(&self, call: SinkCall) {
        let notifier = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            state.mode = Mode::Stopped;
            state.notifier.take()
        };
        if let Some(notifier) = notifier {
            notifier.notify(None);
        }
    }
}

#[async_trait]
impl VoiceSink for FakeSink {
    async fn connect(&self, channel: ChannelId) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SinkCall::Connect(channel));
        if state.refuse_join {
            state.channel = None;
            return Err(SinkError::Join("missing permissions".into()));
        }
        state.channel = Some(channel);
        Ok(())
    }

    async fn play(&self, track: &PlayableTrack, on_end: TrackEndNotifier) -> Result<(), SinkError> {
        let replaced = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(SinkCall::Play(track.title.clone()));
            if state.channel.is_none() {
                return Err(SinkError::NotConnected);
            }
            if state.unplayable.contains(&track.title) {
                return Err(SinkError::Playback(format!("cannot decode {}", track.title)));
            }
            state.mode = Mode::Playing;
            state.notifier.replace(on_end)
        };
        if let Some(previous) = replaced {
            previous.notify(None);
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.mode != Mode::Playing {
            return Err(SinkError::Control("not playing".into()));
        }
        state.calls.push(SinkCall::Pause);
        state.mode = Mode::Paused;
        Ok(())
    }

    fn resume(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.mode != Mode::Paused {
            return Err(SinkError::Control("not paused".into()));
        }
        state.calls.push(SinkCall::Resume);
        state.mode = Mode::Playing;
        Ok(())
    }

    fn stop(&self) {
        self.halt(SinkCall::Stop);
    }

    async fn disconnect(&self) {
        self.halt(SinkCall::Disconnect);
        self.state.lock().unwrap().channel = None;
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().mode == Mode::Playing
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().mode == Mode::Paused
    }

    fn channel(&self) -> Option<ChannelId> {
        self.state.lock().unwrap().channel
    }
}

/// Hands out one `FakeSink` per guild.
#[derive(Default)]
pub struct FakeBackend {
    sinks: Mutex<HashMap<GuildId, Arc<FakeSink>>>,
}

impl FakeBackend {
    pub fn sink(&self, guild: GuildId) -> Arc<FakeSink> {
        self.sinks
            .lock()
            .unwrap()
            .entry(guild)
            .or_default()
            .clone()
    }
}

impl VoiceBackend for FakeBackend {
    fn sink_for(&self, guild: GuildId) -> Arc<dyn VoiceSink> {
        self.sink(guild)
    }
}

/// Resolves any query to a track titled after it, except the ones given a
/// failure.
#[derive(Default)]
pub struct FakeResolver {
    failures: Mutex<HashMap<String, ResolveError>>,
    queries: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn mark_missing(&self, query: &str) {
        self.fail_with(query, ResolveError::NoResults(query.to_string()));
    }

    pub fn fail_with(&self, query: &str, error: ResolveError) {
        self.failures
            .lock()
            .unwrap()
            .insert(query.to_string(), error);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackResolver for FakeResolver {
    async fn resolve(&self, query: &str) -> Result<PlayableTrack, ResolveError> {
        self.queries.lock().unwrap().push(query.to_string());
        if query.trim().is_empty() {
            return Err(ResolveError::EmptyQuery);
        }
        if let Some(error) = self.failures.lock().unwrap().get(query) {
            return Err(error.clone());
        }
        Ok(track(query))
    }
}

pub fn track(title: &str) -> PlayableTrack {
    PlayableTrack::new(title, format!("https://example.com/{title}"))
}

/// Session config without an idle timeout, so tests control its lifetime.
pub fn quiet_config() -> SessionConfig {
    SessionConfig {
        idle_timeout: None,
        repeat_delay: Duration::ZERO,
    }
}

/// A connected session actor over a fresh `FakeSink`.
pub async fn connected_session(
    config: SessionConfig,
) -> (SessionHandle, Arc<FakeSink>, Receiver<Event>) {
    let sink = Arc::new(FakeSink::default());
    let (events, inbox) = flume::unbounded();
    let handle = SessionHandle::spawn(GUILD, sink.clone(), events, config);
    handle.connect(VOICE, TEXT).await.unwrap();
    (handle, sink, inbox)
}

pub async fn next_event(events: &Receiver<Event>) -> Event {
    tokio::time::timeout(WAIT, events.recv_async())
        .await
        .expect("timed out waiting for a session event")
        .expect("event channel closed")
}

/// Skips events until one matches.
pub async fn wait_for(events: &Receiver<Event>, matches: impl Fn(&Event) -> bool) -> Event {
    loop {
        let event = next_event(events).await;
        if matches(&event) {
            return event;
        }
    }
}

pub fn drain(events: &Receiver<Event>) -> Vec<Event> {
    events.drain().collect()
}
