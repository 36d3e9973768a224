use crate::audio::{
    error::SinkError,
    ids::{ChannelId, GuildId},
    track::PlayableTrack,
    traits::{TrackEndNotifier, VoiceBackend, VoiceSink},
};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use songbird::{
    Event, EventContext, EventHandler, Songbird, TrackEvent,
    id::{ChannelId as VoiceChannelId, GuildId as VoiceGuildId},
    input::{HttpRequest, Input, YoutubeDl},
    tracks::{PlayMode, TrackHandle},
};
use std::{
    num::NonZeroU64,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Hands out one songbird-backed sink per guild.
pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    http: Client,
}

impl SongbirdBackend {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            http: Client::new(),
        }
    }
}

impl VoiceBackend for SongbirdBackend {
    fn sink_for(&self, guild: GuildId) -> Arc<dyn VoiceSink> {
        Arc::new(SongbirdSink {
            guild,
            manager: self.manager.clone(),
            http: self.http.clone(),
            state: Arc::new(RwLock::new(SinkState::default())),
            joined: RwLock::new(None),
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum SinkMode {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Default)]
struct SinkState {
    mode: SinkMode,
    track: Option<TrackHandle>,
}

pub struct SongbirdSink {
    guild: GuildId,
    manager: Arc<Songbird>,
    http: Client,
    state: Arc<RwLock<SinkState>>,
    /// Channel of the last successful join, cleared on leave.
    joined: RwLock<Option<ChannelId>>,
}

impl SongbirdSink {
    fn voice_guild(&self) -> Result<VoiceGuildId, SinkError> {
        NonZeroU64::new(self.guild.0)
            .map(VoiceGuildId)
            .ok_or(SinkError::NotConnected)
    }

    fn mode(&self) -> SinkMode {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .mode
    }

    fn input_for(&self, track: &PlayableTrack) -> Input {
        match &track.stream_url {
            Some(url) => HttpRequest::new_with_headers(
                self.http.clone(),
                url.clone(),
                header_map(&track.http_headers),
            )
            .into(),
            None => YoutubeDl::new(self.http.clone(), track.source_url.clone()).into(),
        }
    }

    fn set_joined(&self, channel: Option<ChannelId>) {
        *self.joined.write().unwrap_or_else(PoisonError::into_inner) = channel;
    }

    fn control(&self, target: SinkMode) -> Result<(), SinkError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let track = state
            .track
            .as_ref()
            .ok_or_else(|| SinkError::Control("no active track".into()))?;
        let result = match target {
            SinkMode::Paused => track.pause(),
            _ => track.play(),
        };
        result.map_err(|e| SinkError::Control(e.to_string()))?;
        state.mode = target;
        Ok(())
    }
}

#[async_trait]
impl VoiceSink for SongbirdSink {
    async fn connect(&self, channel: ChannelId) -> Result<(), SinkError> {
        let guild = self.voice_guild()?;
        let target = NonZeroU64::new(channel.0)
            .map(VoiceChannelId)
            .ok_or_else(|| SinkError::Join("invalid channel id".into()))?;

        match self.manager.join(guild, target).await {
            Ok(_) => {
                self.set_joined(Some(channel));
                Ok(())
            }
            Err(e) => {
                self.set_joined(None);
                Err(SinkError::Join(e.to_string()))
            }
        }
    }

    async fn play(&self, track: &PlayableTrack, on_end: TrackEndNotifier) -> Result<(), SinkError> {
        let call = self
            .manager
            .get(self.voice_guild()?)
            .ok_or(SinkError::NotConnected)?;

        let input = self.input_for(track);
        let handle = call.lock().await.play_only_input(input);
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = SinkState {
                mode: SinkMode::Playing,
                track: Some(handle.clone()),
            };
        }

        let watcher = TrackEndWatcher {
            track: handle.uuid(),
            notifier: Arc::new(Mutex::new(Some(on_end))),
            state: self.state.clone(),
        };
        let registered = handle
            .add_event(Event::Track(TrackEvent::End), watcher.clone())
            .and_then(|()| handle.add_event(Event::Track(TrackEvent::Error), watcher));
        if let Err(e) = registered {
            self.stop();
            return Err(SinkError::Playback(e.to_string()));
        }

        debug!(guild = %self.guild, track = %handle.uuid(), title = track.title.as_str(), "sink_playing");
        Ok(())
    }

    fn pause(&self) -> Result<(), SinkError> {
        self.control(SinkMode::Paused)
    }

    fn resume(&self) -> Result<(), SinkError> {
        self.control(SinkMode::Playing)
    }

    fn stop(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(track) = state.track.take() {
            let _ = track.stop();
        }
        state.mode = SinkMode::Stopped;
    }

    async fn disconnect(&self) {
        self.stop();
        self.set_joined(None);
        let Ok(guild) = self.voice_guild() else {
            return;
        };
        if self.manager.get(guild).is_none() {
            return;
        }
        match self.manager.remove(guild).await {
            Ok(()) => info!(guild = %self.guild, "voice_disconnected"),
            Err(e) => warn!(guild = %self.guild, error = %e, "voice_disconnect_failed"),
        }
    }

    fn is_playing(&self) -> bool {
        self.mode() == SinkMode::Playing
    }

    fn is_paused(&self) -> bool {
        self.mode() == SinkMode::Paused
    }

    fn channel(&self) -> Option<ChannelId> {
        let joined = *self.joined.read().unwrap_or_else(PoisonError::into_inner);
        joined?;

        let call = self.manager.get(self.voice_guild().ok()?)?;
        // A kick or a move by a moderator shows up on the call itself.
        match call.try_lock().map(|call| call.current_channel()) {
            Ok(current) => current.map(|current| ChannelId(current.0.get())),
            Err(_) => joined,
        }
    }
}

/// Forwards the end of one songbird track to the session, once.
#[derive(Clone)]
struct TrackEndWatcher {
    track: Uuid,
    notifier: Arc<Mutex<Option<TrackEndNotifier>>>,
    state: Arc<RwLock<SinkState>>,
}

#[async_trait]
impl EventHandler for TrackEndWatcher {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let error = match ctx {
            EventContext::Track(tracks) => tracks.iter().find_map(|(state, _)| match &state.playing {
                PlayMode::Errored(e) => Some(SinkError::Playback(format!("{e:?}"))),
                _ => None,
            }),
            _ => None,
        };

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if state
                .track
                .as_ref()
                .is_some_and(|handle| handle.uuid() == self.track)
            {
                *state = SinkState::default();
            }
        }

        let notifier = self
            .notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(notifier) = notifier {
            debug!(guild = %notifier.guild(), generation = notifier.generation(), "sink_track_ended");
            notifier.notify(error);
        }

        None
    }
}

fn header_map(headers: &[(String, String)]) -> HeaderMap {
    headers
        .iter()
        .filter_map(|(name, value)| {
            Some((
                HeaderName::from_bytes(name.as_bytes()).ok()?,
                HeaderValue::from_str(value).ok()?,
            ))
        })
        .collect()
}
