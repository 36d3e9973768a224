use crate::{
    audio::{
        commands::SessionCommand,
        config::SessionConfig,
        error::{CommandError, IndexError, PreconditionError, SinkError},
        ids::{ChannelId, GuildId},
        queue::PendingQueue,
        state::{Advanced, EnqueueResult, PlaybackState, QueueEntry, SessionStatus},
        track::PlayableTrack,
        traits::{TrackEndNotifier, VoiceSink},
    },
    event::events::{CloseReason, Event, Trigger},
    util::task::TaskManager,
};
use flume::{Sender, WeakSender};
use std::{ops::ControlFlow, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

const REPEAT_TASK: &str = "repeat";

/// Playback state for one guild.
///
/// Owned by exactly one actor task (see `controller`), so every method here
/// runs without interleaving. Sink completions arrive as
/// `SessionCommand::TrackEnded` and are matched against `generation`, which
/// changes on every hand-off, stop and skip; anything older is stale.
pub struct Session {
    guild: GuildId,
    sink: Arc<dyn VoiceSink>,
    queue: PendingQueue,
    current: Option<PlayableTrack>,
    loop_enabled: bool,
    generation: u64,
    pending_repeat: Option<u64>,
    text_channel: Option<ChannelId>,
    tasks: TaskManager,
    events: Sender<Event>,
    /// Weak so the session's own hand-offs never keep its inbox open.
    commands: WeakSender<SessionCommand>,
    config: SessionConfig,
}

impl Session {
    pub fn new(
        guild: GuildId,
        sink: Arc<dyn VoiceSink>,
        events: Sender<Event>,
        commands: WeakSender<SessionCommand>,
        config: SessionConfig,
    ) -> Self {
        Self {
            guild,
            sink,
            queue: PendingQueue::new(),
            current: None,
            loop_enabled: false,
            generation: 0,
            pending_repeat: None,
            text_channel: None,
            tasks: TaskManager::new(),
            events,
            commands,
            config,
        }
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.config.idle_timeout
    }

    pub async fn handle(&mut self, command: SessionCommand) -> ControlFlow<()> {
        match command {
            SessionCommand::Connect { voice, text, reply } => {
                let _ = reply.send(self.connect(voice, text).await);
            }
            SessionCommand::Enqueue { track, reply } => {
                let _ = reply.send(self.enqueue(track).await);
            }
            SessionCommand::PlayNext { track, reply } => {
                let _ = reply.send(self.play_next(track).await);
            }
            SessionCommand::Skip { reply } => {
                let _ = reply.send(self.skip().await);
            }
            SessionCommand::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            SessionCommand::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            SessionCommand::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            SessionCommand::SetLoop { enabled, reply } => {
                let enabled = enabled.unwrap_or(!self.loop_enabled);
                let _ = reply.send(self.set_loop(enabled));
            }
            SessionCommand::Select { index, reply } => {
                let _ = reply.send(self.select(index).await);
            }
            SessionCommand::List { reply } => {
                let _ = reply.send(self.list());
            }
            SessionCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            SessionCommand::Shutdown { reply } => {
                self.close(CloseReason::Shutdown).await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
            SessionCommand::TrackEnded { generation, error } => {
                self.on_track_end(generation, error).await;
            }
            SessionCommand::Repeat { generation } => {
                self.on_repeat(generation).await;
            }
        }

        ControlFlow::Continue(())
    }

    pub fn state(&self) -> PlaybackState {
        if self.sink.is_paused() {
            PlaybackState::Paused
        } else if self.sink.is_playing() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    /// Nothing playing, nothing paused, nothing waiting.
    pub fn is_idle(&self) -> bool {
        self.state() == PlaybackState::Idle && !self.repeat_pending() && self.queue.is_empty()
    }

    fn repeat_pending(&self) -> bool {
        self.pending_repeat.is_some_and(|generation| generation == self.generation)
    }

    pub async fn connect(&mut self, voice: ChannelId, text: ChannelId) -> Result<(), SinkError> {
        self.text_channel = Some(text);
        let joined = self.sink.channel();
        if joined == Some(voice) {
            return Ok(());
        }

        self.sink.connect(voice).await?;
        match joined {
            Some(previous) => {
                info!(guild = %self.guild, from = %previous, channel = %voice, "voice_moved")
            }
            None => info!(guild = %self.guild, channel = %voice, "voice_connected"),
        }
        Ok(())
    }

    pub async fn enqueue(&mut self, track: PlayableTrack) -> EnqueueResult {
        self.queue.push_back(track.clone());
        debug!(guild = %self.guild, title = track.title.as_str(), queue_len = self.queue.len(), "track_enqueued");

        if self.state() != PlaybackState::Idle || self.repeat_pending() {
            return EnqueueResult::Queued {
                position: self.queue.len(),
                track,
            };
        }

        match self.advance(Trigger::Command).await.started() {
            Some(started) if started.id == track.id => EnqueueResult::Started(started.clone()),
            _ => match self.queue.iter().position(|queued| queued.id == track.id) {
                Some(position) => EnqueueResult::Queued {
                    track,
                    position: position + 1,
                },
                None => EnqueueResult::Failed(track),
            },
        }
    }

    pub async fn play_next(&mut self, track: PlayableTrack) -> Advanced {
        if self.sink.is_playing() || self.sink.is_paused() {
            self.generation += 1;
            self.sink.stop();
        }

        debug!(guild = %self.guild, title = track.title.as_str(), "track_pushed_front");
        self.queue.push_front(track);

        if self.sink.is_playing() {
            return Advanced::Idle;
        }
        self.advance(Trigger::Command).await
    }

    pub async fn skip(&mut self) -> Result<Advanced, PreconditionError> {
        if !self.sink.is_playing() && !self.sink.is_paused() {
            return Err(PreconditionError::NothingToSkip);
        }

        self.generation += 1;
        self.sink.stop();
        info!(guild = %self.guild, "track_skipped");
        Ok(self.advance(Trigger::Command).await)
    }

    /// Moves to the next queued track, or schedules a repeat of the current
    /// one when looping with an empty queue. Tracks the sink refuses are
    /// reported and skipped; the first of them is named in the outcome.
    pub async fn advance(&mut self, trigger: Trigger) -> Advanced {
        let mut failed = None;
        let outcome = loop {
            self.generation += 1;
            self.cancel_repeat();

            if let Some(track) = self.queue.pop_front() {
                self.current = Some(track.clone());
                match self.start(&track).await {
                    Ok(()) => {
                        info!(
                            guild = %self.guild,
                            generation = self.generation,
                            title = track.title.as_str(),
                            "now_playing"
                        );
                        self.emit(Event::NowPlaying {
                            guild: self.guild,
                            channel: self.text_channel,
                            title: track.title.clone(),
                            trigger,
                        });
                        break Advanced::Playing(track);
                    }
                    Err(error) => {
                        self.current = None;
                        self.report_failure(&track, &error, trigger);
                        if failed.is_none() {
                            failed = Some(track);
                        }
                    }
                }
            } else if self.loop_enabled
                && let Some(track) = self.current.clone()
            {
                self.schedule_repeat();
                break Advanced::Repeating(track);
            } else {
                debug!(guild = %self.guild, "queue_ended");
                if trigger == Trigger::TrackEnd {
                    self.emit(Event::QueueEnded {
                        guild: self.guild,
                        channel: self.text_channel,
                    });
                }
                break Advanced::Idle;
            }
        };

        match failed {
            Some(track) => Advanced::Failed {
                track,
                next: Box::new(outcome),
            },
            None => outcome,
        }
    }

    pub async fn on_track_end(&mut self, generation: u64, error: Option<SinkError>) {
        if generation != self.generation {
            debug!(
                guild = %self.guild,
                generation,
                current = self.generation,
                "stale_track_end_ignored"
            );
            return;
        }

        if let Some(error) = error {
            error!(guild = %self.guild, %error, "track_playback_error");
        }
        self.advance(Trigger::TrackEnd).await;
    }

    pub fn pause(&mut self) -> Result<(), CommandError> {
        if !self.sink.is_playing() || self.sink.is_paused() {
            return Err(PreconditionError::NothingPlaying.into());
        }
        self.sink.pause()?;
        info!(guild = %self.guild, "playback_paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CommandError> {
        if !self.sink.is_paused() {
            return Err(PreconditionError::NotPaused.into());
        }
        self.sink.resume()?;
        info!(guild = %self.guild, "playback_resumed");
        Ok(())
    }

    /// Clears everything and leaves the voice channel. Safe to repeat.
    pub async fn stop(&mut self) {
        self.cancel_repeat();
        self.queue.clear();
        self.current = None;
        self.loop_enabled = false;
        self.generation += 1;
        self.sink.stop();
        self.sink.disconnect().await;
        info!(guild = %self.guild, "session_stopped");
    }

    pub fn set_loop(&mut self, enabled: bool) -> Result<bool, PreconditionError> {
        if !self.sink.is_playing() && !self.repeat_pending() {
            return Err(PreconditionError::NothingPlaying);
        }

        self.loop_enabled = enabled;
        if !enabled {
            self.cancel_repeat();
        }
        info!(guild = %self.guild, enabled, "loop_toggled");
        Ok(enabled)
    }

    /// Plays the 1-based `index` entry right away and removes it from the
    /// queue.
    pub async fn select(&mut self, index: i64) -> Result<PlayableTrack, CommandError> {
        let len = self.queue.len();
        let position = match usize::try_from(index) {
            Ok(n) if (1..=len).contains(&n) => n - 1,
            _ => return Err(IndexError { index, len }.into()),
        };
        let track = self
            .queue
            .remove(position)
            .ok_or(IndexError { index, len })?;

        self.generation += 1;
        self.cancel_repeat();
        if self.sink.is_playing() || self.sink.is_paused() {
            self.sink.stop();
        }

        self.current = Some(track.clone());
        if let Err(error) = self.start(&track).await {
            self.current = None;
            self.report_failure(&track, &error, Trigger::Command);
            return Err(error.into());
        }

        info!(guild = %self.guild, index, title = track.title.as_str(), "track_selected");
        self.emit(Event::NowPlaying {
            guild: self.guild,
            channel: self.text_channel,
            title: track.title.clone(),
            trigger: Trigger::Command,
        });
        Ok(track)
    }

    pub fn list(&self) -> Vec<QueueEntry> {
        self.queue.entries()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state(),
            current: self.current.clone(),
            queue_len: self.queue.len(),
            loop_enabled: self.loop_enabled,
            connected: self.sink.is_connected(),
            repeat_pending: self.repeat_pending(),
            generation: self.generation,
        }
    }

    pub async fn close(&mut self, reason: CloseReason) {
        let was_connected = self.sink.is_connected();
        self.stop().await;
        if !was_connected {
            return;
        }
        self.emit(Event::SessionClosed {
            guild: self.guild,
            channel: self.text_channel,
            reason,
        });
    }

    async fn on_repeat(&mut self, generation: u64) {
        if !self.repeat_pending() || generation != self.generation {
            debug!(guild = %self.guild, generation, "stale_repeat_ignored");
            return;
        }
        self.pending_repeat = None;

        let Some(track) = self.current.clone() else {
            return;
        };
        if !self.loop_enabled {
            return;
        }

        match self.start(&track).await {
            Ok(()) => {
                info!(guild = %self.guild, title = track.title.as_str(), "track_repeating");
                self.emit(Event::Repeating {
                    guild: self.guild,
                    channel: self.text_channel,
                    title: track.title.clone(),
                });
            }
            Err(error) => {
                self.current = None;
                self.report_failure(&track, &error, Trigger::TrackEnd);
                self.advance(Trigger::TrackEnd).await;
            }
        }
    }

    async fn start(&mut self, track: &PlayableTrack) -> Result<(), SinkError> {
        let notifier = TrackEndNotifier::new(self.guild, self.generation, self.commands.clone());
        self.sink.play(track, notifier).await
    }

    fn schedule_repeat(&mut self) {
        let generation = self.generation;
        let delay = self.config.repeat_delay;
        let commands = self.commands.clone();

        self.pending_repeat = Some(generation);
        self.tasks.spawn(
            REPEAT_TASK,
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if let Some(commands) = commands.upgrade() {
                    let _ = commands.send_async(SessionCommand::Repeat { generation }).await;
                }
            }),
        );
        debug!(guild = %self.guild, generation, "repeat_scheduled");
    }

    fn cancel_repeat(&mut self) {
        self.pending_repeat = None;
        if self.tasks.abort(REPEAT_TASK) {
            debug!(guild = %self.guild, "repeat_cancelled");
        }
    }

    fn report_failure(&self, track: &PlayableTrack, error: &SinkError, trigger: Trigger) {
        warn!(guild = %self.guild, title = track.title.as_str(), %error, "track_start_failed");
        self.emit(Event::TrackFailed {
            guild: self.guild,
            channel: self.text_channel,
            title: track.title.clone(),
            error: error.to_string(),
            trigger,
        });
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }
}
