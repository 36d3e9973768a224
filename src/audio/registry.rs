use crate::{
    audio::{
        config::SessionConfig, controller::SessionHandle, ids::GuildId, traits::VoiceBackend,
    },
    event::events::Event,
};
use flume::Sender;
use futures::future::join_all;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One session per guild, created on first use.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<GuildId, SessionHandle>>,
    backend: Arc<dyn VoiceBackend>,
    events: Sender<Event>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn VoiceBackend>, events: Sender<Event>, config: SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            backend,
            events,
            config,
        }
    }

    /// Returns the live session for `guild`, replacing one that retired.
    pub async fn get_or_create(&self, guild: GuildId) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(&guild)
            && !handle.is_closed()
        {
            return handle.clone();
        }

        let handle = SessionHandle::spawn(
            guild,
            self.backend.sink_for(guild),
            self.events.clone(),
            self.config.clone(),
        );
        debug!(%guild, "session_created");
        sessions.insert(guild, handle.clone());
        handle
    }

    pub async fn get(&self, guild: GuildId) -> Option<SessionHandle> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&guild)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Shuts down and forgets the session for `guild`.
    pub async fn remove(&self, guild: GuildId) -> bool {
        let handle = self.sessions.lock().await.remove(&guild);
        match handle {
            Some(handle) => {
                handle.shutdown().await;
                info!(%guild, "session_removed");
                true
            }
            None => false,
        }
    }

    pub async fn shutdown_all(&self) {
        let handles: Vec<SessionHandle> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        info!(count = handles.len(), "sessions_shutting_down");
        join_all(handles.iter().map(|handle| handle.shutdown())).await;
    }

    /// Number of sessions whose actor is still running.
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, handle| !handle.is_closed());
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
