use std::time::Duration;
use uuid::Uuid;

/// A resolved, playable piece of media.
///
/// The sink builds a fresh audio input from this every time it is played,
/// which is what lets the loop replay the same track.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableTrack {
    pub id: Uuid,
    pub title: String,
    /// Page the track was resolved from.
    pub source_url: String,
    /// Direct media URL, when the resolver produced one.
    pub stream_url: Option<String>,
    pub http_headers: Vec<(String, String)>,
    pub duration: Option<Duration>,
}

impl PlayableTrack {
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            source_url: source_url.into(),
            stream_url: None,
            http_headers: Vec::new(),
            duration: None,
        }
    }

    pub fn with_stream(mut self, url: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        self.stream_url = Some(url.into());
        self.http_headers = headers;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}
