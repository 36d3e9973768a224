use crate::audio::{error::ResolveError, track::PlayableTrack, traits::TrackResolver};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};
use tokio::process::Command;
use tracing::{debug, info, warn};

const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";

/// Resolves queries by shelling out to `yt-dlp`.
pub struct YtDlpResolver {
    program: String,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<PlayableTrack, ResolveError> {
        let target = search_target(query)?;
        debug!(program = self.program.as_str(), search = target.as_str(), "resolve_started");

        let output = Command::new(&self.program)
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "--format",
                AUDIO_FORMAT,
                "--",
            ])
            .arg(&target)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ResolveError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                search = target.as_str(),
                status = %output.status,
                stderr = stderr.as_str(),
                "resolve_failed"
            );
            return Err(ResolveError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let track = parse_info(&output.stdout, query)?;
        info!(
            title = track.title.as_str(),
            url = track.source_url.as_str(),
            "track_resolved"
        );
        Ok(track)
    }
}

/// URLs are passed through; anything else becomes a single-result search.
pub fn search_target(query: &str) -> Result<String, ResolveError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ResolveError::EmptyQuery);
    }

    if is_url(query) {
        Ok(query.to_string())
    } else {
        Ok(format!("ytsearch1:{query}"))
    }
}

pub fn is_url(query: &str) -> bool {
    query.starts_with("http://") || query.starts_with("https://")
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
    entries: Option<Vec<VideoInfo>>,
}

fn parse_info(stdout: &[u8], query: &str) -> Result<PlayableTrack, ResolveError> {
    let mut info: VideoInfo =
        serde_json::from_slice(stdout).map_err(|e| ResolveError::Parse(e.to_string()))?;

    if let Some(entries) = info.entries.take() {
        info = entries
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoResults(query.trim().to_string()))?;
    }

    let source_url = info
        .webpage_url
        .or(info.original_url)
        .or_else(|| info.url.clone())
        .ok_or_else(|| ResolveError::Parse("missing url".into()))?;
    let title = info.title.unwrap_or_else(|| source_url.clone());

    let mut track = PlayableTrack::new(title, source_url);
    if let Some(stream_url) = info.url {
        track = track.with_stream(stream_url, info.http_headers.into_iter().collect());
    }
    if let Some(duration) = info
        .duration
        .filter(|s| *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
    {
        track = track.with_duration(duration);
    }
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_becomes_a_search() {
        assert_eq!(
            search_target("  never gonna give you up ").unwrap(),
            "ytsearch1:never gonna give you up"
        );
    }

    #[test]
    fn urls_are_passed_through() {
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        assert_eq!(search_target(url).unwrap(), url);
        assert!(!is_url("youtube.com/watch"));
    }

    #[test]
    fn empty_query_is_rejected() {
        assert_eq!(search_target("   "), Err(ResolveError::EmptyQuery));
    }

    #[test]
    fn parses_a_single_video() {
        let json = br#"{
            "title": "Song",
            "webpage_url": "https://www.youtube.com/watch?v=abc",
            "url": "https://media.example/abc.m4a",
            "duration": 212.0,
            "http_headers": {"User-Agent": "test"}
        }"#;

        let track = parse_info(json, "song").unwrap();
        assert_eq!(track.title, "Song");
        assert_eq!(track.source_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(track.stream_url.as_deref(), Some("https://media.example/abc.m4a"));
        assert_eq!(track.http_headers, vec![("User-Agent".to_string(), "test".to_string())]);
        assert_eq!(track.duration, Some(Duration::from_secs(212)));
    }

    #[test]
    fn search_results_use_the_first_entry() {
        let json = br#"{
            "title": "ytsearch1:song",
            "entries": [
                {"title": "First", "webpage_url": "https://www.youtube.com/watch?v=1"},
                {"title": "Second", "webpage_url": "https://www.youtube.com/watch?v=2"}
            ]
        }"#;

        let track = parse_info(json, "song").unwrap();
        assert_eq!(track.title, "First");
        assert!(track.stream_url.is_none());
    }

    #[test]
    fn out_of_range_durations_are_dropped() {
        for raw in ["1e30", "-5", "0"] {
            let json = format!(
                r#"{{"title": "Live", "webpage_url": "https://www.youtube.com/watch?v=l", "duration": {raw}}}"#
            );
            let track = parse_info(json.as_bytes(), "live").unwrap();
            assert_eq!(track.duration, None, "duration {raw}");
        }
    }

    #[test]
    fn empty_search_is_no_results() {
        let json = br#"{"title": "ytsearch1:nothing", "entries": []}"#;
        assert_eq!(
            parse_info(json, " nothing "),
            Err(ResolveError::NoResults("nothing".into()))
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_info(b"not json", "q"),
            Err(ResolveError::Parse(_))
        ));
    }
}
