use crate::audio::config::SessionConfig;
use color_eyre::eyre::{Result, WrapErr, eyre};
use std::{str::FromStr, time::Duration};

pub const DEFAULT_PREFIX: &str = "!";

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub ytdlp: String,
    pub queue_display_limit: usize,
    pub session: SessionConfig,
}

impl BotConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| eyre!("DISCORD_TOKEN environment variable must be set"))?;

        let idle_secs: u64 = parse_or(&lookup, "JUKEBOX_IDLE_TIMEOUT_SECS", 300)?;
        let repeat_delay_ms: u64 = parse_or(&lookup, "JUKEBOX_REPEAT_DELAY_MS", 0)?;

        Ok(Self {
            token,
            prefix: lookup("JUKEBOX_PREFIX")
                .filter(|prefix| !prefix.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            ytdlp: lookup("JUKEBOX_YTDLP").unwrap_or_else(|| "yt-dlp".to_string()),
            queue_display_limit: parse_or(&lookup, "JUKEBOX_QUEUE_DISPLAY_LIMIT", 20)?,
            session: SessionConfig {
                // 0 disables the idle timeout.
                idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
                repeat_delay: Duration::from_millis(repeat_delay_ms),
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
