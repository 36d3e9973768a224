use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session may sit with nothing playing before it leaves the
    /// voice channel. `None` keeps it forever.
    pub idle_timeout: Option<Duration>,
    /// Gap before a looped track starts again.
    pub repeat_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(300)),
            repeat_delay: Duration::ZERO,
        }
    }
}
