use std::{str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_API_URL: &str = "https://kishorbhagwat.in/Sunoji";

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub progress_interval: Duration,
    pub seek_step_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(250),
            seek_step_secs: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    /// Caps the catalog request; `None` fetches everything.
    pub song_limit: Option<usize>,
    pub tick_rate: Duration,
    pub audio: AudioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            song_limit: None,
            tick_rate: Duration::from_millis(33),
            audio: AudioConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `SUNOJI_*` variables (after `.env` has been loaded); anything
    /// missing or unparsable keeps its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("SUNOJI_API_URL").filter(|u| !u.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(limit) = parse::<usize>(&lookup, "SUNOJI_SONG_LIMIT") {
            config.song_limit = (limit > 0).then_some(limit);
        }
        if let Some(ms) = parse::<u64>(&lookup, "SUNOJI_PROGRESS_INTERVAL_MS") {
            config.audio.progress_interval = Duration::from_millis(ms.max(10));
        }
        if let Some(secs) = parse::<u64>(&lookup, "SUNOJI_SEEK_STEP_SECS") {
            config.audio.seek_step_secs = secs;
        }

        config
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw.as_str(), "config_invalid_value");
            None
        }
    }
}
