use crate::services::announce_service::Announcer;
use crate::services::channel_matcher::ChannelMatcher;
use crate::services::twitch_service::TwitchService;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TwitchApiSettings {
    pub client_id: String,
    pub client_secret: String,
    pub api_base_url: String,
    pub auth_base_url: String,
    pub usher_base_url: String,
}

impl Default for TwitchApiSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_base_url: "https://api.twitch.tv".to_string(),
            auth_base_url: "https://id.twitch.tv".to_string(),
            usher_base_url: "https://usher.ttvnw.net".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AnnounceSettings {
    pub max_announced: usize,     // Names spoken per /live reply
    pub broadcast_capacity: usize, // Messages buffered per lagging ws client
}

impl Default for AnnounceSettings {
    fn default() -> Self {
        Self {
            max_announced: 5,
            broadcast_capacity: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub twitch: TwitchApiSettings,
    pub announce: AnnounceSettings,
    pub diagnostics_enabled: bool,
}

/// Reads an on/off switch such as `STREAMRELAY_DIAGNOSTICS`.
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 3000,
            twitch: TwitchApiSettings::default(),
            announce: AnnounceSettings::default(),
            diagnostics_enabled: true,
        }
    }
}

impl Settings {
    /// Defaults, then the optional settings file, then the process environment.
    pub fn load() -> Result<Self> {
        let from_file = match Self::settings_path() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(None),
        };

        let mut settings = match from_file {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!("[Settings] Ignoring settings file: {:#}", e);
                Settings::default()
            }
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("StreamRelay").join(SETTINGS_FILE_NAME))
    }

    /// `Ok(None)` when there is no file. Fields the file leaves out keep their
    /// defaults.
    fn load_from_file(path: &Path) -> Result<Option<Self>> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[Settings] No settings file at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
        };

        let settings: Settings = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        log::info!("[Settings] Loaded settings from {:?}", path);
        Ok(Some(settings))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CLIENT_ID") {
            self.twitch.client_id = v;
        }
        if let Some(v) = lookup("CLIENT_SECRET") {
            self.twitch.client_secret = v;
        }
        if let Some(v) = lookup("TWITCH_API_URL") {
            self.twitch.api_base_url = v;
        }
        if let Some(v) = lookup("TWITCH_AUTH_URL") {
            self.twitch.auth_base_url = v;
        }
        if let Some(v) = lookup("TWITCH_USHER_URL") {
            self.twitch.usher_base_url = v;
        }
        if let Some(v) = lookup("PORT") {
            match v.parse() {
                Ok(port) => self.port = port,
                Err(_) => log::warn!("[Settings] Ignoring invalid PORT '{}'", v),
            }
        }
        if let Some(v) = lookup("MAX_ANNOUNCED") {
            match v.parse() {
                Ok(max) => self.announce.max_announced = max,
                Err(_) => log::warn!("[Settings] Ignoring invalid MAX_ANNOUNCED '{}'", v),
            }
        }
        if let Some(v) = lookup("STREAMRELAY_DIAGNOSTICS") {
            self.diagnostics_enabled = parse_flag(&v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.twitch.client_id.is_empty() {
            anyhow::bail!("CLIENT_ID is not set");
        }
        if self.twitch.client_secret.is_empty() {
            anyhow::bail!("CLIENT_SECRET is not set");
        }
        Ok(())
    }
}

/// Process-scoped state shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub twitch: Arc<TwitchService>,
    pub matcher: Arc<ChannelMatcher>,
    pub announcer: Announcer,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let twitch = Arc::new(TwitchService::new(settings.twitch.clone()));
        let announcer = Announcer::new(settings.announce.broadcast_capacity);

        Self {
            settings: Arc::new(settings),
            twitch,
            matcher: Arc::new(ChannelMatcher::new()),
            announcer,
        }
    }
}
