use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `/helix/streams` entry, passed through untouched.
pub type StreamRecord = Map<String, Value>;

/// A follow or live-stream lookup key. Helix takes ids and logins as
/// different query parameters, so the two never share a batch parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(String),
    Login(String),
}

impl ChannelRef {
    /// Anything made only of ASCII digits is a user id.
    pub fn classify(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            ChannelRef::Id(raw.to_string())
        } else {
            ChannelRef::Login(raw.to_string())
        }
    }

    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            ChannelRef::Id(id) => ("user_id", id),
            ChannelRef::Login(login) => ("user_login", login),
        }
    }
}

impl From<&str> for ChannelRef {
    fn from(raw: &str) -> Self {
        ChannelRef::classify(raw)
    }
}

impl From<String> for ChannelRef {
    fn from(raw: String) -> Self {
        ChannelRef::classify(&raw)
    }
}

impl From<&String> for ChannelRef {
    fn from(raw: &String) -> Self {
        ChannelRef::classify(raw)
    }
}

/// One adaptive-bitrate rendition from the master playlist.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlaylistSource {
    pub quality: String,
    pub fps: String,
    pub bitrate: u64,
    pub uri: String,
}

/// Legacy `/kraken/streams/{channel}` payload, only the fields we speak.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChannelStatus {
    pub channel: String,
    pub display_name: String,
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub viewers: u64,
}

impl ChannelStatus {
    pub fn now_playing(&self) -> String {
        let game = self.game.as_deref().filter(|g| !g.is_empty());
        let status = self.status.as_deref().filter(|s| !s.is_empty());

        match (game, status) {
            (Some(game), Some(status)) => {
                format!("{} is playing {}: {}", self.display_name, game, status)
            }
            (Some(game), None) => format!("{} is playing {}", self.display_name, game),
            (None, Some(status)) => format!("{} is live: {}", self.display_name, status),
            (None, None) => format!("{} is live", self.display_name),
        }
    }
}

pub fn viewer_count(record: &StreamRecord) -> u64 {
    record
        .get("viewer_count")
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

/// Display name for speaking a record, falling back to the login.
pub fn display_name(record: &StreamRecord) -> Option<&str> {
    record
        .get("display_name")
        .or_else(|| record.get("user_name"))
        .or_else(|| record.get("user_login"))
        .and_then(|v| v.as_str())
}
