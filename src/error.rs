use thiserror::Error;

/// Failures surfaced by the Twitch client. The routing layer decides what the
/// caller sees; everything below it just propagates these.
#[derive(Error, Debug)]
pub enum TwitchError {
    #[error("Get token failed with {0}")]
    Auth(u16),
    #[error("{path} failed with {status}")]
    Upstream { path: String, status: u16 },
    #[error("DecodeError: {0}")]
    Decode(String),
    #[error("ManifestParseError: {0}")]
    ManifestParse(String),
    #[error("NetworkError: {0}")]
    Network(#[from] reqwest::Error),
    #[error("ConfigError: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TwitchError {
    fn from(err: serde_json::Error) -> Self {
        TwitchError::Decode(err.to_string())
    }
}

pub type TwitchResult<T> = Result<T, TwitchError>;
