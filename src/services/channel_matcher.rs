//! Best-effort correction of voice-transcribed channel names.
//!
//! Every channel that was confirmed live at least once is remembered for the
//! life of the process. A noisy name ("shr0ud", "shroud%20") is matched
//! against those with a bigram Dice score; anything scoring above
//! [`MATCH_THRESHOLD`] is replaced by the known name.

use strsim::sorensen_dice;
use tokio::sync::RwLock;

pub const MATCH_THRESHOLD: f64 = 0.5;

/// Similarity in `[0, 1]` between a candidate and a known name.
pub type Scorer = fn(&str, &str) -> f64;

pub struct ChannelMatcher {
    known: RwLock<Vec<String>>,
}

impl ChannelMatcher {
    pub fn new() -> Self {
        Self {
            known: RwLock::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub fn with_known<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known = names
            .into_iter()
            .map(|n| n.as_ref().to_lowercase())
            .collect();

        Self {
            known: RwLock::new(known),
        }
    }

    /// Records a channel confirmed live. Returns false when it was already known.
    pub async fn remember(&self, channel: &str) -> bool {
        let name = channel.to_lowercase();
        let mut known = self.known.write().await;

        if known.contains(&name) {
            return false;
        }

        log::debug!("[ChannelMatcher] Remembering '{}'", name);
        known.push(name);
        true
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.known.read().await.clone()
    }

    pub async fn resolve(&self, raw: &str) -> String {
        let known = self.snapshot().await;
        let resolved = resolve_channel(raw, &known, sorensen_dice);

        if resolved != normalize_channel(raw) {
            log::info!("[ChannelMatcher] Resolved '{}' to '{}'", raw, resolved);
        }
        resolved
    }
}

impl Default for ChannelMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// URL-decodes, lowercases and drops all whitespace.
pub fn normalize_channel(raw: &str) -> String {
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());

    decoded
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Picks the known name closest to `raw`, or returns the normalized input when
/// nothing scores above the threshold.
pub fn resolve_channel(raw: &str, known: &[String], scorer: Scorer) -> String {
    let name = normalize_channel(raw);

    if known.iter().any(|k| *k == name) {
        return name;
    }

    let mut best: Option<(&str, f64)> = None;
    for candidate in known {
        let score = scorer(&name, candidate);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate.as_str(), score));
        }
    }

    match best {
        Some((candidate, score)) if score > MATCH_THRESHOLD => candidate.to_string(),
        _ => name,
    }
}
