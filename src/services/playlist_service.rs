use crate::error::{TwitchError, TwitchResult};
use crate::models::stream::PlaylistSource;
use crate::services::twitch_service::TwitchService;
use futures_util::StreamExt;
use m3u8_rs::{AlternativeMediaType, VariantStream};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use url::Url;

// "720p60" -> ("720p", "60"), "1080p60 (source)" -> ("1080p", "60")
static QUALITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+p)(\d*)").expect("quality pattern is valid"));

#[derive(Debug, Deserialize)]
struct ChannelAccessToken {
    token: String,
    sig: String,
}

/// Splits a rendition label into an upper-cased quality and its frame rate.
pub fn parse_quality_label(label: &str) -> Option<(String, String)> {
    let caps = QUALITY_PATTERN.captures(label.trim())?;
    let quality = caps.get(1)?.as_str().to_uppercase();
    let fps = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
    Some((quality, fps))
}

/// Pulls one [`PlaylistSource`] per video rendition out of a master playlist.
/// Renditions are paired with variants by position; unrecognised labels are
/// skipped without shifting the pairing of the rest.
pub fn parse_master_playlist(bytes: &[u8]) -> TwitchResult<Vec<PlaylistSource>> {
    let playlist = m3u8_rs::parse_master_playlist_res(bytes)
        .map_err(|e| TwitchError::ManifestParse(e.to_string()))?;

    let variants: Vec<&VariantStream> = playlist
        .variants
        .iter()
        .filter(|v| !v.is_i_frame)
        .collect();

    let renditions = playlist
        .alternatives
        .iter()
        .filter(|media| media.media_type == AlternativeMediaType::Video);

    let mut sources = Vec::new();
    for (index, media) in renditions.enumerate() {
        let Some((quality, fps)) = parse_quality_label(&media.name) else {
            log::info!("[Playlist] Skipping rendition '{}'", media.name);
            continue;
        };

        let Some(variant) = variants.get(index) else {
            log::warn!(
                "[Playlist] Rendition '{}' has no matching variant at {}",
                media.name,
                index
            );
            continue;
        };

        sources.push(PlaylistSource {
            quality,
            fps,
            bitrate: variant.bandwidth,
            uri: variant.uri.clone(),
        });
    }

    Ok(sources)
}

impl TwitchService {
    /// Playback renditions for a live channel, best first as the CDN lists them.
    pub async fn get_streams(&self, channel: &str) -> TwitchResult<Vec<PlaylistSource>> {
        let access: ChannelAccessToken = serde_json::from_value(
            self.request(&format!(
                "/api/channels/{}/access_token",
                urlencoding::encode(channel)
            ))
            .await?,
        )?;

        let manifest_url = self.manifest_url(channel, &access)?;
        log::debug!("[Playlist] Fetching manifest for {}", channel);

        let response = self.client.get(manifest_url).send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(TwitchError::Upstream {
                path: format!("/api/channel/hls/{}.m3u8", channel),
                status,
            });
        }

        let mut manifest = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            manifest.extend_from_slice(&chunk?);
        }

        let sources = parse_master_playlist(&manifest)?;
        log::info!(
            "[Playlist] {} renditions available for {}",
            sources.len(),
            channel
        );
        Ok(sources)
    }

    fn manifest_url(&self, channel: &str, access: &ChannelAccessToken) -> TwitchResult<Url> {
        let base = format!(
            "{}/api/channel/hls/{}.m3u8",
            self.settings.usher_base_url.trim_end_matches('/'),
            urlencoding::encode(channel)
        );
        let mut url = Url::parse(&base).map_err(|e| TwitchError::Config(e.to_string()))?;

        let cache_buster: u32 = rand::rng().random_range(0..1_000_000);
        url.query_pairs_mut()
            .append_pair("player", "twitchweb")
            .append_pair("token", &access.token)
            .append_pair("sig", &access.sig)
            .append_pair("allow_audio_only", "true")
            .append_pair("allow_source", "true")
            .append_pair("type", "any")
            .append_pair("p", &cache_buster.to_string());

        Ok(url)
    }
}
