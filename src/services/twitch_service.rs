use crate::error::{TwitchError, TwitchResult};
use crate::models::settings::TwitchApiSettings;
use crate::models::stream::{viewer_count, ChannelRef, ChannelStatus, StreamRecord};
use crate::models::user::{user_id, UserInfo};
use crate::services::token_service::TokenService;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Page size for `/helix/users/follows`.
const ITEMS_PER_REQUEST: usize = 10;
/// Helix caps repeated id/login parameters at 100 per request.
const MAX_BATCH: usize = 100;

/// How a path is signed, decided by its API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    OAuth,
    ClientIdQuery,
}

impl AuthScheme {
    pub fn for_path(path: &str) -> Self {
        if path.starts_with("/helix") {
            AuthScheme::Bearer
        } else if path.starts_with("/kraken") {
            AuthScheme::OAuth
        } else {
            AuthScheme::ClientIdQuery
        }
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<Map<String, Value>>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyStreamResponse {
    stream: Option<LegacyStream>,
}

#[derive(Debug, Deserialize)]
struct LegacyStream {
    #[serde(default)]
    game: Option<String>,
    #[serde(default)]
    viewers: u64,
    channel: LegacyChannel,
}

#[derive(Debug, Deserialize)]
struct LegacyChannel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub struct TwitchService {
    pub(crate) client: Client,
    pub(crate) settings: TwitchApiSettings,
    tokens: TokenService,
}

impl TwitchService {
    pub fn new(settings: TwitchApiSettings) -> Self {
        let client = Client::new();
        let tokens = TokenService::new(client.clone(), &settings);

        Self {
            client,
            settings,
            tokens,
        }
    }

    /// GET an API path and decode the JSON body. Helix paths are signed with
    /// `Bearer`, kraken paths with `OAuth`; anything else goes out unsigned with
    /// `client_id` in the query string.
    pub async fn request(&self, path: &str) -> TwitchResult<Value> {
        let url = format!(
            "{}{}",
            self.settings.api_base_url.trim_end_matches('/'),
            path
        );
        let mut builder = self.client.get(&url);

        match AuthScheme::for_path(path) {
            AuthScheme::Bearer => {
                let token = self.tokens.ensure_token().await?;
                builder = builder
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header("Client-Id", &self.settings.client_id);
            }
            AuthScheme::OAuth => {
                let token = self.tokens.ensure_token().await?;
                builder = builder
                    .header(AUTHORIZATION, format!("OAuth {}", token))
                    .header("Client-Id", &self.settings.client_id)
                    .header(ACCEPT, "application/vnd.twitchtv.v5+json");
            }
            AuthScheme::ClientIdQuery => {
                builder = builder.query(&[("client_id", self.settings.client_id.as_str())]);
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        if status != 200 {
            log::warn!("[TwitchService] {} failed with {}", path, status);
            return Err(TwitchError::Upstream {
                path: path.to_string(),
                status,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Every channel id `user_id` follows, in page order.
    pub async fn get_followers(&self, user_id: &str) -> TwitchResult<Vec<ChannelRef>> {
        let mut following = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut path = format!(
                "/helix/users/follows?first={}&from_id={}",
                ITEMS_PER_REQUEST,
                urlencoding::encode(user_id)
            );
            if let Some(cursor) = &cursor {
                path.push_str(&format!("&after={}", urlencoding::encode(cursor)));
            }

            let page: Page = serde_json::from_value(self.request(&path).await?)?;
            let count = page.data.len();

            following.extend(
                page.data
                    .iter()
                    .filter_map(|follow| follow.get("to_id").and_then(|v| v.as_str()))
                    .map(|id| ChannelRef::Id(id.to_string())),
            );

            // A short page is the last page
            if count < ITEMS_PER_REQUEST {
                break;
            }

            cursor = page.pagination.and_then(|p| p.cursor);
            if cursor.is_none() {
                log::warn!(
                    "[TwitchService] Full follows page for {} without a cursor, stopping",
                    user_id
                );
                break;
            }
        }

        log::debug!(
            "[TwitchService] {} follows {} channels",
            user_id,
            following.len()
        );
        Ok(following)
    }

    /// Live streams among `refs`, queried 100 at a time, in input order.
    /// A single ref is just a one-element iterator; no refs means no request.
    pub async fn get_live_streams<I, R>(&self, refs: I) -> TwitchResult<Vec<StreamRecord>>
    where
        I: IntoIterator<Item = R>,
        R: Into<ChannelRef>,
    {
        let refs: Vec<ChannelRef> = refs.into_iter().map(Into::into).collect();
        let mut streams = Vec::new();

        for chunk in refs.chunks(MAX_BATCH) {
            let params = chunk
                .iter()
                .map(|channel| {
                    let (key, value) = channel.query_pair();
                    format!("{}={}", key, urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&");

            let path = format!("/helix/streams?first={}&type=live&{}", MAX_BATCH, params);
            let page: Page = serde_json::from_value(self.request(&path).await?)?;
            streams.extend(page.data);
        }

        Ok(streams)
    }

    /// Batched `/helix/users?id=` lookup.
    pub async fn get_user_info(&self, ids: &[String]) -> TwitchResult<Vec<UserInfo>> {
        let mut users = Vec::new();

        for chunk in ids.chunks(MAX_BATCH) {
            let params = chunk
                .iter()
                .map(|id| format!("id={}", urlencoding::encode(id)))
                .collect::<Vec<_>>()
                .join("&");

            let page: Page =
                serde_json::from_value(self.request(&format!("/helix/users?{}", params)).await?)?;
            users.extend(page.data);
        }

        Ok(users)
    }

    pub async fn get_user_id(&self, login: &str) -> TwitchResult<Option<String>> {
        let path = format!("/helix/users?login={}", urlencoding::encode(login));
        let page: Page = serde_json::from_value(self.request(&path).await?)?;

        Ok(page
            .data
            .first()
            .and_then(|user| user_id(user))
            .map(String::from))
    }

    /// "Now playing" details for one channel from the legacy API, `None` when
    /// the channel is offline.
    pub async fn get_channel_status(&self, channel: &str) -> TwitchResult<Option<ChannelStatus>> {
        let path = format!("/kraken/streams/{}", urlencoding::encode(channel));
        let response: LegacyStreamResponse = serde_json::from_value(self.request(&path).await?)?;

        Ok(response.stream.map(|stream| ChannelStatus {
            display_name: stream
                .channel
                .display_name
                .unwrap_or_else(|| stream.channel.name.clone()),
            channel: stream.channel.name,
            game: stream.game,
            status: stream.channel.status,
            viewers: stream.viewers,
        }))
    }

    /// Followed channels that are live, enriched with their user records and
    /// ordered by viewer count. Any failing step fails the whole call.
    pub async fn live_followed_streams(&self, user_id: &str) -> TwitchResult<Vec<StreamRecord>> {
        let following = self.get_followers(user_id).await?;
        let streams = self.get_live_streams(following).await?;

        let ids: Vec<String> = streams
            .iter()
            .filter_map(|s| s.get("user_id").and_then(|v| v.as_str()))
            .map(String::from)
            .collect();

        let users = self.get_user_info(&ids).await?;
        let merged = merge_streams(streams, users);

        log::info!(
            "[TwitchService] {} followed channels live for {}",
            merged.len(),
            user_id
        );
        Ok(merged)
    }
}

/// Joins streams with users on `user_id == id`. Streams without a user are
/// dropped, user fields overwrite stream fields, and the result is sorted by
/// viewer count descending (stable for ties).
pub fn merge_streams(streams: Vec<StreamRecord>, users: Vec<UserInfo>) -> Vec<StreamRecord> {
    let users_by_id: HashMap<String, UserInfo> = users
        .into_iter()
        .filter_map(|user| {
            let id = user_id(&user)?.to_string();
            Some((id, user))
        })
        .collect();

    let mut merged: Vec<StreamRecord> = streams
        .into_iter()
        .filter_map(|mut stream| {
            let id = stream.get("user_id").and_then(|v| v.as_str())?;
            let user = users_by_id.get(id)?;
            for (key, value) in user {
                stream.insert(key.clone(), value.clone());
            }
            Some(stream)
        })
        .collect();

    merged.sort_by(|a, b| viewer_count(b).cmp(&viewer_count(a)));
    merged
}
