use crate::commands::{failure_reply, text_reply};
use crate::models::settings::AppState;
use crate::models::stream::{display_name, ChannelRef};
use crate::services::announce_service::{Announcement, AnnouncementKind};
use crate::services::channel_matcher::normalize_channel;
use crate::utils::speech::live_sentence;
use anyhow::{Context, Result};
use serde_json::Value;
use warp::reply::Response;

/// Builds the announcement for `/live/{user}`. `user` may be a numeric id or a
/// login name, still percent-encoded as it came off the path.
pub async fn live_announcement(user: &str, state: &AppState) -> Result<Announcement> {
    let user = normalize_channel(user);
    let user_id = match ChannelRef::classify(&user) {
        ChannelRef::Id(id) => id,
        ChannelRef::Login(login) => state
            .twitch
            .get_user_id(&login)
            .await?
            .with_context(|| format!("No Twitch user named '{}'", login))?,
    };

    let mut live = state.twitch.live_followed_streams(&user_id).await?;
    live.truncate(state.settings.announce.max_announced);

    let names: Vec<&str> = live.iter().filter_map(display_name).collect();
    let text = live_sentence(&names);

    let data = Value::Array(live.into_iter().map(Value::Object).collect());
    Ok(Announcement::new(AnnouncementKind::Live, None, &text, data))
}

pub async fn announce_live(user: String, state: AppState) -> Result<Response, warp::Rejection> {
    log::info!("[Live] Live followed channels requested for {}", user);

    match live_announcement(&user, &state).await {
        Ok(announcement) => {
            state.announcer.announce(&announcement);
            Ok(text_reply(announcement.text))
        }
        Err(e) => Ok(failure_reply("live", &e)),
    }
}
