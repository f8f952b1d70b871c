use crate::commands::{failure_reply, text_reply};
use crate::models::settings::AppState;
use crate::services::announce_service::{Announcement, AnnouncementKind};
use anyhow::Result;
use warp::reply::{Reply, Response};

pub async fn status_announcement(raw_channel: &str, state: &AppState) -> Result<Announcement> {
    let channel = state.matcher.resolve(raw_channel).await;

    match state.twitch.get_channel_status(&channel).await? {
        Some(status) => {
            state.matcher.remember(&status.channel).await;
            Ok(Announcement::new(
                AnnouncementKind::Status,
                Some(&status.channel),
                &status.now_playing(),
                serde_json::to_value(&status)?,
            ))
        }
        None => Ok(Announcement::new(
            AnnouncementKind::Status,
            Some(&channel),
            &format!("{} is offline right now.", channel),
            serde_json::Value::Null,
        )),
    }
}

pub async fn play_announcement(raw_channel: &str, state: &AppState) -> Result<Announcement> {
    let channel = state.matcher.resolve(raw_channel).await;
    let sources = state.twitch.get_streams(&channel).await?;

    let text = match sources.first() {
        Some(best) => {
            state.matcher.remember(&channel).await;
            format!("Playing {} in {}.", channel, best.quality)
        }
        None => format!("{} has no playable streams.", channel),
    };

    Ok(Announcement::new(
        AnnouncementKind::Play,
        Some(&channel),
        &text,
        serde_json::to_value(&sources)?,
    ))
}

pub async fn channel_status(channel: String, state: AppState) -> Result<Response, warp::Rejection> {
    match status_announcement(&channel, &state).await {
        Ok(announcement) => {
            state.announcer.announce(&announcement);
            Ok(text_reply(announcement.text))
        }
        Err(e) => Ok(failure_reply("status", &e)),
    }
}

pub async fn channel_play(channel: String, state: AppState) -> Result<Response, warp::Rejection> {
    match play_announcement(&channel, &state).await {
        Ok(announcement) => {
            state.announcer.announce(&announcement);
            Ok(warp::reply::json(&announcement.data).into_response())
        }
        Err(e) => Ok(failure_reply("play", &e)),
    }
}

pub async fn resolve_channel(channel: String, state: AppState) -> Result<Response, warp::Rejection> {
    Ok(text_reply(state.matcher.resolve(&channel).await))
}
