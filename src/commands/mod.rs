pub mod channel;
pub mod live;

use warp::http::StatusCode;
use warp::reply::{Reply, Response};

const FAILURE_TEXT: &str = "Sorry, I couldn't reach Twitch right now.";

pub fn text_reply(text: String) -> Response {
    warp::reply::with_status(text, StatusCode::OK).into_response()
}

/// Every failed request still gets an answer; the cause only goes to the log.
pub fn failure_reply(route: &str, error: &anyhow::Error) -> Response {
    log::error!("[{}] Request failed: {:#}", route, error);
    warp::reply::with_status(FAILURE_TEXT.to_string(), StatusCode::BAD_GATEWAY).into_response()
}
