use crate::commands::{channel, live};
use crate::models::settings::AppState;
use crate::services::announce_service::Announcer;
use std::convert::Infallible;
use std::net::SocketAddr;
use warp::Filter;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let live = warp::path!("live" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(live::announce_live);

    let status = warp::path!("status" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(channel::channel_status);

    let play = warp::path!("play" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(channel::channel_play);

    let resolve = warp::path!("resolve" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(channel::resolve_channel);

    let announcer = state.announcer.clone();
    let ws = warp::path!("ws")
        .and(warp::ws())
        .map(move |ws: warp::ws::Ws| {
            let announcer = announcer.clone();
            ws.on_upgrade(move |socket| Announcer::handle_client(socket, announcer))
        });

    live.or(status).or(play).or(resolve).or(ws)
}

pub async fn serve(state: AppState) {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    log::info!(
        "[Server] Twitch voice relay ready to serve on port {}",
        state.settings.port
    );
    warp::serve(routes(state)).run(addr).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::Settings;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const APOLOGY: &str = "Sorry, I couldn't reach Twitch right now.";

    async fn mock_state() -> (MockServer, AppState) {
        let server = MockServer::start().await;
        let mut settings = Settings::default();
        settings.twitch.client_id = "cid".to_string();
        settings.twitch.client_secret = "secret".to_string();
        settings.twitch.api_base_url = server.uri();
        settings.twitch.auth_base_url = server.uri();
        settings.twitch.usher_base_url = server.uri();

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })),
            )
            .mount(&server)
            .await;

        (server, AppState::new(settings))
    }

    async fn mount_live_shroud(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/kraken/streams/shroud"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stream": {
                    "game": "VALORANT",
                    "viewers": 100,
                    "channel": { "name": "shroud", "display_name": "shroud", "status": "ranked" }
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_live_failure_replies_502_without_broadcast() {
        let (server, state) = mock_state().await;
        Mock::given(method("GET"))
            .and(path("/helix/users/follows"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut rx = state.announcer.subscribe();
        let res = warp::test::request()
            .path("/live/99")
            .reply(&routes(state.clone()))
            .await;

        assert_eq!(res.status(), 502);
        assert_eq!(res.body().as_ref(), APOLOGY.as_bytes());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_status_failure_replies_502_without_broadcast() {
        let (server, state) = mock_state().await;
        Mock::given(method("GET"))
            .and(path("/kraken/streams/shroud"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut rx = state.announcer.subscribe();
        let res = warp::test::request()
            .path("/status/shroud")
            .reply(&routes(state.clone()))
            .await;

        assert_eq!(res.status(), 502);
        assert_eq!(res.body().as_ref(), APOLOGY.as_bytes());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_status_success_replies_and_broadcasts() {
        let (server, state) = mock_state().await;
        mount_live_shroud(&server).await;

        let mut rx = state.announcer.subscribe();
        let res = warp::test::request()
            .path("/status/shroud")
            .reply(&routes(state.clone()))
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.body().as_ref(), b"shroud is playing VALORANT: ranked");

        let message: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(message["kind"], "status");
        assert_eq!(message["channel"], "shroud");
    }

    #[tokio::test]
    async fn test_resolve_route_replies_normalized_name() {
        let (_server, state) = mock_state().await;
        let res = warp::test::request()
            .path("/resolve/Shroud%20")
            .reply(&routes(state))
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.body().as_ref(), b"shroud");
    }

    #[tokio::test]
    async fn test_ws_client_receives_announcements() {
        let (server, state) = mock_state().await;
        mount_live_shroud(&server).await;

        let mut client = warp::test::ws()
            .path("/ws")
            .handshake(routes(state.clone()))
            .await
            .expect("handshake");

        tokio::time::timeout(Duration::from_secs(5), async {
            while state.announcer.client_count() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("client subscribed");

        warp::test::request()
            .path("/status/shroud")
            .reply(&routes(state.clone()))
            .await;

        let message = client.recv().await.expect("announcement");
        let value: Value = serde_json::from_str(message.to_str().unwrap()).unwrap();
        assert_eq!(value["text"], "shroud is playing VALORANT: ranked");
    }

    #[tokio::test]
    async fn test_ws_route_rejects_trailing_segments() {
        let (_server, state) = mock_state().await;
        let result = warp::test::ws()
            .path("/ws/extra")
            .handshake(routes(state))
            .await;

        assert!(result.is_err());
    }
}
