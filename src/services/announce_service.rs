use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    Live,
    Status,
    Play,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub kind: AnnouncementKind,
    pub channel: Option<String>,
    pub text: String,
    pub data: Value,
    pub sent_at: String,
}

impl Announcement {
    pub fn new(kind: AnnouncementKind, channel: Option<&str>, text: &str, data: Value) -> Self {
        Self {
            kind,
            channel: channel.map(String::from),
            text: text.to_string(),
            data,
            sent_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Fans announcements out to every connected WebSocket client.
#[derive(Clone)]
pub struct Announcer {
    tx: Arc<broadcast::Sender<String>>,
}

impl Announcer {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<String>(capacity.max(1));
        Self { tx: Arc::new(tx) }
    }

    /// Returns how many clients the message reached.
    pub fn announce(&self, announcement: &Announcement) -> usize {
        let message = match serde_json::to_string(announcement) {
            Ok(m) => m,
            Err(e) => {
                log::error!("[Announcer] Failed to serialize announcement: {}", e);
                return 0;
            }
        };

        match self.tx.send(message) {
            Ok(receivers) => {
                log::debug!(
                    "[Announcer] {:?} sent to {} clients",
                    announcement.kind,
                    receivers
                );
                receivers
            }
            // No one listening is not an error
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub async fn handle_client(socket: warp::ws::WebSocket, announcer: Announcer) {
        let (mut client_tx, _client_rx) = socket.split();
        let mut rx = announcer.subscribe();

        log::info!("[WS] Client connected ({} total)", announcer.client_count());

        loop {
            match rx.recv().await {
                Ok(text) => {
                    if client_tx.send(warp::ws::Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("[WS] Slow client skipped {} announcements", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }

        log::info!("[WS] Client disconnected");
    }
}
