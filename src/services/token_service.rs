use crate::error::{TwitchError, TwitchResult};
use crate::models::settings::TwitchApiSettings;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// App access token from the client-credentials grant, cached for the life of
/// the process.
pub struct TokenService {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<String>>,
}

impl TokenService {
    pub fn new(client: Client, settings: &TwitchApiSettings) -> Self {
        Self {
            client,
            token_url: format!("{}/oauth2/token", settings.auth_base_url.trim_end_matches('/')),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            token: Mutex::new(None),
        }
    }

    /// Returns the cached token, fetching it on first use. The lock is held
    /// across the exchange so concurrent first callers share one request.
    pub async fn ensure_token(&self) -> TwitchResult<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.fetch_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn fetch_token(&self) -> TwitchResult<String> {
        log::debug!("[TokenService] Requesting app access token");

        let response = self
            .client
            .post(&self.token_url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            log::error!("[TokenService] Get token failed with {}", status);
            return Err(TwitchError::Auth(status));
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;

        log::info!(
            "[TokenService] Token acquired (expires in {:?}s)",
            token.expires_in
        );
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> TwitchApiSettings {
        TwitchApiSettings {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            auth_base_url: server.uri(),
            ..TwitchApiSettings::default()
        }
    }

    #[tokio::test]
    async fn test_token_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(query_param("grant_type", "client_credentials"))
            .and(query_param("client_id", "cid"))
            .and(query_param("client_secret", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok123",
                "expires_in": 5000,
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = TokenService::new(Client::new(), &settings_for(&server));
        assert_eq!(service.ensure_token().await.unwrap(), "tok123");
        assert_eq!(service.ensure_token().await.unwrap(), "tok123");
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "shared" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = TokenService::new(Client::new(), &settings_for(&server));
        let (a, b) = tokio::join!(service.ensure_token(), service.ensure_token());
        assert_eq!(a.unwrap(), "shared");
        assert_eq!(b.unwrap(), "shared");
    }

    #[tokio::test]
    async fn test_non_200_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let service = TokenService::new(Client::new(), &settings_for(&server));
        match service.ensure_token().await {
            Err(TwitchError::Auth(403)) => {}
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_token_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let service = TokenService::new(Client::new(), &settings_for(&server));
        assert!(matches!(
            service.ensure_token().await,
            Err(TwitchError::Decode(_))
        ));
    }
}
