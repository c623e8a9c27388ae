//! OAuth client-credentials token cache for the Fleet API.
//!
//! One [`TokenCache`] is built per process and shared by reference. The cached
//! token lives behind an async mutex that is held for the whole exchange, so
//! concurrent callers that find the token expired wait for a single refresh
//! and then share its result.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use fleetdash_core::config::BoltConfig;
use fleetdash_core::error::{FleetError, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::TokenResponse;

/// Upper bound on the token lifetime accepted from the token endpoint.
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400 * 365;

/// Client id and secret issued by the platform.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// A bearer token and the instant after which it must not be sent.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub struct TokenCache {
    http: reqwest::Client,
    token_url: String,
    scope: String,
    refresh_margin: Duration,
    credentials: RwLock<Option<Credentials>>,
    token: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    /// Build a cache from the `[bolt]` settings. Credentials are applied when present.
    pub fn new(config: &BoltConfig, http: reqwest::Client) -> Self {
        let credentials = config
            .is_configured()
            .then(|| Credentials::new(&config.client_id, &config.client_secret));
        Self {
            http,
            token_url: config.token_url.clone(),
            scope: config.scope.clone(),
            refresh_margin: Duration::seconds(
                config
                    .token_refresh_margin_secs
                    .min(MAX_TOKEN_LIFETIME_SECS as u64) as i64,
            ),
            credentials: RwLock::new(credentials),
            token: Mutex::new(None),
        }
    }

    /// Set the credentials used for future exchanges.
    ///
    /// Re-applying the current credentials keeps the cached token; different
    /// credentials drop it.
    pub async fn configure(&self, credentials: Credentials) {
        let mut token = self.token.lock().await;
        let mut current = self
            .credentials
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if current.as_ref() == Some(&credentials) {
            return;
        }
        debug!(client_id = %credentials.client_id, "fleet API credentials configured");
        *current = Some(credentials);
        *token = None;
    }

    pub fn is_configured(&self) -> bool {
        self.credentials
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Drop the cached token so the next call performs a fresh exchange.
    pub async fn invalidate(&self) {
        let mut token = self.token.lock().await;
        if token.take().is_some() {
            debug!("cached fleet API token invalidated");
        }
    }

    /// Return a usable bearer token, exchanging credentials when the cache is empty or stale.
    pub async fn get_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_usable(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let credentials = self
            .credentials
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| FleetError::Config("fleet API credentials are not configured".into()))?;

        let fresh = self.exchange(&credentials).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<AccessToken> {
        debug!(token_url = %self.token_url, "requesting fleet API access token");

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ];
        let resp = self.http.post(&self.token_url).form(&params).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, "fleet API token exchange rejected");
            return Err(FleetError::Auth { status, body });
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| FleetError::RemoteProtocol(format!("token response parse failed: {e}")))?;

        let lifetime = body.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        if lifetime != body.expires_in {
            warn!(expires_in = body.expires_in, lifetime, "token lifetime out of range, clamped");
        }
        let expires_at = Utc::now() + Duration::seconds(lifetime) - self.refresh_margin;
        info!(expires_in = lifetime, %expires_at, "fleet API access token refreshed");

        Ok(AccessToken {
            value: body.access_token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> BoltConfig {
        BoltConfig {
            client_id: "client-1".into(),
            client_secret: "s3cret".into(),
            token_url: format!("{}/token", server.uri()),
            ..Default::default()
        }
    }

    fn token_body(token: &str, expires_in: i64) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "Bearer",
            "scope": "fleet-integration:api"
        })
    }

    #[tokio::test]
    async fn token_is_cached_until_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("scope=fleet-integration%3Aapi"))
            .and(body_string_contains("client_id=client-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        assert_eq!(cache.get_token().await.unwrap(), "tok-1");
        assert_eq!(cache.get_token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn token_inside_safety_margin_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("short", 30)))
            .expect(2)
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        cache.get_token().await.unwrap();
        cache.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_lifetime_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("long", i64::MAX)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        assert_eq!(cache.get_token().await.unwrap(), "long");
        assert_eq!(cache.get_token().await.unwrap(), "long");

        let expires_at = cache.token.lock().await.as_ref().unwrap().expires_at;
        assert!(expires_at <= Utc::now() + Duration::seconds(MAX_TOKEN_LIFETIME_SECS));
    }

    #[tokio::test]
    async fn negative_lifetime_is_never_reused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("stale", i64::MIN)))
            .expect(2)
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        cache.get_token().await.unwrap();
        cache.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("shared", 3600))
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(TokenCache::new(&config_for(&server), reqwest::Client::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
    }

    #[tokio::test]
    async fn missing_credentials_is_config_error() {
        let cache = TokenCache::new(&BoltConfig::default(), reqwest::Client::new());
        assert!(!cache.is_configured());
        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, FleetError::Config(_)));
    }

    #[tokio::test]
    async fn rejected_exchange_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        match cache.get_token().await.unwrap_err() {
            FleetError::Auth { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid_client");
            }
            other => panic!("expected Auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparsable_token_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, FleetError::RemoteProtocol(_)));
    }

    #[tokio::test]
    async fn reconfigure_with_same_credentials_keeps_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        cache.get_token().await.unwrap();
        cache.configure(Credentials::new("client-1", "s3cret")).await;
        cache.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn new_credentials_and_invalidate_force_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok", 3600)))
            .expect(3)
            .mount(&server)
            .await;

        let cache = TokenCache::new(&config_for(&server), reqwest::Client::new());
        cache.get_token().await.unwrap();
        cache.configure(Credentials::new("client-2", "other")).await;
        cache.get_token().await.unwrap();
        cache.invalidate().await;
        cache.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn configure_enables_unconfigured_cache() {
        let cache = TokenCache::new(&BoltConfig::default(), reqwest::Client::new());
        cache.configure(Credentials::new("id", "secret")).await;
        assert!(cache.is_configured());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials::new("id", "very-secret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("id"));
        assert!(!rendered.contains("very-secret"));

        let token = AccessToken {
            value: "bearer-value".into(),
            expires_at: Utc::now(),
        };
        assert!(!format!("{token:?}").contains("bearer-value"));
    }

    #[test]
    fn token_usable_strictly_before_expiry() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".into(),
            expires_at: now,
        };
        assert!(!token.is_usable(now));
        assert!(token.is_usable(now - Duration::seconds(1)));
    }
}
