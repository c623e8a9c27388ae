//! Bounded retry with exponential backoff, jitter and `Retry-After` support.
//!
//! Only used for Fleet API reads, which are all idempotent.

use std::time::Duration;

use fleetdash_core::config::RetryConfig;
use fleetdash_core::error::Result;
use rand::Rng;
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Longest wait a `Retry-After` header can impose on one attempt.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Statuses worth another attempt: throttling and server-side failures.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send the request produced by `build`, retrying transport errors and retryable statuses.
///
/// When retries run out the last response is returned as-is so the caller can
/// map its status and body.
pub async fn send_with_retry<F>(config: &RetryConfig, mut build: F) -> Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if !is_retryable_status(status) {
                    return Ok(response);
                }
                if attempt > config.max_retries {
                    debug!(attempt, %status, "retries exhausted");
                    return Ok(response);
                }

                let wait = retry_after(&response).unwrap_or_else(|| backoff(config, attempt));
                warn!(
                    attempt,
                    max_attempts = config.max_retries + 1,
                    %status,
                    wait_ms = wait.as_millis() as u64,
                    "fleet API request failed, retrying"
                );
                sleep(wait).await;
            }
            Err(e) => {
                if attempt > config.max_retries {
                    return Err(e.into());
                }

                let wait = backoff(config, attempt);
                warn!(
                    attempt,
                    max_attempts = config.max_retries + 1,
                    error = %e,
                    wait_ms = wait.as_millis() as u64,
                    "fleet API request errored, retrying"
                );
                sleep(wait).await;
            }
        }
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    let value = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?;
    parse_retry_after(value)
}

/// A `Retry-After` value in whole seconds, capped at [`MAX_RETRY_AFTER`].
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

/// `base * 2^(attempt-1)`, capped at `max`, plus up to `jitter` ms.
pub fn backoff(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(32);
    let raw = config.base_backoff_ms.saturating_mul(1u64 << exp);
    let capped = raw.min(config.max_backoff_ms);

    let jitter = if config.jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=config.jitter_ms)
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_backoff_ms: 1,
            max_backoff_ms: 5,
            jitter_ms: 0,
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            base_backoff_ms: 100,
            max_backoff_ms: 1000,
            jitter_ms: 0,
        };
        assert_eq!(backoff(&config, 1), Duration::from_millis(100));
        assert_eq!(backoff(&config, 2), Duration::from_millis(200));
        assert_eq!(backoff(&config, 3), Duration::from_millis(400));
        assert_eq!(backoff(&config, 10), Duration::from_millis(1000));
        assert_eq!(backoff(&config, 200), Duration::from_millis(1000));
    }

    #[test]
    fn backoff_jitter_is_bounded() {
        let config = RetryConfig {
            max_retries: 1,
            base_backoff_ms: 10,
            max_backoff_ms: 10,
            jitter_ms: 5,
        };
        for _ in 0..50 {
            let wait = backoff(&config, 1).as_millis();
            assert!((10..=15).contains(&wait));
        }
    }

    #[test]
    fn retry_after_is_capped() {
        assert_eq!(parse_retry_after(" 2 "), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after("86400"), Some(MAX_RETRY_AFTER));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::OK));
    }

    #[tokio::test]
    async fn server_error_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/flaky", server.uri());
        let resp = send_with_retry(&fast(), || client.get(&url)).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/bad", server.uri());
        let resp = send_with_retry(&fast(), || client.get(&url)).await.unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/down", server.uri());
        let resp = send_with_retry(&fast(), || client.get(&url)).await.unwrap();
        assert_eq!(resp.status(), 500);
    }

    #[tokio::test]
    async fn disabled_retry_sends_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/once"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/once", server.uri());
        let resp = send_with_retry(&RetryConfig::disabled(), || client.get(&url))
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
    }

    #[tokio::test]
    async fn retry_after_header_is_honoured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/throttled", server.uri());
        let start = std::time::Instant::now();
        let resp = send_with_retry(&fast(), || client.get(&url)).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn transport_error_surfaces_after_retries() {
        let client = Client::new();
        let err = send_with_retry(&fast(), || client.get("http://127.0.0.1:1/unreachable"))
            .await
            .unwrap_err();
        assert!(matches!(err, fleetdash_core::error::FleetError::Http(_)));
    }
}
