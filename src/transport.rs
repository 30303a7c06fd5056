//! Retrying HTTP transport with circuit-breaker protection.
//!
//! Every upstream request goes through [`ResilientTransport::execute`]:
//!
//! | Outcome | Breaker | Action |
//! |---------|---------|--------|
//! | 2xx | success | return the response |
//! | 429 | failure | pause the request queue for `Retry-After`, wait, retry |
//! | 5xx, network error, timeout | failure | exponential backoff, retry |
//! | 401 / 403 | untouched | fail with `AUTH_ERROR` |
//! | 404 | untouched | fail with `NOT_FOUND` |
//! | other 4xx | untouched | fail with `BAD_REQUEST` |
//!
//! Each attempt first waits for rate budget from the [`RateGovernor`], then
//! asks the breaker for admission. Every request that actually goes out is
//! counted in the rate windows, whatever its outcome; a request refused by
//! the breaker or never connected is not.
//!
//! Backoff is `base * 2^attempt` with ±20% jitter. `Retry-After` may be
//! delta-seconds or an HTTP-date; when absent or unparseable the configured
//! default (30 s) is used. Each attempt has its own hard timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::breaker::CircuitBreaker;
use crate::config::TransportConfig;
use crate::error::CatalogError;
use crate::governor::RateGovernor;
use crate::queue::RequestQueue;

const JITTER: f64 = 0.2;
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, Copy)]
pub struct TransportSettings {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
    pub default_retry_after: Duration,
}

impl From<&TransportConfig> for TransportSettings {
    fn from(c: &TransportConfig) -> Self {
        Self {
            max_attempts: c.max_attempts.max(1),
            base_delay: Duration::from_millis(c.base_delay_ms),
            timeout: Duration::from_secs(c.timeout_secs),
            default_retry_after: Duration::from_secs(c.default_retry_after_secs),
        }
    }
}

/// Parse a `Retry-After` header value relative to `now`.
///
/// Accepts delta-seconds (`"120"`) or an HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Dates in the past yield zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = at.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

/// `base * 2^attempt * (1 + jitter)`, with `jitter` clamped to ±20%.
pub fn backoff_delay(base: Duration, attempt: u32, jitter: f64) -> Duration {
    let factor = 2f64.powi(attempt.min(16) as i32) * (1.0 + jitter.clamp(-JITTER, JITTER));
    Duration::from_millis((base.as_millis() as f64 * factor).round() as u64)
}

fn jittered_backoff(base: Duration, attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(-JITTER..=JITTER);
    backoff_delay(base, attempt, jitter)
}

/// Whether a send attempt left the process. Connect and builder failures
/// never did; a timeout may have.
fn reached_upstream(result: &reqwest::Result<Response>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => !(e.is_connect() || e.is_builder()),
    }
}

async fn error_body(response: Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

pub struct ResilientTransport {
    client: Client,
    breaker: Arc<CircuitBreaker>,
    governor: Arc<RateGovernor>,
    queue: RequestQueue,
    settings: TransportSettings,
}

impl ResilientTransport {
    pub fn new(
        client: Client,
        breaker: Arc<CircuitBreaker>,
        governor: Arc<RateGovernor>,
        queue: RequestQueue,
        settings: TransportSettings,
    ) -> Self {
        Self {
            client,
            breaker,
            governor,
            queue,
            settings,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Send the request produced by `build`, retrying per the table above.
    ///
    /// `build` is called once per attempt so each attempt gets a fresh
    /// request.
    pub async fn execute<F>(&self, build: F) -> Result<Response, CatalogError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut last_err: Option<CatalogError> = None;

        for attempt in 0..self.settings.max_attempts {
            self.governor.acquire().await?;
            self.breaker.try_acquire()?;

            let result = build(&self.client).timeout(self.settings.timeout).send().await;
            if reached_upstream(&result) {
                self.governor.record_call().await;
            }
            let more = attempt + 1 < self.settings.max_attempts;

            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    self.breaker.record_failure();
                    let err = if e.is_timeout() {
                        CatalogError::Timeout(self.settings.timeout)
                    } else {
                        CatalogError::from(e)
                    };
                    warn!(attempt = attempt + 1, error = %err, "upstream request failed");
                    if more {
                        tokio::time::sleep(jittered_backoff(self.settings.base_delay, attempt)).await;
                    }
                    last_err = Some(err);
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                self.breaker.record_success();
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| parse_retry_after(v, Utc::now()))
                    .unwrap_or(self.settings.default_retry_after);
                self.queue.pause(retry_after);
                self.breaker.record_failure();
                warn!(
                    attempt = attempt + 1,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "upstream rate limited"
                );
                if more {
                    tokio::time::sleep(retry_after).await;
                }
                last_err = Some(CatalogError::RateLimited { retry_after });
                continue;
            }

            if status.is_server_error() {
                self.breaker.record_failure();
                let body = error_body(response).await;
                warn!(attempt = attempt + 1, status = status.as_u16(), "upstream server error");
                if more {
                    tokio::time::sleep(jittered_backoff(self.settings.base_delay, attempt)).await;
                }
                last_err = Some(CatalogError::Server {
                    status: status.as_u16(),
                    body,
                });
                continue;
            }

            // Client errors say nothing about upstream health.
            self.breaker.release();
            let code = status.as_u16();
            let body = error_body(response).await;
            debug!(status = code, "upstream client error, not retrying");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::Auth {
                    status: code,
                    message: body,
                },
                StatusCode::NOT_FOUND => CatalogError::NotFound(body),
                _ => CatalogError::BadRequest { status: code, body },
            });
        }

        Err(last_err.unwrap_or_else(|| CatalogError::Internal("no attempts made".to_string())))
    }
}
