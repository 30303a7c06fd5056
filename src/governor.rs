//! Cross-process rate governor.
//!
//! Counts real upstream calls in two fixed windows (the current second and
//! the current hour) stored in the shared [`KvStore`], so every process
//! pointed at the same store draws from one budget. The pre-flight check is
//! read-only; the post-flight record is an atomic increment.
//!
//! The governor is a protective heuristic. If the store cannot be read or
//! written, calls are allowed and the failure is logged.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use grocer_core::models::RateWindowCounter;
use grocer_core::store::KvStore;

use crate::config::RateLimitConfig;
use crate::error::CatalogError;

/// Key prefix of every rate window document.
pub const RATE_PREFIX: &str = "rate_limits/";

const SECOND_SKEW_MS: i64 = 2_000;
const HOUR_SKEW_MS: i64 = 60_000;
const HOUR_SECS: i64 = 3_600;

/// Outcome of a pre-flight check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    pub allowed: bool,
    /// How long until the exhausted window rolls over, when denied.
    pub retry_after: Option<Duration>,
}

impl RateDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after: None,
        }
    }
}

/// The two window keys covering `now_ms`, with their expiry timestamps.
fn windows(now_ms: i64) -> [(String, i64, i64); 2] {
    let sec = now_ms.div_euclid(1000);
    let hour = sec - sec.rem_euclid(HOUR_SECS);
    [
        (format!("second_{}", sec), (sec + 1) * 1000, (sec + 1) * 1000 + SECOND_SKEW_MS),
        (
            format!("hour_{}", hour),
            (hour + HOUR_SECS) * 1000,
            (hour + HOUR_SECS) * 1000 + HOUR_SKEW_MS,
        ),
    ]
}

pub struct RateGovernor {
    store: Arc<dyn KvStore>,
    per_second: i64,
    per_hour: i64,
    max_wait: Duration,
}

impl RateGovernor {
    pub fn new(store: Arc<dyn KvStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            per_second: config.per_second as i64,
            per_hour: config.per_hour as i64,
            max_wait: Duration::from_millis(config.max_wait_ms),
        }
    }

    async fn window_count(&self, window_key: &str) -> anyhow::Result<i64> {
        let doc = self.store.get(&format!("{}{}", RATE_PREFIX, window_key)).await?;
        Ok(match doc {
            Some(v) => serde_json::from_value::<RateWindowCounter>(v)?.count,
            None => 0,
        })
    }

    pub async fn can_proceed(&self) -> RateDecision {
        self.can_proceed_at(chrono::Utc::now().timestamp_millis()).await
    }

    /// Pre-flight check against both windows. Never writes.
    pub async fn can_proceed_at(&self, now_ms: i64) -> RateDecision {
        let [(second_key, second_end, _), (hour_key, hour_end, _)] = windows(now_ms);

        let counts = async {
            let s = self.window_count(&second_key).await?;
            let h = self.window_count(&hour_key).await?;
            anyhow::Ok((s, h))
        }
        .await;

        let (second_count, hour_count) = match counts {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "rate window read failed, allowing call");
                return RateDecision::allow();
            }
        };

        let mut wait_ms: Option<i64> = None;
        if second_count >= self.per_second {
            wait_ms = Some(second_end - now_ms);
        }
        if hour_count >= self.per_hour {
            let h = hour_end - now_ms;
            wait_ms = Some(wait_ms.map_or(h, |w| w.max(h)));
        }

        match wait_ms {
            None => RateDecision::allow(),
            Some(ms) => {
                debug!(second_count, hour_count, retry_after_ms = ms, "rate budget exhausted");
                RateDecision {
                    allowed: false,
                    retry_after: Some(Duration::from_millis(ms.max(1) as u64)),
                }
            }
        }
    }

    pub async fn record_call(&self) {
        self.record_call_at(chrono::Utc::now().timestamp_millis()).await
    }

    /// Count one real upstream call in both windows.
    pub async fn record_call_at(&self, now_ms: i64) {
        for (window_key, _, expires_at) in windows(now_ms) {
            let key = format!("{}{}", RATE_PREFIX, window_key);
            let init = json!({ "windowKey": window_key, "expiresAt": expires_at });
            if let Err(e) = self.store.increment(&key, "count", 1, Some(init)).await {
                warn!(error = %e, key = %key, "rate window increment failed");
            }
        }
    }

    /// Wait until both windows have budget, up to the configured maximum.
    pub async fn acquire(&self) -> Result<(), CatalogError> {
        let mut waited = Duration::ZERO;
        loop {
            let decision = self.can_proceed().await;
            if decision.allowed {
                return Ok(());
            }
            let retry_after = decision.retry_after.unwrap_or(Duration::from_secs(1));
            if waited + retry_after > self.max_wait {
                warn!(
                    retry_after_ms = retry_after.as_millis() as u64,
                    "rate budget not available within wait limit"
                );
                return Err(CatalogError::Throttled { retry_after });
            }
            debug!(retry_after_ms = retry_after.as_millis() as u64, "waiting for rate budget");
            tokio::time::sleep(retry_after).await;
            waited += retry_after;
        }
    }

    /// Delete expired windows. Optional housekeeping.
    pub async fn sweep(&self, now_ms: i64) -> anyhow::Result<u64> {
        self.store.delete_expired(RATE_PREFIX, now_ms).await
    }
}
