//! Rate-limit snapshots reported by the API and the client's latest-seen cache.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

const NAME: &str = "x-ratelimit-name";
const LIMIT: &str = "x-ratelimit-limit";
const PERIOD: &str = "x-ratelimit-period";
const REMAINING: &str = "x-ratelimit-remaining";
const RESET: &str = "x-ratelimit-reset";

/// Quota usage as reported on one response. Fields the server omits stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub name: Option<String>,
    pub limit: Option<u64>,
    /// Window length in seconds.
    pub period: Option<u64>,
    pub remaining: Option<u64>,
    /// Seconds until the window resets.
    pub reset: Option<u64>,
}

impl RateLimit {
    /// Read the `X-RateLimit-*` headers. Returns `None` when none are present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        };
        let number = |name: &str| text(name).and_then(|s| s.parse::<u64>().ok());

        let present = [NAME, LIMIT, PERIOD, REMAINING, RESET]
            .iter()
            .any(|h| headers.contains_key(*h));
        if !present {
            return None;
        }
        Some(Self {
            name: text(NAME).filter(|s| !s.is_empty()),
            limit: number(LIMIT),
            period: number(PERIOD),
            remaining: number(REMAINING),
            reset: number(RESET),
        })
    }
}

/// Latest snapshot seen by a client.
///
/// Overwritten by every response that carries one, never cleared. Concurrent
/// requests race: the last completion to record wins.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    latest: RwLock<Option<RateLimit>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, snapshot: RateLimit) {
        let mut guard = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(snapshot);
    }

    pub fn latest(&self) -> Option<RateLimit> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
