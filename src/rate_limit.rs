// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Fixed-window admission control for the request/response entry point.
///
/// Keys are caller addresses. Counters live behind one mutex so that
/// concurrent requests for the same key never both observe the last free
/// slot.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, warn};

/// Key used when neither a forwarded address nor a peer address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Admission window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(default)]
pub struct RateLimitConfig
{
    /// Requests admitted per key and window (default: 10).
    pub max_requests:     u32,
    /// Window length in seconds (default: 60).
    pub window_secs:      u64,
    /// Upper bound on simultaneously tracked keys (default: 500).
    pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig
{
    fn default() -> Self
    {
        Self {
            max_requests: 10, window_secs: 60, max_tracked_keys: 500,
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum RateLimitDecision
{
    Allowed
    {
        limit: u32, remaining: u32, reset_after: Duration,
    },
    Limited
    {
        limit: u32, retry_after: Duration,
    },
}

impl RateLimitDecision
{
    pub fn is_allowed(&self,) -> bool
    {
        matches!(self, Self::Allowed { .. })
    }

    pub fn limit(&self,) -> u32
    {
        match self {
            Self::Allowed {
                limit, ..
            }
            | Self::Limited {
                limit, ..
            } => *limit,
        }
    }

    /// Requests still admitted in the current window.
    pub fn remaining(&self,) -> u32
    {
        match self {
            Self::Allowed {
                remaining, ..
            } => *remaining,
            Self::Limited { .. } => 0,
        }
    }

    /// Whole seconds until the caller may retry, rounded up.
    pub fn retry_after_secs(&self,) -> Option<u64,>
    {
        match self {
            Self::Allowed { .. } => None,
            Self::Limited {
                retry_after, ..
            } => Some(ceil_secs(*retry_after,),),
        }
    }
}

/// Whole seconds in `duration`, rounded up.
pub(crate) fn ceil_secs(duration: Duration,) -> u64
{
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 { secs + 1 } else { secs }
}

/// Admission control consulted before an analysis starts.
#[async_trait]
pub trait RateLimiter: Send + Sync
{
    /// Counts one request for `key` and decides whether it is admitted.
    async fn check(&self, key: &str,) -> RateLimitDecision;
}

#[derive(Debug, Clone, Copy,)]
struct Window
{
    started: Instant,
    count:   u32,
}

/// In-memory fixed-window limiter.
pub struct FixedWindowLimiter
{
    config:  RateLimitConfig,
    windows: Mutex<HashMap<String, Window,>,>,
}

impl FixedWindowLimiter
{
    pub fn new(config: RateLimitConfig,) -> Self
    {
        Self {
            config,
            windows: Mutex::new(HashMap::new(),),
        }
    }

    fn window(&self,) -> Duration
    {
        Duration::from_secs(self.config.window_secs,)
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self,) -> usize
    {
        self.windows.lock().await.len()
    }

    /// Makes room for a new key: expired windows first, then the oldest one.
    fn evict(&self, windows: &mut HashMap<String, Window,>, now: Instant,)
    {
        let window = self.window();
        windows.retain(|_, entry| now.duration_since(entry.started,) < window,);
        if windows.len() < self.config.max_tracked_keys {
            return;
        }

        let oldest = windows.iter().min_by_key(|(_, entry,)| entry.started,).map(|(key, _,)| key.clone(),);
        if let Some(key,) = oldest {
            warn!("rate limiter tracking {} keys, evicting {}", windows.len(), key);
            windows.remove(&key,);
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter
{
    async fn check(&self, key: &str,) -> RateLimitDecision
    {
        let now = Instant::now();
        let window = self.window();
        let limit = self.config.max_requests;
        let mut windows = self.windows.lock().await;

        let expired = windows.get(key,).is_some_and(|entry| now.duration_since(entry.started,) >= window,);
        if expired {
            windows.remove(key,);
        }
        if !windows.contains_key(key,) && windows.len() >= self.config.max_tracked_keys {
            self.evict(&mut windows, now,);
        }

        let entry = windows.entry(key.to_owned(),).or_insert(Window {
            started: now, count: 0,
        },);
        let reset_after = window.saturating_sub(now.duration_since(entry.started,),);

        if entry.count >= limit {
            debug!("rate limit exceeded for {}", key);
            return RateLimitDecision::Limited {
                limit,
                retry_after: reset_after,
            };
        }

        entry.count += 1;
        RateLimitDecision::Allowed {
            limit,
            remaining: limit - entry.count,
            reset_after,
        }
    }
}

/// Caller key: first `X-Forwarded-For` entry, else the peer address, else
/// [`UNKNOWN_CLIENT`].
pub fn client_key(forwarded_for: Option<&str,>, peer: Option<&str,>,) -> String
{
    forwarded_for
        .and_then(|header| header.split(',',).next(),)
        .map(str::trim,)
        .filter(|address| !address.is_empty(),)
        .or_else(|| peer.map(str::trim,).filter(|address| !address.is_empty(),),)
        .unwrap_or(UNKNOWN_CLIENT,)
        .to_owned()
}

#[cfg(test)]
mod tests
{
    use std::sync::Arc;

    use super::*;

    fn limiter(max_requests: u32, max_tracked_keys: usize,) -> FixedWindowLimiter
    {
        FixedWindowLimiter::new(RateLimitConfig {
            max_requests,
            window_secs: 60,
            max_tracked_keys,
        },)
    }

    #[test]
    fn default_config_matches_documented_window()
    {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window_secs, 60);
        assert_eq!(config.max_tracked_keys, 500);
    }

    #[tokio::test(start_paused = true)]
    async fn eleventh_request_in_a_window_is_limited()
    {
        let limiter = limiter(10, 500,);
        for expected in (0..10).rev() {
            let decision = limiter.check("10.0.0.1",).await;
            assert!(decision.is_allowed());
            assert_eq!(decision.remaining(), expected);
        }

        let decision = limiter.check("10.0.0.1",).await;
        assert!(!decision.is_allowed());
        assert_eq!(decision.limit(), 10);
        assert_eq!(decision.retry_after_secs(), Some(60));

        // other callers are unaffected
        assert!(limiter.check("10.0.0.2",).await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_expiry()
    {
        let limiter = limiter(1, 500,);
        assert!(limiter.check("a",).await.is_allowed());

        tokio::time::advance(Duration::from_secs(45,),).await;
        let limited = limiter.check("a",).await;
        assert_eq!(limited.retry_after_secs(), Some(15));

        tokio::time::advance(Duration::from_secs(15,),).await;
        assert!(limiter.check("a",).await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn tracked_keys_stay_bounded()
    {
        let limiter = limiter(5, 3,);
        for key in ["a", "b", "c"] {
            limiter.check(key,).await;
            tokio::time::advance(Duration::from_secs(1,),).await;
        }
        limiter.check("d",).await;
        assert_eq!(limiter.tracked_keys().await, 3);

        // "a" was the oldest window and got evicted, so it starts over
        let decision = limiter.check("a",).await;
        assert_eq!(decision.remaining(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_never_exceed_the_limit()
    {
        let limiter = Arc::new(limiter(10, 500,),);
        let handles: Vec<_,> = (0..25)
            .map(|_| {
                let limiter = Arc::clone(&limiter,);
                tokio::spawn(async move { limiter.check("shared",).await.is_allowed() },)
            },)
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.expect("task completes",) {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }

    #[test]
    fn client_key_prefers_the_first_forwarded_address()
    {
        assert_eq!(client_key(Some(" 203.0.113.7, 10.0.0.1",), Some("127.0.0.1",),), "203.0.113.7");
        assert_eq!(client_key(Some("",), Some("127.0.0.1",),), "127.0.0.1");
        assert_eq!(client_key(None, None,), UNKNOWN_CLIENT);
    }
}
