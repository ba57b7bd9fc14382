//! Per-client sliding-window rate limiter
//!
//! Each identity keeps the admission instants of its last window. Admission
//! for one identity happens under that identity's map entry lock, so two
//! concurrent requests cannot both take the last slot.
//!
//! Memory is bounded: idle identities are dropped by [`RateLimiter::sweep`],
//! which runs lazily every [`SWEEP_EVERY`] checks and can also be driven by a
//! background task, and the number of tracked identities is capped.

use dashmap::DashMap;
use scrubgate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Checks between lazy sweeps
pub const SWEEP_EVERY: u64 = 1024;

/// Rate limiting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Requests admitted per interval
    pub requests_per_interval: u32,

    /// Extra requests tolerated per interval on top of the steady rate
    pub burst: u32,

    /// Window length
    #[serde(with = "duration_secs")]
    pub interval: Duration,

    /// Identities idle this long are forgotten
    #[serde(with = "duration_secs")]
    pub idle_timeout: Duration,

    /// Upper bound on tracked identities
    pub max_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_interval: 30,
            burst: 0,
            interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(600),
            max_clients: 10_000,
        }
    }
}

impl RateLimitConfig {
    /// Requests admitted per window, burst included
    pub fn capacity(&self) -> usize {
        (self.requests_per_interval as usize).saturating_add(self.burst as usize)
    }

    /// Reject settings that would admit nothing or forget live windows
    pub fn validate(&self) -> Result<()> {
        if self.capacity() == 0 {
            return Err(Error::Config(
                "rate limit must admit at least one request per interval".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(Error::Config("rate limit interval must be positive".to_string()));
        }
        if self.idle_timeout < self.interval {
            return Err(Error::Config(format!(
                "rate limit idle timeout ({}s) must not be shorter than the interval ({}s)",
                self.idle_timeout.as_secs(),
                self.interval.as_secs()
            )));
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

struct ClientWindow {
    hits: VecDeque<Instant>,
    last_seen: Instant,
}

impl ClientWindow {
    fn new(now: Instant) -> Self {
        Self {
            hits: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Idle past `idle_timeout` with no admission still inside the window
    fn is_stale(&self, now: Instant, idle_timeout: Duration, interval: Duration) -> bool {
        let newest = self.hits.back().copied().unwrap_or(self.last_seen);
        now.saturating_duration_since(self.last_seen) >= idle_timeout
            && now.saturating_duration_since(newest) >= interval
    }

    fn admit(&mut self, now: Instant, capacity: usize, interval: Duration) -> Result<()> {
        self.last_seen = now;

        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= interval {
                self.hits.pop_front();
            } else {
                break;
            }
        }

        if self.hits.len() < capacity {
            self.hits.push_back(now);
            return Ok(());
        }

        let retry_after = self
            .hits
            .front()
            .map(|&oldest| interval.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(interval);

        Err(Error::RateLimited {
            retry_after_secs: ceil_secs(retry_after).max(1),
        })
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 { secs + 1 } else { secs }
}

/// Sliding-window limiter keyed by client identity
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: DashMap<String, ClientWindow>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or reject one request from `identity`
    pub fn check(&self, identity: &str) -> Result<()> {
        self.check_at(identity, Instant::now())
    }

    /// [`RateLimiter::check`] against an explicit clock reading
    pub fn check_at(&self, identity: &str, now: Instant) -> Result<()> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep_at(now);
        }

        if !self.clients.contains_key(identity) && self.clients.len() >= self.config.max_clients {
            self.sweep_at(now);
            if self.clients.len() >= self.config.max_clients {
                self.evict_least_recent();
            }
        }

        let result = self
            .clients
            .entry(identity.to_string())
            .or_insert_with(|| ClientWindow::new(now))
            .admit(now, self.config.capacity(), self.config.interval);

        if let Err(Error::RateLimited { retry_after_secs }) = &result {
            tracing::warn!(
                client = %identity,
                retry_after_secs,
                "Rate limit exceeded"
            );
        }

        result
    }

    /// Drop identities idle longer than the configured timeout.
    ///
    /// An identity whose newest admission is still inside the window is kept
    /// even when idle, so forgetting it never hands out a fresh quota.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.clients.len();
        let RateLimitConfig {
            idle_timeout,
            interval,
            ..
        } = self.config;
        self.clients
            .retain(|_, window| !window.is_stale(now, idle_timeout, interval));
        let removed = before.saturating_sub(self.clients.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.clients.len(), "Swept idle rate limit entries");
        }
        removed
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .clients
            .iter()
            .min_by_key(|entry| entry.value().last_seen)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.clients.remove(&key);
            tracing::debug!("Rate limiter at capacity, evicted least recent client");
        }
    }

    /// Number of identities currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}
