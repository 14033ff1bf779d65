//! Sliding-window limiter with a punitive cooldown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::AbuseConfig;
use crate::observability::metrics;

/// Decision for one request against the escalating limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Denied; the block lifts after roughly this many seconds.
    Blocked { retry_after_secs: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

struct AbuseEntry {
    count: u32,
    window_start: Instant,
    blocked_until: Option<Instant>,
    last_seen: Instant,
}

/// Per-key sliding-window counter that imposes a fixed cooldown once the
/// threshold is exceeded. A block always takes precedence over window
/// expiry.
pub struct EscalatingLimiter {
    max_requests: u32,
    window: Duration,
    cooldown: Duration,
    entries: Mutex<HashMap<String, AbuseEntry>>,
}

impl EscalatingLimiter {
    pub fn new(max_requests: u32, window: Duration, cooldown: Duration) -> Self {
        Self {
            max_requests,
            window,
            cooldown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AbuseConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs(config.window_secs),
            Duration::from_secs(config.cooldown_secs),
        )
    }

    /// Record a request for `key` and decide whether it may proceed.
    pub fn allow(&self, key: &str) -> Decision {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> Decision {
        let mut entries = self.entries.lock().expect("abuse limiter mutex poisoned");

        let entry = match entries.get_mut(key) {
            Some(entry) => entry,
            None => {
                entries.insert(
                    key.to_string(),
                    AbuseEntry {
                        count: 1,
                        window_start: now,
                        blocked_until: None,
                        last_seen: now,
                    },
                );
                return Decision::Allowed;
            }
        };

        entry.last_seen = now;

        // An active block outlasts window expiry.
        if let Some(blocked_until) = entry.blocked_until {
            if now < blocked_until {
                return Decision::Blocked {
                    retry_after_secs: (blocked_until - now).as_secs().max(1),
                };
            }
            entry.blocked_until = None;
        }

        if now.duration_since(entry.window_start) > self.window {
            entry.count = 1;
            entry.window_start = now;
            return Decision::Allowed;
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            entry.blocked_until = Some(now + self.cooldown);
            return Decision::Blocked {
                retry_after_secs: self.cooldown.as_secs().max(1),
            };
        }

        Decision::Allowed
    }

    /// Evict entries idle longer than `horizon`. Returns how many were
    /// removed. Holds the table lock only for this one deletion batch.
    pub fn sweep(&self, horizon: Duration) -> usize {
        self.sweep_at(horizon, Instant::now())
    }

    fn sweep_at(&self, horizon: Duration, now: Instant) -> usize {
        let mut entries = self.entries.lock().expect("abuse limiter mutex poisoned");
        let before = entries.len();
        entries.retain(|_, e| now.duration_since(e.last_seen) <= horizon);
        before - entries.len()
    }

    /// Number of tracked keys.
    pub fn key_count(&self) -> usize {
        self.entries.lock().expect("abuse limiter mutex poisoned").len()
    }
}

/// Spawn the periodic eviction sweep as an independent background task.
///
/// Runs until the shutdown signal fires. Keeps memory bounded under high
/// key cardinality (many distinct IPs) without blocking foreground
/// `allow` calls beyond the deletion batch itself.
pub fn spawn_sweeper(
    limiter: Arc<EscalatingLimiter>,
    config: &AbuseConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(config.sweep_interval_secs.max(1));
    let horizon = Duration::from_secs(config.idle_horizon_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = limiter.sweep(horizon);
                    if evicted > 0 {
                        metrics::record_sweep(evicted);
                        tracing::debug!(evicted, remaining = limiter.key_count(), "abuse limiter sweep");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("abuse limiter sweeper stopping");
                    break;
                }
            }
        }
    })
}
