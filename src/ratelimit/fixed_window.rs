//! Fixed-window rate limiting with compact rate specs.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Entries beyond this force an expiry sweep before insertion.
const MAX_ENTRIES: usize = 100_000;

/// Error parsing a compact rate spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateSpecError {
    #[error("rate spec must look like '<N>-<S|M|H|D>', got '{0}'")]
    Malformed(String),

    #[error("rate spec limit must be greater than zero")]
    ZeroLimit,
}

/// A compact rate specification: `<N>-<unit>` where the unit is seconds,
/// minutes, hours, or days. `"5-S"` is five requests per second,
/// `"2000-D"` two thousand per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSpec {
    pub limit: u32,
    pub period_secs: u64,
}

impl FromStr for RateSpec {
    type Err = RateSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, unit) = s
            .split_once('-')
            .ok_or_else(|| RateSpecError::Malformed(s.to_string()))?;

        let limit: u32 = count
            .parse()
            .map_err(|_| RateSpecError::Malformed(s.to_string()))?;
        if limit == 0 {
            return Err(RateSpecError::ZeroLimit);
        }

        let period_secs = match unit.to_ascii_uppercase().as_str() {
            "S" => 1,
            "M" => 60,
            "H" => 3_600,
            "D" => 86_400,
            _ => return Err(RateSpecError::Malformed(s.to_string())),
        };

        Ok(Self { limit, period_secs })
    }
}

impl std::fmt::Display for RateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match self.period_secs {
            1 => "S",
            60 => "M",
            3_600 => "H",
            _ => "D",
        };
        write!(f, "{}-{}", self.limit, unit)
    }
}

/// Outcome of one pass through the limiter. Reported on every request,
/// allowed or not, so clients can see their remaining headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateStatus {
    /// Window capacity.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Unix second at which the current window resets.
    pub reset: u64,
    /// True when this request exceeded the capacity.
    pub reached: bool,
}

impl RateStatus {
    /// Seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self) -> u64 {
        self.reset.saturating_sub(now_secs()).max(1)
    }
}

struct WindowEntry {
    count: u32,
    window_start: u64,
}

/// Fixed-window counter keyed by an arbitrary string (IP, IP+route,
/// user+route). Advisory throttling: always reports state.
pub struct FixedWindowLimiter {
    spec: RateSpec,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl FixedWindowLimiter {
    pub fn new(spec: RateSpec) -> Self {
        Self {
            spec,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn spec(&self) -> RateSpec {
        self.spec
    }

    /// Count a request against `key` and report window state.
    pub fn check(&self, key: &str) -> RateStatus {
        self.check_at(key, now_secs())
    }

    fn check_at(&self, key: &str, now: u64) -> RateStatus {
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");

        if entries.len() >= MAX_ENTRIES && !entries.contains_key(key) {
            let period = self.spec.period_secs;
            entries.retain(|_, e| now - e.window_start < period);
        }

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now - entry.window_start >= self.spec.period_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        let reached = entry.count > self.spec.limit;

        RateStatus {
            limit: self.spec.limit,
            remaining: self.spec.limit.saturating_sub(entry.count),
            reset: entry.window_start + self.spec.period_secs,
            reached,
        }
    }

    /// Number of tracked keys.
    pub fn key_count(&self) -> usize {
        self.entries.lock().expect("rate limiter mutex poisoned").len()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_units() {
        assert_eq!(
            "5-S".parse::<RateSpec>().unwrap(),
            RateSpec { limit: 5, period_secs: 1 }
        );
        assert_eq!(
            "10-M".parse::<RateSpec>().unwrap(),
            RateSpec { limit: 10, period_secs: 60 }
        );
        assert_eq!(
            "1000-H".parse::<RateSpec>().unwrap(),
            RateSpec { limit: 1000, period_secs: 3_600 }
        );
        assert_eq!(
            "2000-D".parse::<RateSpec>().unwrap(),
            RateSpec { limit: 2000, period_secs: 86_400 }
        );
        // Unit is case-insensitive.
        assert_eq!(
            "5-s".parse::<RateSpec>().unwrap(),
            RateSpec { limit: 5, period_secs: 1 }
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!("".parse::<RateSpec>().is_err());
        assert!("5".parse::<RateSpec>().is_err());
        assert!("5-X".parse::<RateSpec>().is_err());
        assert!("-M".parse::<RateSpec>().is_err());
        assert!("five-M".parse::<RateSpec>().is_err());
        assert_eq!("0-M".parse::<RateSpec>(), Err(RateSpecError::ZeroLimit));
    }

    #[test]
    fn spec_display_round_trips() {
        for s in ["5-S", "10-M", "1000-H", "2000-D"] {
            assert_eq!(s.parse::<RateSpec>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn counts_down_remaining_within_window() {
        let limiter = FixedWindowLimiter::new("3-M".parse().unwrap());
        let s1 = limiter.check_at("ip", 1_000);
        assert_eq!((s1.remaining, s1.reached), (2, false));
        let s2 = limiter.check_at("ip", 1_010);
        assert_eq!((s2.remaining, s2.reached), (1, false));
        let s3 = limiter.check_at("ip", 1_020);
        assert_eq!((s3.remaining, s3.reached), (0, false));
        let s4 = limiter.check_at("ip", 1_030);
        assert_eq!((s4.remaining, s4.reached), (0, true));
        assert_eq!(s4.reset, 1_060);
        assert_eq!(s4.limit, 3);
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let limiter = FixedWindowLimiter::new("1-M".parse().unwrap());
        assert!(!limiter.check_at("ip", 1_000).reached);
        assert!(limiter.check_at("ip", 1_030).reached);
        assert!(!limiter.check_at("ip", 1_060).reached);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = FixedWindowLimiter::new("1-M".parse().unwrap());
        assert!(!limiter.check_at("a", 1_000).reached);
        assert!(!limiter.check_at("b", 1_000).reached);
        assert!(limiter.check_at("a", 1_001).reached);
    }
}
