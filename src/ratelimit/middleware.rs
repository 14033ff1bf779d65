//! Rate limiting middleware composing both strategies.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::{AbuseConfig, RateLimitConfig};
use crate::http::response::rate_limited;
use crate::observability::metrics;
use crate::ratelimit::escalating::{Decision, EscalatingLimiter};
use crate::ratelimit::fixed_window::{FixedWindowLimiter, RateSpecError, RateStatus};

/// State for the combined rate limiting middleware.
///
/// The fixed-window limiter throttles steady traffic per IP and route;
/// the escalating limiter blocks abusive sources outright. Either denial
/// short-circuits the request.
pub struct RateLimiterState {
    enabled: bool,
    default_limiter: FixedWindowLimiter,
    /// Route overrides, longest prefix first.
    route_limiters: Vec<(String, FixedWindowLimiter)>,
    abuse: Option<Arc<EscalatingLimiter>>,
}

impl RateLimiterState {
    pub fn new(
        rate_config: &RateLimitConfig,
        abuse_config: &AbuseConfig,
        abuse: Option<Arc<EscalatingLimiter>>,
    ) -> Result<Self, RateSpecError> {
        let default_limiter = FixedWindowLimiter::new(rate_config.default_spec.parse()?);

        let mut route_limiters = Vec::with_capacity(rate_config.route_specs.len());
        for (prefix, spec) in &rate_config.route_specs {
            route_limiters.push((prefix.clone(), FixedWindowLimiter::new(spec.parse()?)));
        }
        route_limiters.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(Self {
            enabled: rate_config.enabled,
            default_limiter,
            route_limiters,
            abuse: abuse.filter(|_| abuse_config.enabled),
        })
    }

    /// Pick the limiter for a path: the longest matching configured
    /// prefix, falling back to the default.
    fn limiter_for(&self, path: &str) -> (&str, &FixedWindowLimiter) {
        self.route_limiters
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(prefix, limiter)| (prefix.as_str(), limiter))
            .unwrap_or(("", &self.default_limiter))
    }
}

/// Middleware enforcing both limiters per client IP.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled && state.abuse.is_none() {
        return next.run(request).await;
    }

    let ip = extract_client_ip(request.headers(), addr.ip());
    let path = request.uri().path().to_string();

    // Abuse protection first: a blocked source gets no window accounting.
    if let Some(abuse) = &state.abuse {
        if let Decision::Blocked { retry_after_secs } = abuse.allow(&ip.to_string()) {
            tracing::warn!(client = %ip, path = %path, "abusive client blocked");
            metrics::record_rejected("abuse", "blocked");
            return rate_limited("abuse_blocked", "Too many requests", retry_after_secs);
        }
    }

    if !state.enabled {
        return next.run(request).await;
    }

    let (prefix, limiter) = state.limiter_for(&path);
    let key = format!("{}:{}", ip, prefix);
    let status = limiter.check(&key);

    if status.reached {
        tracing::warn!(client = %ip, path = %path, limit = status.limit, "rate limit exceeded");
        metrics::record_rejected("rate_limit", "window_exhausted");
        let mut response =
            rate_limited("rate_limited", "Rate limit exceeded", status.retry_after_secs());
        apply_rate_headers(response.headers_mut(), &status);
        return response;
    }

    let mut response = next.run(request).await;
    apply_rate_headers(response.headers_mut(), &status);
    response
}

/// Attach X-RateLimit-* headers. Reported on every pass through the
/// limiter so clients can see their remaining headroom.
fn apply_rate_headers(headers: &mut HeaderMap, status: &RateStatus) {
    if let Ok(value) = HeaderValue::from_str(&status.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&status.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&status.reset.to_string()) {
        headers.insert("X-RateLimit-Reset", value);
    }
}

/// Resolve the client IP, honoring forwarding headers from upstream
/// proxies before falling back to the socket address.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: IpAddr) -> IpAddr {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip_str) = forwarded_str.split(',').next() {
                if let Ok(ip) = ip_str.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                return ip;
            }
        }
    }

    direct_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn state_with_routes(routes: &[(&str, &str)]) -> RateLimiterState {
        let mut route_specs = HashMap::new();
        for (prefix, spec) in routes {
            route_specs.insert(prefix.to_string(), spec.to_string());
        }
        let rate_config = RateLimitConfig {
            enabled: true,
            default_spec: "100-M".into(),
            route_specs,
        };
        RateLimiterState::new(&rate_config, &AbuseConfig::default(), None).unwrap()
    }

    #[test]
    fn longest_prefix_wins() {
        let state = state_with_routes(&[("/api", "50-M"), ("/api/v1/login", "5-M")]);
        let (prefix, limiter) = state.limiter_for("/api/v1/login");
        assert_eq!(prefix, "/api/v1/login");
        assert_eq!(limiter.spec().limit, 5);

        let (prefix, limiter) = state.limiter_for("/api/v1/topics");
        assert_eq!(prefix, "/api");
        assert_eq!(limiter.spec().limit, 50);
    }

    #[test]
    fn unmatched_path_uses_default() {
        let state = state_with_routes(&[("/api", "50-M")]);
        let (prefix, limiter) = state.limiter_for("/health");
        assert_eq!(prefix, "");
        assert_eq!(limiter.spec().limit, 100);
    }

    #[test]
    fn bad_route_spec_is_a_construction_error() {
        let mut route_specs = HashMap::new();
        route_specs.insert("/api".to_string(), "banana".to_string());
        let rate_config = RateLimitConfig {
            enabled: true,
            default_spec: "100-M".into(),
            route_specs,
        };
        assert!(RateLimiterState::new(&rate_config, &AbuseConfig::default(), None).is_err());
    }

    #[test]
    fn forwarded_header_overrides_socket_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let direct: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(
            extract_client_ip(&headers, direct),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn garbage_forwarded_header_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "not-an-ip".parse().unwrap());
        let direct: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(extract_client_ip(&headers, direct), direct);
    }
}
