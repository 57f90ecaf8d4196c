use std::collections::VecDeque;
use std::future::{ready, Future, Ready};
use std::net::IpAddr;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use dashmap::DashMap;

use crate::config::RateLimitSettings;
use crate::error::AppError;
use crate::metrics;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_seconds: 60,
        }
    }
}

#[derive(Debug)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// Sliding-window request log keyed by client IP. State is held in
/// process memory, so a horizontally scaled deployment limits per
/// instance rather than globally.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<IpAddr, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Records the request if admitted. Expired hits for the touched
    /// IP are pruned on the way in, so memory stays bounded by recent
    /// traffic.
    pub fn check(&self, ip: IpAddr, now: Instant) -> RateDecision {
        let window = Duration::from_secs(self.config.window_seconds);
        let mut hits = self.windows.entry(ip).or_default();

        while hits
            .front()
            .map_or(false, |hit| now.saturating_duration_since(*hit) >= window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.config.max_requests as usize {
            if let Some(oldest) = hits.front().copied() {
                // The oldest hit still in the window decides when the
                // next request will be admitted.
                return RateDecision::Limited {
                    retry_after: (oldest + window).saturating_duration_since(now),
                };
            }
        }

        hits.push_back(now);
        RateDecision::Allowed
    }
}

/// Rounds a wait up to whole seconds for the Retry-After hint, never
/// reporting zero.
pub(crate) fn retry_after_seconds(retry_after: Duration) -> u64 {
    let mut seconds = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        seconds += 1;
    }
    seconds.max(1)
}

/// One limiter per throttled endpoint. Built once in `main` and cloned
/// into every worker so all workers share the same window state.
#[derive(Clone)]
pub struct RateLimiters {
    pub register: Arc<RateLimiter>,
    pub login: Arc<RateLimiter>,
    pub bulk_import: Arc<RateLimiter>,
}

impl RateLimiters {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            register: Arc::new(RateLimiter::new(settings.register.clone())),
            login: Arc::new(RateLimiter::new(settings.login.clone())),
            bulk_import: Arc::new(RateLimiter::new(settings.bulk_import.clone())),
        }
    }
}

/// Middleware guarding a single endpoint with a shared [`RateLimiter`].
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
    endpoint: &'static str,
}

impl RateLimit {
    pub fn new(endpoint: &'static str, limiter: Arc<RateLimiter>) -> Self {
        Self { limiter, endpoint }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RateLimitMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            endpoint: self.endpoint,
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
    endpoint: &'static str,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = extract_client_ip(&req);

        match self.limiter.check(ip, Instant::now()) {
            RateDecision::Allowed => Box::pin(self.service.call(req)),
            RateDecision::Limited { retry_after } => {
                let seconds = retry_after_seconds(retry_after);
                metrics::RATE_LIMIT_REJECTIONS
                    .with_label_values(&[self.endpoint])
                    .inc();
                tracing::warn!(
                    endpoint = self.endpoint,
                    client_ip = %ip,
                    retry_after_seconds = seconds,
                    "rate limit exceeded"
                );
                Box::pin(ready(Err(AppError::RateLimited {
                    retry_after_seconds: seconds,
                }
                .into())))
            }
        }
    }
}

/// Client IP for rate limiting. Prefers the first entry of
/// X-Forwarded-For (original client behind a proxy), then the peer
/// address.
fn extract_client_ip(req: &ServiceRequest) -> IpAddr {
    if let Some(forwarded) = req.headers().get("X-Forwarded-For") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| IpAddr::from([127, 0, 0, 1]))
}
