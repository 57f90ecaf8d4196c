pub mod jwt_auth;
pub mod rate_limit;
pub mod request_metrics;

pub use jwt_auth::{AuthenticatedUser, JwtAuth, RequireAdmin};
pub use rate_limit::{RateDecision, RateLimit, RateLimitConfig, RateLimiter, RateLimiters};
pub use request_metrics::RequestMetrics;
