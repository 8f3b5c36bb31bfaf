//! Coursely Infrastructure Library
//!
//! Shared infrastructure for the API binary:
//! - Middleware (request ID, security headers)
//! - Tracing initialization
//! - Error response body
//! - Fixed-window rate limiting with in-memory and PostgreSQL counter stores

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    SecurityHeaders,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat};

pub use error::ErrorResponse;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{
    spawn_sweeper, MemoryRateLimitStore, RateDecision, RateLimitError, RateLimitStore,
    RateLimiter, WindowCount, SWEEP_INTERVAL,
};

#[cfg(feature = "rate-limit-postgres")]
pub use rate_limit::PostgresRateLimitStore;
