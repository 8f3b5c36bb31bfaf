//! Edge middleware: rate limiting, the route gate and audit logging. Request ID and
//! security headers live in coursely-infra and are re-exported here.

pub mod audit;
pub mod rate_limit;
pub mod route_gate;

pub use coursely_infra::middleware::request_id::request_id_middleware;
pub use coursely_infra::middleware::security_headers::{
    security_headers_middleware, SecurityHeaders,
};
pub use rate_limit::{rate_limit_middleware, RateLimitState};
pub use route_gate::{route_gate_middleware, GateState};
