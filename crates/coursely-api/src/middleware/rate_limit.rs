use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use coursely_core::constants::API_PREFIX;
use coursely_infra::{ErrorResponse, RateDecision, RateLimiter};

use crate::middleware::audit;
use crate::utils::ip_extraction::client_ip;

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub trusted_proxy_count: usize,
}

fn is_api_path(path: &str) -> bool {
    path == API_PREFIX
        || path
            .strip_prefix(API_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn set_limit_headers(response: &mut Response, decision: &RateDecision) {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(decision.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
}

/// Fixed-window limit per client IP on `/api/*`. Other paths pass through untouched.
///
/// Every limited response carries `X-RateLimit-Limit` and `X-RateLimit-Remaining`; a 429
/// also carries `Retry-After` in seconds.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_api_path(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = client_ip(&request, state.trusted_proxy_count);
    let decision = state.limiter.check(&format!("ip:{}", ip)).await;

    if decision.allowed {
        let mut response = next.run(request).await;
        set_limit_headers(&mut response, &decision);
        return response;
    }

    audit::log_rate_limit_exceeded(&ip, request.uri().path(), decision.limit);

    let mut body = ErrorResponse::new("Too many requests. Please slow down.", "RATE_LIMITED");
    body.recoverable = true;
    body.suggested_action = Some(format!("Retry after {} seconds", decision.retry_after));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    set_limit_headers(&mut response, &decision);
    response
        .headers_mut()
        .insert("Retry-After", HeaderValue::from(decision.retry_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use axum_test::TestServer;
    use coursely_infra::MemoryRateLimitStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn app(limit: u32) -> Router {
        let state = RateLimitState {
            limiter: RateLimiter::new(
                Arc::new(MemoryRateLimitStore::new(Duration::from_secs(900))),
                limit,
            ),
            trusted_proxy_count: 1,
        };
        Router::new()
            .route("/api/courses", get(|| async { "ok" }))
            .route("/health", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
    }

    #[test]
    fn test_api_path_matching() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/courses"));
        assert!(!is_api_path("/apiary"));
        assert!(!is_api_path("/health"));
    }

    #[tokio::test]
    async fn test_limit_per_ip() {
        let server = TestServer::new(app(3)).unwrap();

        for expected_remaining in ["2", "1", "0"] {
            let response = server
                .get("/api/courses")
                .add_header("X-Forwarded-For", "203.0.113.9")
                .await;
            response.assert_status_ok();
            assert_eq!(response.header("X-RateLimit-Remaining"), expected_remaining);
        }

        let response = server
            .get("/api/courses")
            .add_header("X-Forwarded-For", "203.0.113.9")
            .await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.header("X-RateLimit-Limit"), "3");
        let retry_after: u64 = response.header("Retry-After").to_str().unwrap().parse().unwrap();
        assert!(retry_after >= 1);

        server
            .get("/api/courses")
            .add_header("X-Forwarded-For", "198.51.100.7")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_rotating_forged_hops_share_the_real_client_window() {
        let server = TestServer::new(app(100)).unwrap();

        let mut limited = 0;
        for i in 0..150u32 {
            let chain = format!("10.9.{}.{}, 198.51.100.7", i / 256, i % 256);
            let response = server
                .get("/api/courses")
                .add_header("X-Forwarded-For", chain)
                .await;
            if response.status_code() == StatusCode::TOO_MANY_REQUESTS {
                limited += 1;
            }
        }
        assert_eq!(limited, 50);
    }

    #[tokio::test]
    async fn test_non_api_paths_are_not_limited() {
        let server = TestServer::new(app(1)).unwrap();
        for _ in 0..3 {
            let response = server.get("/health").await;
            response.assert_status_ok();
            assert!(response.maybe_header("X-RateLimit-Limit").is_none());
        }
    }
}
