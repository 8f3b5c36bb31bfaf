//! Route configuration and setup.
//!
//! Feature route groups live in [domains](domains); health checks in [health](health).

mod domains;
mod health;

use crate::middleware::{
    rate_limit_middleware, request_id_middleware, route_gate_middleware,
    security_headers_middleware, GateState, RateLimitState, SecurityHeaders,
};
use crate::state::AppState;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use coursely_core::{Config, RateLimitStoreKind};
use coursely_infra::{
    spawn_sweeper, MemoryRateLimitStore, PostgresRateLimitStore, RateLimitStore, RateLimiter,
    SWEEP_INTERVAL,
};
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Assemble the router and its middleware stack.
///
/// Outermost first: request id, security headers, trace, CORS, rate limit, route gate,
/// body limit, concurrency limit.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let rate_limit_state = RateLimitState {
        limiter: setup_rate_limiter(config, &state),
        trusted_proxy_count: config.trusted_proxy_count(),
    };
    let gate_state = GateState {
        authenticator: state.authenticator.clone(),
        identity: state.identity.clone(),
        trusted_proxy_count: config.trusted_proxy_count(),
    };
    let security_headers = SecurityHeaders::for_environment(config.is_production());

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        "HTTP concurrency limit layer enabled"
    );

    let app = application_routes(state.clone())
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit()))
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes()))
        .layer(axum::middleware::from_fn_with_state(
            gate_state,
            route_gate_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit_state,
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            security_headers,
            security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware));

    Ok(app)
}

/// Every route without the middleware stack. Integration tests wrap it themselves.
pub fn application_routes(state: Arc<AppState>) -> Router<()> {
    Router::new()
        .merge(health::health_routes())
        .merge(domains::page_routes())
        .merge(domains::session_routes())
        .merge(domains::course_routes())
        .merge(domains::payment_routes())
        .merge(domains::subscription_routes())
        .merge(domains::webhook_routes())
        .merge(domains::certificate_routes())
        .merge(domains::analytics_routes())
        .merge(domains::live_class_routes())
        .merge(domains::white_label_routes())
        .merge(domains::tenant_routes())
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .with_state(state)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;

        // Credentialed CORS cannot use wildcard headers.
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static("x-request-id"),
            ])
            .allow_credentials(true)
    };
    Ok(cors)
}

fn setup_rate_limiter(config: &Config, state: &AppState) -> RateLimiter {
    let settings = config.rate_limit();
    let window = Duration::from_secs(settings.window_secs);

    let store: Arc<dyn RateLimitStore> = match settings.store {
        RateLimitStoreKind::Memory => Arc::new(MemoryRateLimitStore::new(window)),
        RateLimitStoreKind::Postgres => {
            Arc::new(PostgresRateLimitStore::new(state.pool.clone(), window))
        }
    };
    spawn_sweeper(store.clone(), SWEEP_INTERVAL);

    tracing::info!(
        requests = settings.requests,
        window_secs = settings.window_secs,
        store = ?settings.store,
        "HTTP rate limiting enabled with expired-window sweeping every 5 minutes"
    );

    RateLimiter::new(store, settings.requests)
}
