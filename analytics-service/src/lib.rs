use std::time::Duration;

use analytics_store::EventStore;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    LatencyUnit,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod error;
pub mod routes;

use config::{AppState, EnvVars};

pub fn app<S: EventStore>(app_state: AppState<S>, env_vars: &EnvVars) -> Router {
    Router::new()
        .route("/status/ping", get(routes::get_status_ping))
        .route(
            "/api/analytic-events",
            post(routes::post_analytic_event::<S>).get(routes::get_analytic_events::<S>),
        )
        .layer(TimeoutLayer::new(Duration::from_millis(
            env_vars.request_timeout_in_ms,
        )))
        .layer(RequestBodyLimitLayer::new(env_vars.request_body_size_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .with_state(app_state)
}
